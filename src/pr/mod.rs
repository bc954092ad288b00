pub mod diff;
pub mod mock;
pub mod types;

pub use types::PullRequest;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

use types::{PrListEntry, PrMetadata};

/// PRs exported when neither the command line nor the config names any.
pub const DEFAULT_PR_NUMBERS: &[u64] = &[2211, 2219, 2230];

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub CLI (gh) is not installed or not on PATH. Install it from https://cli.github.com and run `gh auth login`")]
    CliMissing,

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Failed to parse gh output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),

    #[error("Pull request #{0} not found")]
    NotFound(u64),
}

/// Read access to a Git hosting service's merged pull requests.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Fail fast when the host cannot be reached at all.
    async fn ensure_available(&self) -> Result<(), PrError> {
        Ok(())
    }

    /// Numbers of the `limit` most recently merged PRs, newest first.
    async fn list_merged(&self, limit: usize) -> Result<Vec<u64>, PrError>;

    /// Branch name, update timestamp, title and body of one PR.
    async fn view(&self, number: u64) -> Result<PrMetadata, PrError>;

    /// Raw unified diff of one PR.
    async fn diff(&self, number: u64) -> Result<String, PrError>;
}

/// GitHost backed by the `gh` command-line client.
#[derive(Debug, Clone, Default)]
pub struct GhCli {
    repo: Option<String>,
}

impl GhCli {
    /// `repo` is passed as `--repo`; None lets gh infer it from the working
    /// directory.
    pub fn new(repo: Option<String>) -> Self {
        Self { repo }
    }

    /// Check that `gh` can be executed at all.
    pub async fn ensure_installed() -> Result<(), PrError> {
        let installed = Command::new("gh")
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false);
        if installed {
            Ok(())
        } else {
            Err(PrError::CliMissing)
        }
    }

    fn pr_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut all = vec!["pr"];
        all.extend_from_slice(args);
        if let Some(repo) = &self.repo {
            all.push("--repo");
            all.push(repo);
        }
        all
    }

    /// Run `gh` with the given arguments and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, PrError> {
        let command = format!("gh {}", args.join(" "));
        debug!(%command, "running gh");
        let output = Command::new("gh")
            .args(args)
            .output()
            .await
            .map_err(|source| PrError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PrError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitHost for GhCli {
    async fn ensure_available(&self) -> Result<(), PrError> {
        Self::ensure_installed().await
    }

    async fn list_merged(&self, limit: usize) -> Result<Vec<u64>, PrError> {
        let limit = limit.to_string();
        let args = self.pr_args(&["list", "--state", "merged", "--limit", limit.as_str(), "--json", "number"]);
        let stdout = self.run(&args).await?;
        let entries: Vec<PrListEntry> = serde_json::from_str(&stdout)?;
        Ok(entries.into_iter().map(|e| e.number).collect())
    }

    async fn view(&self, number: u64) -> Result<PrMetadata, PrError> {
        let number = number.to_string();
        let args = self.pr_args(&["view", number.as_str(), "--json", "headRefName,updatedAt,title,body"]);
        let stdout = self.run(&args).await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn diff(&self, number: u64) -> Result<String, PrError> {
        let number = number.to_string();
        let args = self.pr_args(&["diff", number.as_str(), "--color", "never"]);
        self.run(&args).await
    }
}

/// Decide which PRs to export: explicit numbers win, then `--recent`, then
/// the config list, then [`DEFAULT_PR_NUMBERS`].
pub async fn select_pr_numbers(
    host: &dyn GitHost,
    explicit: &[u64],
    recent: Option<usize>,
    configured: &[u64],
) -> Result<Vec<u64>, PrError> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    if let Some(limit) = recent {
        debug!(limit, "listing recently merged PRs");
        return host.list_merged(limit).await;
    }
    if !configured.is_empty() {
        return Ok(configured.to_vec());
    }
    Ok(DEFAULT_PR_NUMBERS.to_vec())
}

/// Fetch a complete PullRequest (metadata + parsed diff).
#[instrument(skip(host))]
pub async fn fetch_pull_request(host: &dyn GitHost, number: u64) -> Result<PullRequest, PrError> {
    let metadata = host.view(number).await?;
    debug!(branch = %metadata.head_ref_name, title = %metadata.title, "received PR metadata");

    let diff_text = host.diff(number).await?;
    debug!(diff_bytes = diff_text.len(), "received PR diff");

    let files = diff::parse_diff(&diff_text)?;
    debug!(parsed_files = files.len(), "parsed diff");

    Ok(PullRequest {
        number,
        branch: metadata.head_ref_name,
        title: metadata.title,
        body: metadata.body,
        updated_at: metadata.updated_at,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::mock::MockGitHost;
    use super::*;

    #[test]
    fn test_pr_args_with_repo() {
        let gh = GhCli::new(Some("org/repo".to_string()));
        assert_eq!(
            gh.pr_args(&["diff", "7"]),
            vec!["pr", "diff", "7", "--repo", "org/repo"]
        );
    }

    #[test]
    fn test_pr_args_without_repo() {
        let gh = GhCli::default();
        assert_eq!(gh.pr_args(&["view", "7"]), vec!["pr", "view", "7"]);
    }

    #[tokio::test]
    async fn test_select_prefers_explicit_numbers() {
        let host = MockGitHost::sample();
        let numbers = select_pr_numbers(&host, &[5, 6], Some(10), &[1]).await.unwrap();
        assert_eq!(numbers, vec![5, 6]);
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_select_recent_lists_merged() {
        let host = MockGitHost::sample();
        let numbers = select_pr_numbers(&host, &[], Some(1), &[1]).await.unwrap();
        assert_eq!(numbers, vec![42]);
        assert_eq!(host.calls(), vec!["list 1"]);
    }

    #[tokio::test]
    async fn test_select_falls_back_to_config_then_default() {
        let host = MockGitHost::sample();
        assert_eq!(
            select_pr_numbers(&host, &[], None, &[9]).await.unwrap(),
            vec![9]
        );
        assert_eq!(
            select_pr_numbers(&host, &[], None, &[]).await.unwrap(),
            DEFAULT_PR_NUMBERS.to_vec()
        );
    }

    #[tokio::test]
    async fn test_fetch_pull_request_combines_metadata_and_diff() {
        let host = MockGitHost::sample();
        let pr = fetch_pull_request(&host, 42).await.unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.branch, "feature/oauth-login");
        assert_eq!(pr.updated_at, "2024-03-14T09:26:53Z");
        assert_eq!(pr.files.len(), 2);
        assert_eq!(host.calls(), vec!["view 42", "diff 42"]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_pr_fails() {
        let host = MockGitHost::sample();
        assert!(matches!(
            fetch_pull_request(&host, 999).await,
            Err(PrError::NotFound(999))
        ));
    }
}
