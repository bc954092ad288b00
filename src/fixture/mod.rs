pub mod types;

pub use types::{BranchRecord, FileRecord, HunkRecord};

use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::pr::{self, GitHost, PrError, PullRequest};
use crate::summary::{Summarizer, SummaryError};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Pr(#[from] PrError),

    #[error("Failed to summarize hunk: {0}")]
    Summary(#[from] SummaryError),

    #[error("Failed to serialize fixture: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Serialized fixture is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Failed to write fixture file: {0}")]
    FileWrite(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Copy the PR body into the branch description
    pub include_description: bool,
}

/// Fetch, parse and summarize each PR in order and assemble the records.
/// Every call completes before the next one starts.
pub async fn generate(
    host: &dyn GitHost,
    summarizer: &dyn Summarizer,
    numbers: &[u64],
    options: Options,
) -> Result<Vec<BranchRecord>, FixtureError> {
    let mut branches = Vec::with_capacity(numbers.len());
    for &number in numbers {
        info!(pr = number, "fetching pull request");
        let pull_request = pr::fetch_pull_request(host, number).await?;
        debug!(pr = number, title = %pull_request.title, "fetched pull request");
        let branch = build_branch(&pull_request, summarizer, options).await?;
        info!(
            pr = number,
            branch = %branch.name,
            files = branch.files.len(),
            "assembled branch"
        );
        branches.push(branch);
    }
    Ok(branches)
}

/// Map one PullRequest onto the branch → files → hunks record shape.
#[instrument(skip_all, fields(pr = pull_request.number, branch = %pull_request.branch))]
pub async fn build_branch(
    pull_request: &PullRequest,
    summarizer: &dyn Summarizer,
    options: Options,
) -> Result<BranchRecord, FixtureError> {
    let branch = &pull_request.branch;
    let mut files = Vec::with_capacity(pull_request.files.len());

    for file in &pull_request.files {
        debug!(
            path = %file.path,
            is_new = file.is_new,
            is_deleted = file.is_deleted,
            additions = file.additions,
            deletions = file.deletions,
            "mapping file"
        );
        let mut hunks = Vec::with_capacity(file.hunks.len());
        for hunk in &file.hunks {
            let name = summarizer.summarize(hunk).await?;
            debug!(path = %file.path, start = hunk.new_start, "summarized hunk");
            hunks.push(HunkRecord {
                id: types::hunk_id(branch, &file.path, hunk.new_start),
                diff: hunk.to_string(),
                name,
                modified_at: pull_request.updated_at.clone(),
                file_path: file.path.clone(),
            });
        }
        files.push(FileRecord {
            id: types::file_id(branch, &file.path),
            path: file.path.clone(),
            hunks,
        });
    }

    let description = if options.include_description && !pull_request.body.trim().is_empty() {
        Some(pull_request.body.clone())
    } else {
        None
    };

    Ok(BranchRecord {
        id: types::branch_id(branch, pull_request.number),
        name: branch.clone(),
        number: pull_request.number,
        files,
        description,
    })
}

/// Serialize with 4-space indentation, newline-terminated.
pub fn to_json(branches: &[BranchRecord]) -> Result<String, FixtureError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    branches.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
}

/// Write the fixture file, creating parent directories as needed.
#[instrument(skip(branches), fields(branches = branches.len()))]
pub fn write(branches: &[BranchRecord], path: &Path) -> Result<(), FixtureError> {
    let json = to_json(branches)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "wrote fixture file");
    Ok(())
}
