use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::types::PrMetadata;
use super::{GitHost, PrError};

/// Number of the PR served by [`MockGitHost::sample`].
pub const SAMPLE_PR: u64 = 42;

const SAMPLE_DIFF: &str = include_str!("../../tests/fixtures/sample_diff.patch");

/// In-memory GitHost serving canned metadata and diffs. Records every call
/// so callers can assert on the order of fetches.
#[derive(Debug, Default)]
pub struct MockGitHost {
    pulls: BTreeMap<u64, (PrMetadata, String)>,
    calls: Mutex<Vec<String>>,
}

impl MockGitHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pull(mut self, number: u64, metadata: PrMetadata, diff: impl Into<String>) -> Self {
        self.pulls.insert(number, (metadata, diff.into()));
        self
    }

    /// A single merged PR (#42) built from the bundled sample diff. Backs
    /// `--mock`, so the pipeline can run without gh or network access.
    pub fn sample() -> Self {
        Self::new().with_pull(
            SAMPLE_PR,
            PrMetadata {
                head_ref_name: "feature/oauth-login".to_string(),
                updated_at: "2024-03-14T09:26:53Z".to_string(),
                title: "Add OAuth2 login flow".to_string(),
                body: "Adds an OAuth client and a /login route.".to_string(),
            },
            SAMPLE_DIFF,
        )
    }

    /// Calls made so far, formatted as "<op> <arg>".
    #[cfg(test)]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl GitHost for MockGitHost {
    async fn ensure_available(&self) -> Result<(), PrError> {
        self.record("check".to_string());
        Ok(())
    }

    async fn list_merged(&self, limit: usize) -> Result<Vec<u64>, PrError> {
        self.record(format!("list {}", limit));
        Ok(self.pulls.keys().rev().take(limit).copied().collect())
    }

    async fn view(&self, number: u64) -> Result<PrMetadata, PrError> {
        self.record(format!("view {}", number));
        self.pulls
            .get(&number)
            .map(|(metadata, _)| metadata.clone())
            .ok_or(PrError::NotFound(number))
    }

    async fn diff(&self, number: u64) -> Result<String, PrError> {
        self.record(format!("diff {}", number));
        self.pulls
            .get(&number)
            .map(|(_, diff)| diff.clone())
            .ok_or(PrError::NotFound(number))
    }
}
