use serde::Deserialize;
use std::fmt;

/// Fields read from `gh pr view --json headRefName,updatedAt,title,body`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrMetadata {
    /// Head branch name
    pub head_ref_name: String,
    /// ISO-8601 timestamp of the last update
    pub updated_at: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// One entry of `gh pr list --json number`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrListEntry {
    pub number: u64,
}

/// A merged pull request: metadata plus its parsed diff.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// PR number (e.g., 42)
    pub number: u64,
    /// Head branch name
    pub branch: String,
    pub title: String,
    /// PR description, empty when the author left none
    pub body: String,
    pub updated_at: String,
    /// Parsed diff files
    pub files: Vec<DiffFile>,
}

/// A single file within the PR diff.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffFile {
    /// File path (e.g., "src/auth/config.rs")
    pub path: String,
    pub is_new: bool,
    pub is_deleted: bool,
    pub additions: usize,
    pub deletions: usize,
    /// Hunks (contiguous changed regions)
    pub hunks: Vec<Hunk>,
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    /// Text after the closing `@@` of the header (usually the enclosing
    /// function), without the leading space
    pub section: String,
    /// Raw lines of the hunk (prefixed with +, -, space or `\`)
    pub lines: Vec<String>,
}

impl Hunk {
    pub fn header(&self) -> String {
        let mut header = format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        );
        if !self.section.is_empty() {
            header.push(' ');
            header.push_str(&self.section);
        }
        header
    }
}

/// Renders the hunk back to unified diff text: header line, then body lines,
/// each newline-terminated.
impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
