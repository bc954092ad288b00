use serde::Serialize;

/// One merged PR's changes, as the fixture consumer sees a branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRecord {
    /// "{branch}:{number}"
    pub id: String,
    /// Head branch name
    pub name: String,
    /// PR number
    pub number: u64,
    pub files: Vec<FileRecord>,
    /// PR body; null unless requested and non-empty
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// "{branch}:{path}"
    pub id: String,
    pub path: String,
    pub hunks: Vec<HunkRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HunkRecord {
    /// "{branch}:{path}:{new_start}"
    pub id: String,
    /// Hunk text including its `@@` header
    pub diff: String,
    /// Summary shown for the hunk
    pub name: String,
    /// PR update timestamp
    pub modified_at: String,
    pub file_path: String,
}

pub fn branch_id(branch: &str, number: u64) -> String {
    format!("{}:{}", branch, number)
}

pub fn file_id(branch: &str, path: &str) -> String {
    format!("{}:{}", branch, path)
}

pub fn hunk_id(branch: &str, path: &str, start: usize) -> String {
    format!("{}:{}:{}", branch, path, start)
}
