pub mod openai;

pub use openai::OpenAiSummarizer;

use async_trait::async_trait;
use thiserror::Error;

use crate::pr::types::Hunk;

/// Only this many characters of a hunk are ever sent to the model.
pub const MAX_HUNK_CHARS: usize = 1000;

const PROMPT_TEMPLATE: &str = "Summarize the following code change in one short sentence, \
suitable as a commit title. Reply with the sentence only.\n\n{hunk}";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("OpenAI API key not found. Set OPENAI_API_KEY or [openai] api_key in .pr-fixtures.toml")]
    MissingApiKey,

    #[error("Completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Completion API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Completion API returned no content")]
    EmptyResponse,
}

/// Produces the human-readable name stored with each hunk.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, hunk: &Hunk) -> Result<String, SummaryError>;
}

/// Names each hunk with its own diff text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffTextSummarizer;

#[async_trait]
impl Summarizer for DiffTextSummarizer {
    async fn summarize(&self, hunk: &Hunk) -> Result<String, SummaryError> {
        Ok(hunk.to_string())
    }
}

/// First `max` characters of `text` (never splits a UTF-8 sequence).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The prompt sent for `hunk_text`, which is cut to [`MAX_HUNK_CHARS`].
pub fn build_prompt(hunk_text: &str) -> String {
    PROMPT_TEMPLATE.replace("{hunk}", truncate_chars(hunk_text, MAX_HUNK_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hunk() -> Hunk {
        Hunk {
            old_start: 1,
            old_count: 1,
            new_start: 1,
            new_count: 1,
            section: String::new(),
            lines: vec!["-a".to_string(), "+b".to_string()],
        }
    }

    #[test]
    fn test_truncate_chars_short_text_untouched() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        let text = "é".repeat(5);
        assert_eq!(truncate_chars(&text, 2), "éé");
    }

    #[test]
    fn test_prompt_contains_at_most_first_1000_chars() {
        let hunk_text = format!("{}{}", "x".repeat(MAX_HUNK_CHARS), "TAIL");
        let prompt = build_prompt(&hunk_text);
        assert!(prompt.contains(&"x".repeat(MAX_HUNK_CHARS)));
        assert!(!prompt.contains("TAIL"));
        let template_len = PROMPT_TEMPLATE.chars().count() - "{hunk}".chars().count();
        assert_eq!(prompt.chars().count(), template_len + MAX_HUNK_CHARS);
    }

    #[test]
    fn test_prompt_keeps_short_hunk_whole() {
        let prompt = build_prompt("@@ -1 +1 @@\n-a\n+b\n");
        assert!(prompt.ends_with("@@ -1 +1 @@\n-a\n+b\n"));
    }

    #[tokio::test]
    async fn test_diff_text_summarizer_uses_hunk_text() {
        let hunk = sample_hunk();
        let name = DiffTextSummarizer.summarize(&hunk).await.unwrap();
        assert_eq!(name, "@@ -1,1 +1,1 @@\n-a\n+b\n");
    }
}
