use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{build_prompt, Summarizer, SummaryError};
use crate::config::Config;
use crate::pr::types::Hunk;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Summarizes hunks through an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiSummarizer {
    /// Fails with [`SummaryError::MissingApiKey`] when the config carries no key,
    /// so a summarizing run aborts before fetching anything.
    pub fn from_config(config: &Config) -> Result<Self, SummaryError> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SummaryError::MissingApiKey)?;
        Ok(Self::new(api_key, config.model(), config.base_url()))
    }

    pub fn new(api_key: String, model: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

fn first_content(response: ChatResponse) -> Result<String, SummaryError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(SummaryError::EmptyResponse)
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip_all, fields(model = %self.model, start = hunk.new_start))]
    async fn summarize(&self, hunk: &Hunk) -> Result<String, SummaryError> {
        let prompt = build_prompt(&hunk.to_string());
        debug!(prompt_chars = prompt.chars().count(), "requesting hunk summary");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("User-Agent", "pr-fixtures")
            .json(&self.request_body(&prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Api { status, body });
        }

        let summary = first_content(response.json::<ChatResponse>().await?)?;
        debug!(%summary, "received hunk summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config::default();
        assert!(matches!(
            OpenAiSummarizer::from_config(&config),
            Err(SummaryError::MissingApiKey)
        ));
    }

    #[test]
    fn test_from_config_rejects_blank_key() {
        let config = Config {
            openai: OpenAiConfig {
                api_key: Some("  ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(OpenAiSummarizer::from_config(&config).is_err());
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let summarizer = OpenAiSummarizer::new("k".to_string(), "m", "http://localhost:8080/v1/");
        assert_eq!(summarizer.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let summarizer = OpenAiSummarizer::new("k".to_string(), "gpt-4o-mini", "https://x");
        let body = serde_json::to_value(summarizer.request_body("hello")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hello"}]
            })
        );
    }

    #[test]
    fn test_first_content_is_trimmed() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Add login route\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(response).unwrap(), "Add login route");
    }

    #[test]
    fn test_first_content_empty_is_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_content(response),
            Err(SummaryError::EmptyResponse)
        ));
    }
}
