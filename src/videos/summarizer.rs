use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Transcript characters submitted for summarization, at most.
pub const MAX_TRANSCRIPT_CHARS: usize = 100_000;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const SYSTEM_PROMPT: &str = "You are an expert video summarizer. Summarize the following video \
transcript efficiently. Focus on key points and takeaways. Format with Markdown.";

#[derive(thiserror::Error, Debug)]
pub enum SummarizeError {
    #[error("summary request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("summary service answered with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("summary response contained no text")]
    EmptyResponse,
}

/// Generates Markdown prose from transcript text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizeError>;
}

/// Cuts `text` to at most `max_chars` characters without splitting one.
/// Returns the kept prefix and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// The first content block, only if it is non-empty text.
    fn into_text(self) -> Result<String, SummarizeError> {
        self.content
            .into_iter()
            .next()
            .filter(|block| block.kind == "text")
            .and_then(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(SummarizeError::EmptyResponse)
    }
}

#[derive(Debug)]
pub struct AnthropicSummarizer {
    http_client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
}

impl AnthropicSummarizer {
    pub fn new(
        http_client: Client,
        base_url: String,
        api_key: SecretString,
        model: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }

    fn build_request<'a>(&'a self, transcript: &str) -> MessagesRequest<'a> {
        let (kept, truncated) = truncate_chars(transcript, MAX_TRANSCRIPT_CHARS);
        if truncated {
            warn!(
                max_chars = MAX_TRANSCRIPT_CHARS,
                total_chars = transcript.chars().count(),
                "Transcript truncated before summarization"
            );
        }

        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: format!("Transcript:\n{}", kept),
            }],
        }
    }
}

#[async_trait]
impl Summarize for AnthropicSummarizer {
    #[tracing::instrument(name = "summarize_transcript", skip(self, transcript), fields(model = %self.model))]
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizeError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let request = self.build_request(transcript);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Summary service error: {}", body);
            return Err(SummarizeError::Status { status, body });
        }

        let summary = response.json::<MessagesResponse>().await?.into_text()?;
        info!(summary_chars = summary.chars().count(), "Summary generated");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarizer() -> AnthropicSummarizer {
        AnthropicSummarizer::new(
            Client::new(),
            "https://api.anthropic.com".to_string(),
            SecretString::new("test-key".to_string()),
            "claude-sonnet-4-20250514".to_string(),
            2048,
        )
    }

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(truncate_chars("hello", 10), ("hello", false));
        assert_eq!(truncate_chars("hello", 5), ("hello", false));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let (kept, truncated) = truncate_chars("héllo wörld", 4);
        assert_eq!(kept, "héll");
        assert!(truncated);
    }

    #[test]
    fn request_never_exceeds_character_budget() {
        let transcript = "ab".repeat(MAX_TRANSCRIPT_CHARS);
        let summarizer = summarizer();
        let request = summarizer.build_request(&transcript);
        let content = &request.messages[0].content;
        let submitted = content.trim_start_matches("Transcript:\n");

        assert_eq!(submitted.chars().count(), MAX_TRANSCRIPT_CHARS);
        assert!(transcript.starts_with(submitted));
    }

    #[test]
    fn request_carries_system_instruction_and_ceiling() {
        let summarizer = summarizer();
        let request = summarizer.build_request("some words");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 2048);
        assert!(body["system"].as_str().unwrap().contains("Markdown"));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Transcript:\nsome words");
    }

    #[test]
    fn extracts_first_text_block() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"text","text":"- Point A\n- Point B"},{"type":"text","text":"ignored"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "- Point A\n- Point B");
    }

    #[test]
    fn rejects_empty_or_non_text_responses() {
        let cases = [
            r#"{"content":[]}"#,
            r#"{}"#,
            r#"{"content":[{"type":"tool_use","id":"t","name":"x","input":{}}]}"#,
            r#"{"content":[{"type":"text","text":"   "}]}"#,
        ];
        for raw in cases {
            let response: MessagesResponse = serde_json::from_str(raw).unwrap();
            assert!(
                matches!(response.into_text(), Err(SummarizeError::EmptyResponse)),
                "{raw}"
            );
        }
    }
}
