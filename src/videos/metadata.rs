use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::video_id::fallback_title;

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata service answered with status {0}")]
    Status(StatusCode),

    #[error("metadata response has no title")]
    MissingTitle,

    #[error("invalid metadata endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Best-effort lookup of a display title for a video URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TitleLookup: Send + Sync {
    async fn lookup_title(&self, url: &str) -> Result<String, MetadataError>;
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    error: Option<String>,
}

/// oEmbed client (noembed.com compatible).
#[derive(Clone, Debug)]
pub struct OEmbedClient {
    http_client: Client,
    base_url: String,
}

impl OEmbedClient {
    pub fn new(http_client: Client, base_url: String) -> Self {
        Self {
            http_client,
            base_url,
        }
    }
}

#[async_trait]
impl TitleLookup for OEmbedClient {
    #[tracing::instrument(name = "oembed_lookup", skip(self))]
    async fn lookup_title(&self, url: &str) -> Result<String, MetadataError> {
        let endpoint = Url::parse_with_params(&self.base_url, &[("url", url)])?;

        let response = self.http_client.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status()));
        }

        let body: OEmbedResponse = response.json().await?;
        if let Some(error) = &body.error {
            debug!("oEmbed provider reported: {}", error);
        }

        body.title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(MetadataError::MissingTitle)
    }
}

/// Never fails: any lookup error degrades to `"Video {id}"`.
pub async fn resolve_title(lookup: &dyn TitleLookup, url: &str, video_id: &str) -> String {
    match lookup.lookup_title(url).await {
        Ok(title) => title,
        Err(e) => {
            warn!(video_id, error = %e, "Failed to fetch title, using fallback");
            metrics::counter!("video_title_fallbacks_total").increment(1);
            fallback_title(video_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uses_looked_up_title() {
        let mut lookup = MockTitleLookup::new();
        lookup
            .expect_lookup_title()
            .returning(|_| Ok("Never Gonna Give You Up".to_string()));

        let title = resolve_title(&lookup, "https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ").await;
        assert_eq!(title, "Never Gonna Give You Up");
    }

    #[tokio::test]
    async fn falls_back_when_title_missing() {
        let mut lookup = MockTitleLookup::new();
        lookup
            .expect_lookup_title()
            .returning(|_| Err(MetadataError::MissingTitle));

        let title = resolve_title(&lookup, "https://youtu.be/abc123", "abc123").await;
        assert_eq!(title, "Video abc123");
    }

    #[tokio::test]
    async fn falls_back_on_transport_errors() {
        let mut lookup = MockTitleLookup::new();
        lookup
            .expect_lookup_title()
            .returning(|_| Err(MetadataError::Status(StatusCode::SERVICE_UNAVAILABLE)));

        let title = resolve_title(&lookup, "https://youtu.be/abc123", "abc123").await;
        assert_eq!(title, "Video abc123");
    }

    #[test]
    fn parses_noembed_payloads() {
        let ok: OEmbedResponse =
            serde_json::from_str(r#"{"title":"A talk","author_name":"x","width":480}"#).unwrap();
        assert_eq!(ok.title.as_deref(), Some("A talk"));

        let miss: OEmbedResponse =
            serde_json::from_str(r#"{"error":"no matching providers found","url":"x"}"#).unwrap();
        assert!(miss.title.is_none());
    }
}
