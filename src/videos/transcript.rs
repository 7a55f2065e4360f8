//! Caption retrieval from the public YouTube watch page.
//!
//! The watch page embeds the player response, whose `"captions"` block lists
//! the available caption tracks. Each track exposes a `baseUrl`; requested
//! with `fmt=json3` it returns `events[].segs[].utf8` timed text.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36,gzip(gfe)";

const NO_CAPTIONS_MESSAGE: &str =
    "Failed to fetch transcript. This video does not have captions available.";
const UNAVAILABLE_MESSAGE: &str =
    "Failed to fetch transcript. Video might not have captions or is unavailable.";

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    /// Seconds from the start of the video.
    pub offset: f64,
    pub duration: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("YouTube is receiving too many requests, captcha required for video {0}")]
    TooManyRequests(String),

    #[error("video {0} is no longer available")]
    VideoUnavailable(String),

    #[error("transcripts are disabled for video {0}")]
    Disabled(String),

    #[error("no transcript is available for video {0}")]
    NotAvailable(String),

    #[error("no transcript in `{lang}` for video {video_id} (available: {available:?})")]
    LanguageNotAvailable {
        lang: String,
        video_id: String,
        available: Vec<String>,
    },

    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected watch page layout: {0}")]
    Malformed(String),
}

impl TranscriptError {
    pub fn user_message(&self) -> &'static str {
        match self {
            TranscriptError::Disabled(_)
            | TranscriptError::NotAvailable(_)
            | TranscriptError::LanguageNotAvailable { .. } => NO_CAPTIONS_MESSAGE,
            _ => UNAVAILABLE_MESSAGE,
        }
    }
}

/// Source of timed transcript segments for a video identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Segments joined with single spaces, in their original order.
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
}

#[derive(Clone, Debug)]
pub struct YoutubeTranscriptClient {
    http_client: Client,
    lang: Option<String>,
}

impl YoutubeTranscriptClient {
    pub fn new(http_client: Client, lang: Option<String>) -> Self {
        Self { http_client, lang }
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, TranscriptError> {
        let watch_url = Url::parse_with_params(WATCH_URL, &[("v", video_id)])
            .map_err(|e| TranscriptError::Malformed(format!("watch url: {}", e)))?;
        let mut request = self
            .http_client
            .get(watch_url)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(lang) = &self.lang {
            request = request.header(header::ACCEPT_LANGUAGE, lang);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(TranscriptError::TooManyRequests(video_id.to_string()))
            }
            status if !status.is_success() => {
                error!(video_id, %status, "Watch page request failed");
                return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
            }
            _ => {}
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptClient {
    #[tracing::instrument(name = "fetch_transcript", skip(self))]
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let page = self.fetch_watch_page(video_id).await?;
        let tracks = caption_tracks(&page, video_id)?;
        let track = select_track(&tracks, self.lang.as_deref(), video_id)?;

        debug!(video_id, language = %track.language_code, "Fetching caption track");

        let response = self
            .http_client
            .get(json3_url(&track.base_url)?)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            error!(video_id, status = %response.status(), "Caption track request failed");
            return Err(TranscriptError::NotAvailable(video_id.to_string()));
        }

        let body = response.text().await?;
        let timed_text: TimedText = serde_json::from_str(&body)
            .map_err(|e| TranscriptError::Malformed(format!("timed text: {}", e)))?;
        let segments = segments_from_timed_text(timed_text);
        if segments.is_empty() {
            return Err(TranscriptError::NotAvailable(video_id.to_string()));
        }

        info!(video_id, segments = segments.len(), "Transcript fetched");
        Ok(segments)
    }
}

fn caption_tracks(page: &str, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let Some((_, after_captions)) = page.split_once("\"captions\":") else {
        if page.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::TooManyRequests(video_id.to_string()));
        }
        if !page.contains("\"playabilityStatus\":") {
            return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
        }
        return Err(TranscriptError::Disabled(video_id.to_string()));
    };

    let captions_json = after_captions
        .split(",\"videoDetails")
        .next()
        .unwrap_or_default()
        .replace('\n', "");
    let captions: Value = serde_json::from_str(&captions_json)
        .map_err(|e| TranscriptError::Malformed(format!("captions block: {}", e)))?;

    let Some(renderer) = captions.get("playerCaptionsTracklistRenderer") else {
        return Err(TranscriptError::Disabled(video_id.to_string()));
    };
    let Some(tracks) = renderer.get("captionTracks") else {
        return Err(TranscriptError::NotAvailable(video_id.to_string()));
    };

    let tracks: Vec<CaptionTrack> = serde_json::from_value(tracks.clone())
        .map_err(|e| TranscriptError::Malformed(format!("caption tracks: {}", e)))?;
    if tracks.is_empty() {
        return Err(TranscriptError::NotAvailable(video_id.to_string()));
    }
    Ok(tracks)
}

fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    lang: Option<&str>,
    video_id: &str,
) -> Result<&'a CaptionTrack, TranscriptError> {
    let Some(lang) = lang else {
        return tracks
            .first()
            .ok_or_else(|| TranscriptError::NotAvailable(video_id.to_string()));
    };

    tracks
        .iter()
        .find(|t| t.language_code == lang)
        .ok_or_else(|| TranscriptError::LanguageNotAvailable {
            lang: lang.to_string(),
            video_id: video_id.to_string(),
            available: tracks.iter().map(|t| t.language_code.clone()).collect(),
        })
}

/// Body of a `fmt=json3` timed-text response.
#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

fn json3_url(base_url: &str) -> Result<Url, TranscriptError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| TranscriptError::Malformed(format!("caption track url: {}", e)))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");
    Ok(url)
}

/// One segment per event carrying text, in document order. Window and
/// line-break-only events are skipped.
fn segments_from_timed_text(timed_text: TimedText) -> Vec<TranscriptSegment> {
    timed_text
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            if text.trim().is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text,
                offset: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect()
}
