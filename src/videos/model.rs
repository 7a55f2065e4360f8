use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted video together with its transcript and generated summary.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i32,
    pub url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub processed: bool,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub processed: Option<bool>,
}

impl VideoUpdate {
    pub(crate) fn apply(self, video: &mut Video) {
        if let Some(title) = self.title {
            video.title = title;
        }
        if let Some(thumbnail_url) = self.thumbnail_url {
            video.thumbnail_url = Some(thumbnail_url);
        }
        if let Some(transcript) = self.transcript {
            video.transcript = Some(transcript);
        }
        if let Some(summary) = self.summary {
            video.summary = Some(summary);
        }
        if let Some(processed) = self.processed {
            video.processed = processed;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    #[serde(default)]
    pub url: Option<String>,
}
