use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::errors::AppError;

use super::metadata::{resolve_title, TitleLookup};
use super::model::{CreateVideoRequest, NewVideo, Video};
use super::store::VideoStore;
use super::summarizer::Summarize;
use super::transcript::{join_segments, TranscriptError, TranscriptSource};
use super::video_id::{extract_video_id, thumbnail_url};

/// Runs a submitted URL through extraction, title lookup, transcript fetch and
/// summarization, then stores the result. Nothing is written unless every
/// required step succeeded.
pub struct VideoIngestor {
    titles: Arc<dyn TitleLookup>,
    transcripts: Arc<dyn TranscriptSource>,
    summarizer: Arc<dyn Summarize>,
    store: Arc<dyn VideoStore>,
}

impl VideoIngestor {
    pub fn new(
        titles: Arc<dyn TitleLookup>,
        transcripts: Arc<dyn TranscriptSource>,
        summarizer: Arc<dyn Summarize>,
        store: Arc<dyn VideoStore>,
    ) -> Self {
        Self {
            titles,
            transcripts,
            summarizer,
            store,
        }
    }

    #[tracing::instrument(name = "ingest_video", skip(self, request), fields(url = ?request.url))]
    pub async fn ingest(&self, request: CreateVideoRequest) -> Result<Video, AppError> {
        let result = self.run(request).await;

        let outcome = match &result {
            Ok(_) => "created",
            Err(e) => e.kind(),
        };
        metrics::counter!("video_ingestions_total", "outcome" => outcome).increment(1);

        result
    }

    async fn run(&self, request: CreateVideoRequest) -> Result<Video, AppError> {
        let url = validate_url(request.url)?;
        let video_id = extract_video_id(&url)?;

        let title = resolve_title(self.titles.as_ref(), &url, &video_id).await;

        let segments = self.transcripts.fetch_segments(&video_id).await?;
        let transcript = join_segments(&segments);
        if transcript.trim().is_empty() {
            return Err(TranscriptError::NotAvailable(video_id).into());
        }

        let summary = self.summarizer.summarize(&transcript).await?;

        let video = self
            .store
            .create(NewVideo {
                thumbnail_url: Some(thumbnail_url(&video_id)),
                url,
                title,
                transcript: Some(transcript),
                summary: Some(summary),
                processed: true,
            })
            .await?;

        info!(id = video.id, video_id = %video_id, "Video processed");
        Ok(video)
    }
}

fn validate_url(url: Option<String>) -> Result<String, AppError> {
    let url = url.ok_or_else(|| AppError::validation("url", "Required"))?;
    if url.trim().is_empty() {
        return Err(AppError::validation("url", "URL is required"));
    }
    let url = url.trim();
    if Url::parse(url).is_err() {
        return Err(AppError::validation("url", "Invalid url"));
    }
    Ok(url.to_string())
}
