use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::RwLock;

use super::model::{NewVideo, Video, VideoUpdate};

const QUERY_TIMEOUT: Duration = Duration::from_millis(10000);
const VIDEO_COLUMNS: &str =
    "id, url, title, thumbnail_url, transcript, summary, processed, created_at";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("SQLx operation failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("query timeout after {0:?}")]
    Timeout(Duration),
}

/// Persistence for video records. Every call is a single-record operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, video: NewVideo) -> Result<Video, StoreError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<Video>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Video>, StoreError>;

    /// Deleting an absent id is not an error.
    async fn delete(&self, id: i32) -> Result<(), StoreError>;

    async fn update(&self, id: i32, update: VideoUpdate) -> Result<Option<Video>, StoreError>;
}

async fn timeout_query<T, F>(fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(res) => res.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(QUERY_TIMEOUT)),
    }
}

#[derive(Clone, Debug)]
pub struct PgVideoStore {
    db: PgPool,
}

impl PgVideoStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    #[tracing::instrument(name = "insert_video", skip(self, video), fields(url = %video.url))]
    async fn create(&self, video: NewVideo) -> Result<Video, StoreError> {
        let sql = format!(
            r#"INSERT INTO videos (url, title, thumbnail_url, transcript, summary, processed)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {}"#,
            VIDEO_COLUMNS
        );

        timeout_query(
            sqlx::query_as::<_, Video>(&sql)
                .bind(video.url)
                .bind(video.title)
                .bind(video.thumbnail_url)
                .bind(video.transcript)
                .bind(video.summary)
                .bind(video.processed)
                .fetch_one(&self.db),
        )
        .await
    }

    async fn list(&self) -> Result<Vec<Video>, StoreError> {
        let sql = format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, id DESC",
            VIDEO_COLUMNS
        );
        timeout_query(sqlx::query_as::<_, Video>(&sql).fetch_all(&self.db)).await
    }

    async fn get(&self, id: i32) -> Result<Option<Video>, StoreError> {
        let sql = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        timeout_query(
            sqlx::query_as::<_, Video>(&sql)
                .bind(id)
                .fetch_optional(&self.db),
        )
        .await
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let result = timeout_query(
            sqlx::query("DELETE FROM videos WHERE id = $1")
                .bind(id)
                .execute(&self.db),
        )
        .await?;

        tracing::debug!("Deleted {} row(s) for video {}", result.rows_affected(), id);
        Ok(())
    }

    async fn update(&self, id: i32, update: VideoUpdate) -> Result<Option<Video>, StoreError> {
        let sql = format!(
            r#"UPDATE videos SET
                 title = COALESCE($2, title),
                 thumbnail_url = COALESCE($3, thumbnail_url),
                 transcript = COALESCE($4, transcript),
                 summary = COALESCE($5, summary),
                 processed = COALESCE($6, processed)
               WHERE id = $1
               RETURNING {}"#,
            VIDEO_COLUMNS
        );

        timeout_query(
            sqlx::query_as::<_, Video>(&sql)
                .bind(id)
                .bind(update.title)
                .bind(update.thumbnail_url)
                .bind(update.transcript)
                .bind(update.summary)
                .bind(update.processed)
                .fetch_optional(&self.db),
        )
        .await
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i32,
    videos: Vec<Video>,
}

/// Process-local store, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryVideoStore {
    state: RwLock<MemoryState>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create(&self, video: NewVideo) -> Result<Video, StoreError> {
        let mut state = self.state.write().await;
        state.last_id += 1;

        let created = Video {
            id: state.last_id,
            url: video.url,
            title: video.title,
            thumbnail_url: video.thumbnail_url,
            transcript: video.transcript,
            summary: video.summary,
            processed: video.processed,
            created_at: Utc::now(),
        };
        state.videos.push(created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Video>, StoreError> {
        let state = self.state.read().await;
        let mut videos = state.videos.clone();
        videos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(videos)
    }

    async fn get(&self, id: i32) -> Result<Option<Video>, StoreError> {
        let state = self.state.read().await;
        Ok(state.videos.iter().find(|v| v.id == id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.videos.retain(|v| v.id != id);
        Ok(())
    }

    async fn update(&self, id: i32, update: VideoUpdate) -> Result<Option<Video>, StoreError> {
        let mut state = self.state.write().await;
        let Some(video) = state.videos.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        update.apply(video);
        Ok(Some(video.clone()))
    }
}
