use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::videos::{CreateVideoRequest, Video};
use crate::InnerState;

#[tracing::instrument(name = "List videos", skip(inner))]
pub async fn list_videos(State(inner): State<InnerState>) -> Result<Json<Vec<Video>>, AppError> {
    let videos = inner.videos.list().await?;
    tracing::debug!("Listing {} videos", videos.len());
    Ok(Json(videos))
}

#[tracing::instrument(name = "Get video", skip(inner, id))]
pub async fn get_video(
    State(inner): State<InnerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Video>, AppError> {
    let Path(id) = id?;

    inner
        .videos
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

#[tracing::instrument(name = "Create video", skip(inner, payload))]
pub async fn create_video(
    State(inner): State<InnerState>,
    payload: Result<Json<CreateVideoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    let Json(request) = payload?;

    let video = inner.ingestor.ingest(request).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

#[tracing::instrument(name = "Delete video", skip(inner, id))]
pub async fn delete_video(
    State(inner): State<InnerState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;

    inner.videos.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
