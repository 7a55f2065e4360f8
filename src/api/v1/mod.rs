//! V1 API endpoints for submitted videos.

pub mod videos;

use axum::routing::get;
use axum::Router;

use crate::InnerState;

/// Creates the V1 API router
#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route(
            "/api/videos",
            get(videos::list_videos).post(videos::create_video),
        )
        .route(
            "/api/videos/{id}",
            get(videos::get_video).delete(videos::delete_video),
        )
        .with_state(state)
}
