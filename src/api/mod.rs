//! HTTP surface: versioned API endpoints plus system routes.

pub mod common;
pub mod v1;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::system::create_system_router;
use crate::InnerState;
use common::tracing::{make_request_span, on_failure, on_request, on_response};

/// Creates the main router with tracing, request ids and CORS applied.
#[::tracing::instrument(name = "create_api_router", skip(state))]
pub fn create_api_router(state: InnerState) -> Router {
    ::tracing::info!("Creating API router");

    Router::new()
        .merge(create_system_router())
        .merge(v1::create_v1_router(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_request(on_request)
                .on_response(on_response)
                .on_failure(on_failure),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}
