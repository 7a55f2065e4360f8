mod api;
mod config;
mod db;
mod errors;
mod system;
mod videos;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use secrecy::ExposeSecret;
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Settings;
use crate::db::init_db;
use crate::videos::metadata::OEmbedClient;
use crate::videos::summarizer::AnthropicSummarizer;
use crate::videos::transcript::YoutubeTranscriptClient;
use crate::videos::{MemoryVideoStore, PgVideoStore, VideoIngestor, VideoStore};

#[derive(Clone)]
pub struct InnerState {
    pub videos: Arc<dyn VideoStore>,
    pub ingestor: Arc<VideoIngestor>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_digest=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let videos: Arc<dyn VideoStore> = match &settings.database_url {
        Some(database_url) => {
            let db = init_db(
                database_url.expose_secret(),
                settings.database_max_connections,
            )
            .await?;
            Arc::new(PgVideoStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory only");
            Arc::new(MemoryVideoStore::new())
        }
    };

    let http_client = reqwest::Client::builder()
        .timeout(settings.upstream_timeout)
        .build()?;

    let ingestor = VideoIngestor::new(
        Arc::new(OEmbedClient::new(
            http_client.clone(),
            settings.oembed_base_url.clone(),
        )),
        Arc::new(YoutubeTranscriptClient::new(
            http_client.clone(),
            settings.transcript_lang.clone(),
        )),
        Arc::new(AnthropicSummarizer::new(
            http_client,
            settings.anthropic_base_url.clone(),
            settings.anthropic_api_key.clone(),
            settings.summary_model.clone(),
            settings.summary_max_tokens,
        )),
        videos.clone(),
    );

    let app_state = InnerState {
        videos,
        ingestor: Arc::new(ingestor),
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = api::create_api_router(app_state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
