//! Video ingestion: URL parsing, title lookup, transcript retrieval,
//! summarization and the persisted record.

pub mod ingest;
pub mod metadata;
pub mod model;
pub mod store;
pub mod summarizer;
pub mod transcript;
pub mod video_id;

pub use ingest::VideoIngestor;
pub use model::{CreateVideoRequest, Video};
pub use store::{MemoryVideoStore, PgVideoStore, VideoStore};
