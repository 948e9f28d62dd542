//! Persistence for scraped comments.
//!
//! One trait, two production backends (Postgres, flat JSON file) and an
//! in-memory store for tests. The handle is built once at startup and shared
//! by the orchestrator and the reader.

mod json_file;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use harvest_common::{CommentRecord, PageRequest, StorageConfig};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use json_file::JsonFileStore;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryCommentStore;
pub use postgres::PgCommentStore;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt comment file: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for harvest_common::HarvestError {
    fn from(err: StoreError) -> Self {
        harvest_common::HarvestError::Storage(err.to_string())
    }
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Append records in one bulk write. Returns how many were written.
    /// Not transactional: a failure may leave earlier records in place.
    async fn insert_many(&self, records: &[CommentRecord]) -> Result<u64>;

    /// Newest first (`fetched_at` desc, later inserts first on ties).
    async fn list_recent(&self, page: PageRequest) -> Result<Vec<CommentRecord>>;

    /// All records of one Apify run, in insertion order.
    async fn list_by_run(&self, run_id: &str) -> Result<Vec<CommentRecord>>;
}

/// Open the configured backend. Postgres runs embedded migrations first.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn CommentStore>> {
    match config {
        StorageConfig::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            let store = PgCommentStore::new(pool);
            store.migrate().await?;
            info!("Connected to Postgres comment store");
            Ok(Arc::new(store))
        }
        StorageConfig::JsonFile { path } => {
            info!(path = %path.display(), "Using JSON file comment store");
            Ok(Arc::new(JsonFileStore::new(path.clone())))
        }
    }
}

/// Order records (given in insertion order) newest first and cut one page.
pub(crate) fn page_newest_first(
    records: impl DoubleEndedIterator<Item = CommentRecord>,
    page: PageRequest,
) -> Vec<CommentRecord> {
    let mut newest: Vec<CommentRecord> = records.rev().collect();
    // Stable sort keeps reverse insertion order among equal timestamps.
    newest.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
    newest
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.page_size as usize)
        .collect()
}
