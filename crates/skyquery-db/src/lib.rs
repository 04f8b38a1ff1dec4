//! # skyquery-db
//!
//! SQLite storage layer for skyquery.
//!
//! This crate provides:
//! - Connection pool management
//! - The record table schema and sample seeding
//! - [`SqliteRecordRepository`], the record store
//! - The location backfill maintenance pass
//! - Write-ahead persistence of request payloads
//!
//! ## Example
//!
//! ```rust,ignore
//! use skyquery_db::{Database, PoolConfig, QueryFilter, RecordRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open_or_init("satellite_data.db".as_ref(), PoolConfig::default(), true).await?;
//!     let hits = db.records.query(&QueryFilter::new("NYC", "2023-12-31", "2024-01-02")).await?;
//!     println!("{} records", hits.len());
//!     Ok(())
//! }
//! ```

pub mod backfill;
pub mod payload_store;
pub mod pool;
pub mod records;
pub mod schema;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixtures;

use std::path::Path;

use sqlx::SqlitePool;
use tracing::warn;

// Re-export core types
pub use skyquery_core::*;

pub use backfill::LocationBackfill;
pub use payload_store::{
    compute_fingerprint, generate_request_id, FilesystemBackend, PayloadStore, StorageBackend,
};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use records::SqliteRecordRepository;

/// Open record store.
pub struct Database {
    /// The underlying connection pool.
    pub pool: SqlitePool,
    /// Record repository.
    pub records: SqliteRecordRepository,
}

impl Database {
    /// Wrap an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: SqliteRecordRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open the store at `path` without touching the schema.
    pub async fn open(path: &Path, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(path, config).await?;
        Ok(Self::new(pool))
    }

    /// Open the store at `path`, creating the file and schema when either is
    /// missing. Re-initialization happens at most once per call.
    pub async fn open_or_init(path: &Path, config: PoolConfig, seed_samples: bool) -> Result<Self> {
        let file_missing = !path.exists();
        if file_missing {
            warn!(
                subsystem = "db",
                component = "schema",
                path = %path.display(),
                "Database not found, initializing"
            );
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let db = Self::open(path, config.create_if_missing(true)).await?;
        if file_missing || !schema::table_exists(&db.pool).await? {
            if !file_missing {
                warn!(
                    subsystem = "db",
                    component = "schema",
                    path = %path.display(),
                    "Record table not found, initializing"
                );
            }
            db.initialize(seed_samples).await?;
        }
        Ok(db)
    }

    /// Create the schema if absent, optionally seeding sample records.
    pub async fn initialize(&self, seed_samples: bool) -> Result<usize> {
        schema::initialize(&self.pool, seed_samples).await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
