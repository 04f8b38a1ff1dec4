//! Test fixtures for record store tests.
//!
//! Each [`TestDatabase`] owns a temporary directory holding a fresh SQLite
//! file and a request storage directory; both disappear when it is dropped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skyquery_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::seeded().await;
//!     let records = test_db.db.records.list_all().await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::payload_store::{FilesystemBackend, PayloadStore};
use crate::{Database, PoolConfig};

/// Fresh, initialized store in a temporary directory.
pub struct TestDatabase {
    pub db: Database,
    dir: TempDir,
}

impl TestDatabase {
    /// Empty store.
    pub async fn new() -> Self {
        Self::with_seed(false).await
    }

    /// Store holding the three sample records.
    pub async fn seeded() -> Self {
        Self::with_seed(true).await
    }

    async fn with_seed(seed_samples: bool) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_or_init(
            &dir.path().join("test.db"),
            PoolConfig::default(),
            seed_samples,
        )
        .await
        .expect("Failed to open test database");
        Self { db, dir }
    }

    /// Directory requests are written to by [`TestDatabase::payload_store`].
    pub fn storage_dir(&self) -> PathBuf {
        self.dir.path().join("data_storage")
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Payload store rooted in this fixture's storage directory.
    pub fn payload_store(&self) -> PayloadStore {
        PayloadStore::new(FilesystemBackend::new(self.storage_dir()))
    }
}
