//! Database connection pool management.

use std::path::Path;
use std::time::{Duration, Instant};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use skyquery_core::defaults::{ACQUIRE_TIMEOUT_SECS, BUSY_TIMEOUT_SECS, MAX_CONNECTIONS};
use skyquery_core::{Error, Result};

/// Pool configuration options.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Time to wait for a free connection.
    pub acquire_timeout: Duration,
    /// Time SQLite waits on a locked database before returning `SQLITE_BUSY`.
    pub busy_timeout: Duration,
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(ACQUIRE_TIMEOUT_SECS),
            busy_timeout: Duration::from_secs(BUSY_TIMEOUT_SECS),
            create_if_missing: true,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of connections.
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// Set the SQLite busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Whether a missing database file is created on connect.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

/// Open a SQLite connection pool on `path` with default configuration.
pub async fn create_pool(path: &Path) -> Result<SqlitePool> {
    create_pool_with_config(path, PoolConfig::default()).await
}

/// Open a SQLite connection pool on `path` with custom configuration.
pub async fn create_pool_with_config(path: &Path, config: PoolConfig) -> Result<SqlitePool> {
    let start = Instant::now();

    debug!(
        subsystem = "db",
        component = "pool",
        op = "create",
        path = %path.display(),
        max_connections = config.max_connections,
        create_if_missing = config.create_if_missing,
        "Opening record store"
    );

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(config.create_if_missing)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "established",
        path = %path.display(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Record store opened"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, MAX_CONNECTIONS);
        assert!(config.create_if_missing);
    }

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::new()
            .max_connections(1)
            .busy_timeout(Duration::from_secs(2))
            .create_if_missing(false);

        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_secs(2));
        assert!(!config.create_if_missing);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let result =
            create_pool_with_config(&path, PoolConfig::new().create_if_missing(false)).await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert!(!path.exists());
    }
}
