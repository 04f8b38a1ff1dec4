//! Record table schema, shared with the ingestion job.
//!
//! `file_id` is the record key and `data_url` the content reference. The
//! UNIQUE constraint on `file_id` is what makes upserts safe under
//! concurrent writers.

use sqlx::SqlitePool;
use tracing::info;

use skyquery_core::defaults::{RECORD_TABLE, SAMPLE_RECORDS};
use skyquery_core::Result;

const CREATE_RECORD_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS satellite_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_id TEXT NOT NULL UNIQUE,
        timestamp TEXT NOT NULL,
        data_url TEXT NOT NULL,
        location TEXT
    )
"#;

const CREATE_LOCATION_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_satellite_data_location_timestamp
        ON satellite_data (location, timestamp)
"#;

/// Whether the record table exists.
pub async fn table_exists(pool: &SqlitePool) -> Result<bool> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(RECORD_TABLE)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

/// Create the table and index if absent. When `seed_samples` is set and the
/// table is empty, insert the sample records. Returns the number seeded.
pub async fn initialize(pool: &SqlitePool, seed_samples: bool) -> Result<usize> {
    let mut tx = pool.begin().await?;
    sqlx::query(CREATE_RECORD_TABLE).execute(&mut *tx).await?;
    sqlx::query(CREATE_LOCATION_INDEX).execute(&mut *tx).await?;

    let mut seeded = 0;
    if seed_samples {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM satellite_data")
            .fetch_one(&mut *tx)
            .await?;
        if count == 0 {
            for (key, timestamp, url, location) in SAMPLE_RECORDS {
                seeded += sqlx::query(
                    r#"INSERT OR IGNORE INTO satellite_data (file_id, timestamp, data_url, location)
                       VALUES (?, ?, ?, ?)"#,
                )
                .bind(*key)
                .bind(*timestamp)
                .bind(*url)
                .bind(*location)
                .execute(&mut *tx)
                .await?
                .rows_affected() as usize;
            }
        }
    }
    tx.commit().await?;

    info!(
        subsystem = "db",
        component = "schema",
        op = "initialize",
        seeded,
        "Record store initialized"
    );
    Ok(seeded)
}
