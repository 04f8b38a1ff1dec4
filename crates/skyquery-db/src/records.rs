//! Record repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, trace};

use skyquery_core::{
    Error, IngestSummary, LabelPicker, LocationCount, NewRecord, QueryFilter, Record,
    RecordRepository, Result, StoreOverview, UpsertOutcome,
};

const RECORD_COLUMNS: &str = "id, file_id, timestamp, data_url, location";

/// SQLite implementation of RecordRepository.
#[derive(Clone)]
pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    /// Create a new SqliteRecordRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn upsert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        record: &NewRecord,
    ) -> Result<UpsertOutcome> {
        // The UNIQUE constraint decides; a concurrent insert of the same key
        // turns this into a no-op and we fall through to the update.
        let inserted = sqlx::query(
            r#"INSERT INTO satellite_data (file_id, timestamp, data_url, location)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(file_id) DO NOTHING"#,
        )
        .bind(&record.key)
        .bind(&record.timestamp)
        .bind(&record.url)
        .bind(record.location.as_deref())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if inserted == 1 {
            return Ok(UpsertOutcome::Created);
        }

        sqlx::query(
            r#"UPDATE satellite_data
               SET timestamp = ?, data_url = ?, location = COALESCE(?, location)
               WHERE file_id = ?"#,
        )
        .bind(&record.timestamp)
        .bind(&record.url)
        .bind(record.location.as_deref())
        .bind(&record.key)
        .execute(&mut **tx)
        .await?;

        Ok(UpsertOutcome::Updated)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
    Ok(Record {
        id: row.try_get("id")?,
        key: row.try_get("file_id")?,
        timestamp: row.try_get("timestamp")?,
        url: row.try_get("data_url")?,
        location: row.try_get("location")?,
    })
}

fn records_from_rows(rows: &[SqliteRow]) -> Result<Vec<Record>> {
    rows.iter().map(record_from_row).collect()
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn upsert(&self, record: NewRecord) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::upsert_tx(&mut tx, &record).await?;
        tx.commit().await?;

        trace!(
            subsystem = "db",
            component = "records",
            op = "upsert",
            key = %record.key,
            outcome = ?outcome,
            "Record upserted"
        );
        Ok(outcome)
    }

    async fn upsert_many(&self, records: Vec<NewRecord>) -> Result<IngestSummary> {
        let start = Instant::now();
        let mut summary = IngestSummary::default();

        let mut tx = self.pool.begin().await?;
        for record in &records {
            summary.record(Self::upsert_tx(&mut tx, record).await?);
        }
        tx.commit().await?;

        info!(
            subsystem = "db",
            component = "records",
            op = "upsert_many",
            created = summary.created,
            updated = summary.updated,
            duration_ms = start.elapsed().as_millis() as u64,
            "Records ingested"
        );
        Ok(summary)
    }

    async fn query(&self, filter: &QueryFilter) -> Result<Vec<Record>> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            r#"SELECT {RECORD_COLUMNS}
               FROM satellite_data
               WHERE location = ?
                 AND timestamp BETWEEN ? AND ?
               ORDER BY timestamp DESC, id DESC"#
        ))
        .bind(filter.location.as_deref())
        .bind(filter.start_time.as_deref())
        .bind(filter.end_time.as_deref())
        .fetch_all(&self.pool)
        .await?;
        let records = records_from_rows(&rows)?;

        debug!(
            subsystem = "db",
            component = "records",
            op = "query",
            location = ?filter.location,
            start_time = ?filter.start_time,
            end_time = ?filter.end_time,
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Record query complete"
        );
        Ok(records)
    }

    async fn list_all(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM satellite_data ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        records_from_rows(&rows)
    }

    async fn list_by_location(&self, location: &str) -> Result<Vec<Record>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {RECORD_COLUMNS} FROM satellite_data
               WHERE location = ?
               ORDER BY timestamp DESC, id DESC"#
        ))
        .bind(location)
        .fetch_all(&self.pool)
        .await?;
        records_from_rows(&rows)
    }

    async fn location_stats(&self) -> Result<Vec<LocationCount>> {
        let rows = sqlx::query(
            r#"SELECT location, COUNT(*) AS count
               FROM satellite_data
               GROUP BY location
               ORDER BY count DESC, location"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LocationCount {
                    location: row.try_get("location")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn overview(&self) -> Result<StoreOverview> {
        let (total, earliest, latest): (i64, Option<String>, Option<String>) = sqlx::query_as(
            "SELECT COUNT(*), MIN(timestamp), MAX(timestamp) FROM satellite_data",
        )
        .fetch_one(&self.pool)
        .await?;

        let locations: Vec<Option<String>> =
            sqlx::query_scalar("SELECT DISTINCT location FROM satellite_data ORDER BY location")
                .fetch_all(&self.pool)
                .await?;

        Ok(StoreOverview {
            total,
            locations,
            earliest,
            latest,
        })
    }

    async fn backfill_missing_locations(
        &self,
        labels: &[String],
        picker: &dyn LabelPicker,
    ) -> Result<usize> {
        if labels.is_empty() {
            return Err(Error::InvalidInput("location label set is empty".into()));
        }

        // Read outside the transaction: a deferred transaction that reads
        // before writing fails with SQLITE_BUSY_SNAPSHOT instead of waiting
        // when another connection commits in between.
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT file_id FROM satellite_data WHERE location IS NULL")
                .fetch_all(&self.pool)
                .await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut labeled = 0usize;
        for key in &keys {
            let label = picker
                .pick(labels)
                .ok_or_else(|| Error::Internal("label picker returned no label".into()))?;
            // Guarded on NULL so a label written since the SELECT is kept.
            labeled += sqlx::query(
                "UPDATE satellite_data SET location = ? WHERE file_id = ? AND location IS NULL",
            )
            .bind(&label)
            .bind(key)
            .execute(&mut *tx)
            .await?
            .rows_affected() as usize;

            trace!(subsystem = "db", component = "backfill", key = %key, location = %label, "Location assigned");
        }
        tx.commit().await?;

        Ok(labeled)
    }
}
