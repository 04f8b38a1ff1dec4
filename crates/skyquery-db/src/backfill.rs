//! Location backfill maintenance pass.
//!
//! Labels records that were ingested without a location so they stay
//! reachable by location queries. The label is filler, chosen by a
//! [`LabelPicker`]; callers must not attach meaning to which label a record
//! receives. Running the pass again only touches records that are still
//! unlabeled.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use skyquery_core::defaults::BACKFILL_LOCATIONS;
use skyquery_core::{label_set, LabelPicker, RecordRepository, Result, ThreadRngPicker};

use crate::pool::PoolConfig;
use crate::Database;

/// Label set plus the randomness used to draw from it.
#[derive(Clone)]
pub struct LocationBackfill {
    labels: Vec<String>,
    picker: Arc<dyn LabelPicker>,
}

impl Default for LocationBackfill {
    fn default() -> Self {
        Self::new(label_set(BACKFILL_LOCATIONS), Arc::new(ThreadRngPicker))
    }
}

impl LocationBackfill {
    pub fn new(labels: Vec<String>, picker: Arc<dyn LabelPicker>) -> Self {
        Self { labels, picker }
    }

    /// Replace the label set, keeping the picker.
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label every unlabeled record in `repo`. Returns the number labeled.
    pub async fn run(&self, repo: &dyn RecordRepository) -> Result<usize> {
        let start = Instant::now();
        let labeled = repo
            .backfill_missing_locations(&self.labels, self.picker.as_ref())
            .await?;

        info!(
            subsystem = "db",
            component = "backfill",
            op = "run",
            rows_affected = labeled,
            duration_ms = start.elapsed().as_millis() as u64,
            "Location backfill complete"
        );
        Ok(labeled)
    }

    /// Open the store at `path`, re-initializing it if the file or table is
    /// missing, then run the pass. Returns the open database for reuse.
    pub async fn run_at(
        &self,
        path: &Path,
        config: PoolConfig,
        seed_samples: bool,
    ) -> Result<(Database, usize)> {
        let db = Database::open_or_init(path, config, seed_samples).await?;
        let labeled = self.run(&db.records).await?;
        Ok((db, labeled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::TestDatabase;
    use skyquery_core::{NewRecord, SeededPicker};

    async fn insert_unlabeled(test_db: &TestDatabase, keys: &[&str]) {
        for (i, key) in keys.iter().enumerate() {
            test_db
                .db
                .records
                .upsert(NewRecord::new(*key, format!("2024-03-0{}T00:00:00Z", i + 1), "u", None))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_backfill_assigns_labels_from_set() {
        let test_db = TestDatabase::new().await;
        insert_unlabeled(&test_db, &["a", "b", "c"]).await;
        let backfill = LocationBackfill::default();

        assert_eq!(backfill.run(&test_db.db.records).await.unwrap(), 3);

        for record in test_db.db.records.list_all().await.unwrap() {
            let label = record.location.expect("labeled");
            assert!(backfill.labels().contains(&label), "unexpected {label}");
        }
    }

    #[tokio::test]
    async fn test_second_pass_changes_nothing() {
        let test_db = TestDatabase::seeded().await;
        insert_unlabeled(&test_db, &["a", "b"]).await;
        let backfill = LocationBackfill::new(
            label_set(BACKFILL_LOCATIONS),
            Arc::new(SeededPicker::new(11)),
        );

        assert_eq!(backfill.run(&test_db.db.records).await.unwrap(), 2);
        let after_first = test_db.db.records.list_all().await.unwrap();

        assert_eq!(backfill.run(&test_db.db.records).await.unwrap(), 0);
        let after_second = test_db.db.records.list_all().await.unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_labeled_records_are_untouched() {
        let test_db = TestDatabase::seeded().await;
        let before = test_db.db.records.list_all().await.unwrap();

        let backfill = LocationBackfill::default().with_labels(label_set(&["Phoenix"]));
        assert_eq!(backfill.run(&test_db.db.records).await.unwrap(), 0);

        assert_eq!(test_db.db.records.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_at_initializes_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.db");

        let (db, labeled) = LocationBackfill::default()
            .run_at(&path, PoolConfig::default(), true)
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(labeled, 0);
        assert_eq!(db.records.list_all().await.unwrap().len(), 3);
    }
}
