//! Resolver implementations.
//!
//! - [`CloudResolver`] answers from the local record store.
//! - [`SatelliteResolver`] is a stub that always answers with no results.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, Level};

use skyquery_core::{
    Error, QueryFilter, RecordRepository, Resolver, Result, ResultItem, Source, StoredRequest,
};
use skyquery_db::PayloadStore;

/// Resolves a stored request by querying the record store with the
/// location + time-range filter found in its payload.
pub struct CloudResolver {
    records: Arc<dyn RecordRepository>,
    payloads: Arc<PayloadStore>,
}

impl CloudResolver {
    pub fn new(records: Arc<dyn RecordRepository>, payloads: Arc<PayloadStore>) -> Self {
        Self { records, payloads }
    }

    async fn log_store_overview(&self) {
        match self.records.overview().await {
            Ok(overview) => debug!(
                subsystem = "router",
                component = "cloud",
                total = overview.total,
                locations = ?overview.locations,
                earliest = ?overview.earliest,
                latest = ?overview.latest,
                "Record store overview"
            ),
            Err(e) => debug!(subsystem = "router", component = "cloud", error = %e, "Record store overview unavailable"),
        }
    }
}

#[async_trait]
impl Resolver for CloudResolver {
    fn source(&self) -> Source {
        Source::Cloud
    }

    async fn resolve(&self, request: &StoredRequest) -> Result<Vec<ResultItem>> {
        let start = Instant::now();
        // Resolve from what was persisted, not from the caller's copy.
        let payload = self.payloads.read(request).await?;
        let filter = QueryFilter::from_payload(&payload);

        debug!(
            subsystem = "router",
            component = "cloud",
            op = "resolve",
            request_id = %request.id,
            location = ?filter.location,
            start_time = ?filter.start_time,
            end_time = ?filter.end_time,
            "Querying record store"
        );
        if tracing::enabled!(Level::DEBUG) {
            self.log_store_overview().await;
        }

        let records = self.records.query(&filter).await?;
        if records.is_empty() {
            return Err(Error::no_match(
                filter.location.as_deref(),
                filter.start_time.as_deref(),
                filter.end_time.as_deref(),
            ));
        }

        debug!(
            subsystem = "router",
            component = "cloud",
            request_id = %request.id,
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Cloud lookup matched"
        );
        Ok(records.into_iter().map(ResultItem::from).collect())
    }
}

/// Mock satellite downlink. Never fails and never returns data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SatelliteResolver;

#[async_trait]
impl Resolver for SatelliteResolver {
    fn source(&self) -> Source {
        Source::Satellite
    }

    async fn resolve(&self, request: &StoredRequest) -> Result<Vec<ResultItem>> {
        debug!(
            subsystem = "router",
            component = "satellite",
            op = "resolve",
            request_id = %request.id,
            "Satellite stub answered"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skyquery_db::test_fixtures::TestDatabase;

    fn cloud(test_db: &TestDatabase) -> (CloudResolver, Arc<PayloadStore>) {
        let payloads = Arc::new(test_db.payload_store());
        let records = Arc::new(test_db.db.records.clone());
        (CloudResolver::new(records, payloads.clone()), payloads)
    }

    #[tokio::test]
    async fn test_cloud_resolves_matching_request() {
        let test_db = TestDatabase::seeded().await;
        let (resolver, payloads) = cloud(&test_db);
        let stored = payloads
            .store(&json!({"data": {"query": {
                "location": "NYC", "start_time": "2023-12-31", "end_time": "2024-01-02"
            }}}))
            .await
            .unwrap();

        let results = resolver.resolve(&stored).await.unwrap();
        assert_eq!(
            results,
            vec![ResultItem {
                capture_timestamp: "2024-01-01T00:00:00Z".into(),
                data_url: "https://example.com/data1".into(),
                location: Some("NYC".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_cloud_reports_no_match() {
        let test_db = TestDatabase::seeded().await;
        let (resolver, payloads) = cloud(&test_db);
        let stored = payloads
            .store(&json!({"data": {"query": {
                "location": "Seattle", "start_time": "2023-12-31", "end_time": "2024-01-02"
            }}}))
            .await
            .unwrap();

        let err = resolver.resolve(&stored).await.unwrap_err();
        assert!(matches!(err, Error::NoMatch { .. }));
        assert!(err.to_string().contains("Seattle"));
    }

    #[tokio::test]
    async fn test_cloud_fails_when_request_file_is_missing() {
        let test_db = TestDatabase::seeded().await;
        let (resolver, _) = cloud(&test_db);
        let ghost = StoredRequest {
            id: skyquery_core::RequestId::new("ghost"),
            path: "ghost.json".into(),
        };

        assert!(matches!(resolver.resolve(&ghost).await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_satellite_always_answers_empty() {
        let stored = StoredRequest {
            id: skyquery_core::RequestId::new("any"),
            path: "never-read.json".into(),
        };
        assert!(SatelliteResolver.resolve(&stored).await.unwrap().is_empty());
        assert_eq!(SatelliteResolver.source(), Source::Satellite);
    }
}
