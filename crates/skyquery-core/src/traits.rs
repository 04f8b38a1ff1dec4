//! Core traits for skyquery abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::labels::LabelPicker;
use crate::models::*;

// =============================================================================
// RECORD REPOSITORY
// =============================================================================

/// Durable, queryable index of geotagged records.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert the record, or refresh timestamp, url and location when its key
    /// already exists.
    async fn upsert(&self, record: NewRecord) -> Result<UpsertOutcome>;

    /// Upsert a batch, returning aggregated created/updated counts.
    async fn upsert_many(&self, records: Vec<NewRecord>) -> Result<IngestSummary>;

    /// Records whose location equals the filter and whose timestamp lies in
    /// the inclusive range, newest first.
    async fn query(&self, filter: &QueryFilter) -> Result<Vec<Record>>;

    /// Every record, newest first.
    async fn list_all(&self) -> Result<Vec<Record>>;

    /// Every record for one location, newest first.
    async fn list_by_location(&self, location: &str) -> Result<Vec<Record>>;

    /// Record counts grouped by location.
    async fn location_stats(&self) -> Result<Vec<LocationCount>>;

    /// Totals, distinct locations and timestamp range.
    async fn overview(&self) -> Result<StoreOverview>;

    /// Assign a label from `labels` to every record without a location.
    /// Returns the number of records labeled.
    async fn backfill_missing_locations(
        &self,
        labels: &[String],
        picker: &dyn LabelPicker,
    ) -> Result<usize>;
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// One way of answering a stored request.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Source label reported in the response envelope.
    fn source(&self) -> Source;

    /// Resolve the request. An `Err` hands the request to the next resolver.
    async fn resolve(&self, request: &StoredRequest) -> Result<Vec<ResultItem>>;
}
