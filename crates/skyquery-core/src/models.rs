//! Data models for skyquery.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;

/// Current time as an RFC 3339 string with microsecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// =============================================================================
// RECORD TYPES
// =============================================================================

/// A persisted, geotagged file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Surrogate row id.
    pub id: i64,
    /// Stable identifier of the source artifact, unique across the store.
    pub key: String,
    /// Capture timestamp. Compared lexicographically.
    pub timestamp: String,
    /// Opaque reference to the artifact's content.
    pub url: String,
    /// Location label. `None` until the backfill pass assigns one.
    pub location: Option<String>,
}

/// Input for inserting or refreshing a record.
///
/// Field aliases accept the names the ingestion listing uses
/// (`id`/`file_id`, `createdTime`, `data_url`/`webViewLink`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(alias = "file_id", alias = "id")]
    pub key: String,
    #[serde(alias = "createdTime")]
    pub timestamp: String,
    #[serde(alias = "data_url", alias = "webViewLink")]
    pub url: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewRecord {
    pub fn new(
        key: impl Into<String>,
        timestamp: impl Into<String>,
        url: impl Into<String>,
        location: Option<&str>,
    ) -> Self {
        Self {
            key: key.into(),
            timestamp: timestamp.into(),
            url: url.into(),
            location: location.map(str::to_owned),
        }
    }
}

/// Whether an upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Aggregated upsert counts for a batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub created: usize,
    pub updated: usize,
}

impl IngestSummary {
    /// Count one upsert outcome.
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}

/// Number of records carrying a location label (`None` = unlabeled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: Option<String>,
    pub count: i64,
}

/// Summary of the store contents, logged before each cloud lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOverview {
    pub total: i64,
    pub locations: Vec<Option<String>>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

// =============================================================================
// QUERY TYPES
// =============================================================================

/// Compound location + time-range filter extracted from a request payload.
///
/// Absent fields are kept as `None`; they bind as SQL `NULL` and therefore
/// match no record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub location: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl QueryFilter {
    pub fn new(location: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
        }
    }

    /// Extract the filter from `data.query`, or a top-level `query` object.
    ///
    /// Non-string values are treated as absent.
    pub fn from_payload(payload: &JsonValue) -> Self {
        let query = payload
            .pointer("/data/query")
            .or_else(|| payload.get("query"));
        let field = |name: &str| {
            query
                .and_then(|q| q.get(name))
                .and_then(JsonValue::as_str)
                .map(str::to_owned)
        };
        Self {
            location: field("location"),
            start_time: field("start_time"),
            end_time: field("end_time"),
        }
    }
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Identifier of a persisted request: `{time}_{fingerprint}_{random}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name the request is persisted under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, defaults::REQUEST_FILE_EXTENSION)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a request that has been durably written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRequest {
    pub id: RequestId,
    /// Path relative to the payload store root.
    pub path: String,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Which resolver produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cloud,
    Satellite,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cloud => "cloud",
            Source::Satellite => "satellite",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub capture_timestamp: String,
    pub data_url: String,
    pub location: Option<String>,
}

impl From<Record> for ResultItem {
    fn from(record: Record) -> Self {
        Self {
            capture_timestamp: record.timestamp,
            data_url: record.url,
            location: record.location,
        }
    }
}

/// Uniform answer returned for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseEnvelope {
    Success {
        source: Source,
        request_timestamp: String,
        results: Vec<ResultItem>,
    },
    Error {
        timestamp: String,
        error_message: String,
        message: String,
    },
}

impl ResponseEnvelope {
    pub fn success(source: Source, results: Vec<ResultItem>) -> Self {
        ResponseEnvelope::Success {
            source,
            request_timestamp: timestamp_now(),
            results,
        }
    }

    pub fn error(error: impl fmt::Display, message: &str) -> Self {
        ResponseEnvelope::Error {
            timestamp: timestamp_now(),
            error_message: error.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// Resolver that answered, if any.
    pub fn source(&self) -> Option<Source> {
        match self {
            ResponseEnvelope::Success { source, .. } => Some(*source),
            ResponseEnvelope::Error { .. } => None,
        }
    }

    pub fn results(&self) -> &[ResultItem] {
        match self {
            ResponseEnvelope::Success { results, .. } => results,
            ResponseEnvelope::Error { .. } => &[],
        }
    }

    /// Serialize as a single line of JSON.
    pub fn to_json_line(&self) -> String {
        // Every field is a string, enum tag or list of those.
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","error_message":{:?},"message":"{}"}}"#,
                e.to_string(),
                defaults::MSG_PROCESS_FAILED
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_from_nested_data_query() {
        let payload = json!({
            "user_id": "u-1",
            "data": {"query": {"location": "NYC", "start_time": "2023-12-31", "end_time": "2024-01-02"}}
        });
        let filter = QueryFilter::from_payload(&payload);
        assert_eq!(filter, QueryFilter::new("NYC", "2023-12-31", "2024-01-02"));
    }

    #[test]
    fn test_filter_from_top_level_query() {
        let payload = json!({"query": {"location": "LA", "start_time": "a", "end_time": "b"}});
        let filter = QueryFilter::from_payload(&payload);
        assert_eq!(filter.location.as_deref(), Some("LA"));
    }

    #[test]
    fn test_filter_missing_fields_are_none() {
        let payload = json!({"data": {"query": {"location": 42}}});
        let filter = QueryFilter::from_payload(&payload);
        assert_eq!(filter, QueryFilter::default());

        let filter = QueryFilter::from_payload(&json!("just a string"));
        assert_eq!(filter, QueryFilter::default());
    }

    #[test]
    fn test_success_envelope_shape() {
        let item = ResultItem {
            capture_timestamp: "2024-01-01T00:00:00Z".into(),
            data_url: "u1".into(),
            location: Some("NYC".into()),
        };
        let value = serde_json::to_value(ResponseEnvelope::success(Source::Cloud, vec![item]))
            .unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["source"], "cloud");
        assert!(value["request_timestamp"].is_string());
        assert_eq!(value["results"][0]["capture_timestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(value["results"][0]["data_url"], "u1");
        assert_eq!(value["results"][0]["location"], "NYC");
    }

    #[test]
    fn test_error_envelope_shape() {
        let env = ResponseEnvelope::error("disk full", defaults::MSG_STORE_FAILED);
        assert!(!env.is_success());
        assert_eq!(env.source(), None);
        let value: serde_json::Value = serde_json::from_str(&env.to_json_line()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_message"], "disk full");
        assert_eq!(value["message"], "Failed to store payload");
        assert!(value.get("source").is_none());
    }

    #[test]
    fn test_json_line_has_no_newlines() {
        let env = ResponseEnvelope::success(Source::Satellite, vec![]);
        assert!(!env.to_json_line().contains('\n'));
    }

    #[test]
    fn test_ingest_summary_counts() {
        let mut summary = IngestSummary::default();
        summary.record(UpsertOutcome::Created);
        summary.record(UpsertOutcome::Updated);
        summary.record(UpsertOutcome::Created);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 1);
    }

    #[test]
    fn test_new_record_accepts_listing_aliases() {
        let entry: NewRecord = serde_json::from_value(json!({
            "id": "abc",
            "createdTime": "2024-02-01T10:00:00Z",
            "webViewLink": "https://drive.example/abc"
        }))
        .unwrap();
        assert_eq!(entry.key, "abc");
        assert_eq!(entry.timestamp, "2024-02-01T10:00:00Z");
        assert_eq!(entry.location, None);
    }

    #[test]
    fn test_request_id_file_name() {
        let id = RequestId::new("20240101_000000_000001_deadbeef_0011223344556677");
        assert_eq!(
            id.file_name(),
            "20240101_000000_000001_deadbeef_0011223344556677.json"
        );
    }
}
