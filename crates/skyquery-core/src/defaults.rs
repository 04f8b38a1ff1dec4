//! Centralized default constants for skyquery.
//!
//! All crates and the CLI reference these constants instead of defining
//! their own magic values.

// =============================================================================
// PATHS
// =============================================================================

/// Directory under the user's home holding the database and request files.
pub const HOME_DIR_NAME: &str = "ef_hackathon";

/// File name of the record store inside the home directory.
pub const DATABASE_FILE_NAME: &str = "satellite_data.db";

/// Directory name for persisted request payloads inside the home directory.
pub const STORAGE_DIR_NAME: &str = "data_storage";

/// Extension appended to every persisted request id.
pub const REQUEST_FILE_EXTENSION: &str = "json";

// =============================================================================
// RECORD STORE
// =============================================================================

/// Table holding the indexed records. Shared with the ingestion job.
pub const RECORD_TABLE: &str = "satellite_data";

/// Maximum pooled connections. The CLI handles one request per process.
pub const MAX_CONNECTIONS: u32 = 4;

/// Pool acquire timeout in seconds.
pub const ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// SQLite busy timeout in seconds.
pub const BUSY_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// LOCATION LABELS
// =============================================================================

/// Labels assigned by the backfill pass to records without a location.
pub const BACKFILL_LOCATIONS: &[&str] = &[
    "NYC", "LA", "Chicago", "Houston", "Miami", "Seattle", "Boston", "Denver",
];

/// Labels assigned at ingestion when a listing entry carries no location.
pub const INGEST_LOCATIONS: &[&str] = &[
    "NYC", "LA", "Chicago", "Houston", "Miami", "Seattle", "Boston", "Denver", "Austin",
    "Portland", "Dallas", "Atlanta", "Phoenix", "Detroit",
];

/// Sample rows seeded into a freshly initialized, empty store:
/// `(key, timestamp, url, location)`.
pub const SAMPLE_RECORDS: &[(&str, &str, &str, &str)] = &[
    ("file1", "2024-01-01T00:00:00Z", "https://example.com/data1", "NYC"),
    ("file2", "2024-01-02T00:00:00Z", "https://example.com/data2", "LA"),
    (
        "file3",
        "2024-01-03T00:00:00Z",
        "https://example.com/data3",
        "Chicago",
    ),
];

// =============================================================================
// REQUEST IDS
// =============================================================================

/// Hex characters of the content fingerprint kept in a request id.
pub const REQUEST_ID_HASH_LEN: usize = 8;

/// Hex characters of the random component kept in a request id.
pub const REQUEST_ID_RANDOM_LEN: usize = 16;

// =============================================================================
// RESPONSE MESSAGES
// =============================================================================

/// `message` of the error envelope when the request could not be persisted.
pub const MSG_STORE_FAILED: &str = "Failed to store payload";

/// `message` of the error envelope when the request could not be read or parsed.
pub const MSG_PROCESS_FAILED: &str = "Failed to process request";

/// `message` of the error envelope when every resolver failed.
pub const MSG_RESOLVE_FAILED: &str = "Failed to resolve request";
