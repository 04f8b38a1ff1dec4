//! Write-ahead storage for incoming request payloads.
//!
//! Every request is written once, before it is resolved, under a file name
//! derived from its generated id:
//! - a wall-clock component with microsecond resolution
//! - a BLAKE3 fingerprint of the serialized payload
//! - a random component from a UUIDv4
//!
//! Files are never overwritten or removed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use skyquery_db::payload_store::{FilesystemBackend, PayloadStore};
//!
//! let store = PayloadStore::new(FilesystemBackend::new("/var/skyquery/requests"));
//! let stored = store.store(&payload).await?;
//! let payload = store.read(&stored).await?;
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use skyquery_core::defaults::{REQUEST_ID_HASH_LEN, REQUEST_ID_RANDOM_LEN};
use skyquery_core::{Error, RequestId, Result, StoredRequest};

/// Where request payloads live. Paths are relative to the backend root.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` at `path`. Existing files are never replaced.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Local directory backend.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Create the storage directory if needed and prove it accepts writes
    /// by round-tripping a probe file.
    pub async fn validate(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;

        let probe = self.base_path.join(".write-probe");
        let marker = b"skyquery";
        fs::write(&probe, marker).await?;
        let echoed = fs::read(&probe).await;
        fs::remove_file(&probe).await?;

        if echoed? != marker {
            return Err(Error::Internal(format!(
                "storage probe in {} read back different bytes",
                self.base_path.display()
            )));
        }
        debug!(base_path = %self.base_path.display(), "payload_store: storage directory writable");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(storage_path = %path, full_path = %full_path.display(), size = data.len(), "payload_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "payload_store: create_dir_all failed");
                e
            })?;
        }

        // Stage under a name no other writer can pick, then publish with a
        // hard link: unlike rename, linking fails when the target exists.
        let temp_path = full_path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = stage(&temp_path, data).await {
            warn!(temp_path = %temp_path.display(), error = %e, "payload_store: staging failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let published = fs::hard_link(&temp_path, &full_path).await;
        if let Err(e) = fs::remove_file(&temp_path).await {
            warn!(temp_path = %temp_path.display(), error = %e, "payload_store: temp cleanup failed");
        }

        match published {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(Error::AlreadyExists(path.to_string()))
            }
            Err(e) => {
                warn!(to = %full_path.display(), error = %e, "payload_store: hard_link failed");
                Err(e.into())
            }
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.full_path(path)).await?)
    }
}

/// Write `data` to a file that must not exist yet and flush it to disk.
async fn stage(temp_path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;
    file.write_all(data).await?;
    file.sync_all().await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp_path, std::fs::Permissions::from_mode(0o644)).await?;
    }
    Ok(())
}

/// Truncated BLAKE3 hex digest used as a request's content fingerprint.
pub fn compute_fingerprint(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hash.to_hex().as_str()[..REQUEST_ID_HASH_LEN].to_string()
}

/// Generate a request id: `{YYYYmmdd_HHMMSS_micros}_{fingerprint}_{random}`.
///
/// Byte-identical payloads submitted in the same microsecond still receive
/// distinct ids through the random component.
pub fn generate_request_id(payload: &JsonValue) -> Result<RequestId> {
    let serialized = serde_json::to_vec(payload)?;
    let time = Utc::now().format("%Y%m%d_%H%M%S_%6f");
    let random = Uuid::new_v4().simple().to_string();
    Ok(RequestId::new(format!(
        "{}_{}_{}",
        time,
        compute_fingerprint(&serialized),
        &random[..REQUEST_ID_RANDOM_LEN]
    )))
}

/// Persists request payloads through a storage backend.
pub struct PayloadStore {
    backend: Box<dyn StorageBackend>,
}

impl PayloadStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Write the payload under `id`. Never overwrites.
    pub async fn write(&self, payload: &JsonValue, id: RequestId) -> Result<StoredRequest> {
        let path = id.file_name();
        let data = serde_json::to_vec_pretty(payload)?;
        self.backend.write(&path, &data).await?;

        info!(
            subsystem = "db",
            component = "payload_store",
            op = "write",
            request_id = %id,
            size = data.len(),
            "Request payload stored"
        );
        Ok(StoredRequest { id, path })
    }

    /// Generate an id for the payload and write it.
    pub async fn store(&self, payload: &JsonValue) -> Result<StoredRequest> {
        let id = generate_request_id(payload)?;
        self.write(payload, id).await
    }

    /// Load a previously stored payload.
    pub async fn read(&self, request: &StoredRequest) -> Result<JsonValue> {
        let data = self.backend.read(&request.path).await?;
        Ok(serde_json::from_slice(&data)?)
    }
}
