//! Write-then-resolve request pipeline.
//!
//! A request is persisted before any resolution is attempted. A failed write
//! aborts the request with an error envelope; everything after the write is
//! absorbed by the router.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{error, info};

use skyquery_core::defaults::MSG_STORE_FAILED;
use skyquery_core::{Error, ResponseEnvelope, Result, StoredRequest};
use skyquery_db::{Database, PayloadStore};

use crate::router::ResolutionRouter;

/// Result of processing one request.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Where the request was written; `None` when the write failed.
    pub stored: Option<StoredRequest>,
    pub response: ResponseEnvelope,
}

/// Parse a raw request body as JSON.
pub fn parse_request(input: &str) -> Result<JsonValue> {
    if input.trim().is_empty() {
        return Err(Error::InvalidInput("empty request body".into()));
    }
    Ok(serde_json::from_str(input)?)
}

/// Persists each request, then routes it.
pub struct PayloadProcessor {
    payloads: Arc<PayloadStore>,
    router: ResolutionRouter,
}

impl PayloadProcessor {
    pub fn new(payloads: Arc<PayloadStore>, router: ResolutionRouter) -> Self {
        Self { payloads, router }
    }

    /// Cloud lookup against `db`, satellite stub as fallback.
    pub fn cloud_with_satellite_fallback(db: &Database, payloads: Arc<PayloadStore>) -> Self {
        let router = ResolutionRouter::cloud_with_satellite_fallback(
            Arc::new(db.records.clone()),
            payloads.clone(),
        );
        Self::new(payloads, router)
    }

    /// Write the payload, then resolve it.
    pub async fn process(&self, payload: &JsonValue) -> ProcessOutcome {
        let start = Instant::now();

        let stored = match self.payloads.store(payload).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(
                    subsystem = "router",
                    component = "pipeline",
                    op = "write",
                    error = %e,
                    "Failed to store request payload"
                );
                return ProcessOutcome {
                    stored: None,
                    response: ResponseEnvelope::error(e, MSG_STORE_FAILED),
                };
            }
        };

        let response = self.router.route(&stored).await;

        info!(
            subsystem = "router",
            component = "pipeline",
            op = "process",
            request_id = %stored.id,
            success = response.is_success(),
            source = response.source().map(|s| s.as_str()).unwrap_or("none"),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request processed"
        );
        ProcessOutcome {
            stored: Some(stored),
            response,
        }
    }
}
