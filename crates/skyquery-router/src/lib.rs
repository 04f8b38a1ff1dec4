//! # skyquery-router
//!
//! Resolves stored requests against the record store, degrading to a stub
//! satellite resolver whenever the cloud lookup fails.
//!
//! This crate provides:
//! - [`CloudResolver`] and [`SatelliteResolver`], two [`Resolver`] implementations
//! - [`ResolutionRouter`], which tries a primary resolver and then a fallback
//! - [`PayloadProcessor`], the write-then-resolve request pipeline
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use skyquery_db::{Database, FilesystemBackend, PayloadStore, PoolConfig};
//! use skyquery_router::PayloadProcessor;
//!
//! let db = Database::open_or_init(path, PoolConfig::default(), true).await?;
//! let payloads = Arc::new(PayloadStore::new(FilesystemBackend::new(storage_dir)));
//! let processor = PayloadProcessor::cloud_with_satellite_fallback(&db, payloads);
//!
//! let outcome = processor.process(&payload).await;
//! println!("{}", outcome.response.to_json_line());
//! ```

pub mod pipeline;
pub mod resolvers;
pub mod router;

// Re-export core types
pub use skyquery_core::*;

pub use pipeline::{parse_request, PayloadProcessor, ProcessOutcome};
pub use resolvers::{CloudResolver, SatelliteResolver};
pub use router::ResolutionRouter;
