//! # skyquery-core
//!
//! Core types, traits, and abstractions for skyquery.
//!
//! This crate provides the data model (records, request and response
//! envelopes), the shared error type, and the trait seams the storage and
//! routing crates implement.

pub mod defaults;
pub mod error;
pub mod labels;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use labels::{label_set, LabelPicker, SeededPicker, ThreadRngPicker};
pub use models::*;
pub use traits::*;
