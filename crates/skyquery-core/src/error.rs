//! Error types for skyquery.

use thiserror::Error;

/// Result type alias using skyquery's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for skyquery operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite access failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing a request payload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload or listing was not valid JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A query ran cleanly but matched no records
    #[error("No data found for location {location} between {start_time} and {end_time}")]
    NoMatch {
        location: String,
        start_time: String,
        end_time: String,
    },

    /// A stored request already exists under this id
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Bad or missing environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Build a `NoMatch` from an optional filter, rendering absent fields as `None`.
    pub fn no_match(
        location: Option<&str>,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Self {
        let show = |v: Option<&str>| v.unwrap_or("None").to_string();
        Error::NoMatch {
            location: show(location),
            start_time: show(start_time),
            end_time: show(end_time),
        }
    }
}
