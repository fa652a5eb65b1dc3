//! Error types shared by the store, classifier and roadmap code.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An identifier did not resolve to a record.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A sprint whose end date precedes its start date.
    #[error("invalid range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The database file was written by a newer version of the tool.
    #[error("unsupported schema version {found} (this build supports up to {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn task_not_found(id: &str) -> Self {
        Error::NotFound { kind: "task", id: id.to_string() }
    }

    pub fn sprint_not_found(id: &str) -> Self {
        Error::NotFound { kind: "sprint", id: id.to_string() }
    }
}
