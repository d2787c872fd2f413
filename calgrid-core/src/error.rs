//! Error types for calgrid.

use thiserror::Error;

use crate::day_key::DayKey;

/// Errors that can occur in calgrid operations.
#[derive(Error, Debug)]
pub enum CalGridError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No event at row {row} on {day} ({len} events)")]
    RowOutOfRange { day: DayKey, row: usize, len: usize },

    #[error("Invalid event record: {0}")]
    InvalidRecord(String),

    #[error("Loaded {added} events, rejected {rejected} malformed records")]
    PartialLoad { added: usize, rejected: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalGridError {
    /// True for failures of the gateway call itself (transport or server status).
    pub fn is_network(&self) -> bool {
        matches!(self, CalGridError::Network(_) | CalGridError::Rejected { .. })
    }

    /// True when a local check failed and nothing was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, CalGridError::Validation(_))
    }
}

impl From<reqwest::Error> for CalGridError {
    fn from(err: reqwest::Error) -> Self {
        CalGridError::Network(err.to_string())
    }
}

/// Form input problems, reported before anything is sent or stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Must set a title for the event.")]
    MissingTitle,

    #[error("Must set a start date for the event.")]
    MissingStart,

    #[error("Must set an end date for the event.")]
    MissingEnd,

    #[error("The event must end after it starts.")]
    EndNotAfterStart,

    #[error("The event has not been saved yet.")]
    NotSaved,
}

/// Result type alias for calgrid operations.
pub type CalGridResult<T> = Result<T, CalGridError>;
