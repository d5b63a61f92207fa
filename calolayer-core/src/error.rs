//! Error types for calolayer-core.

use thiserror::Error;

/// Result type alias for calolayer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for calolayer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed input: length mismatch, negative counts, bad batch size.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The dataset has no events and the caller asked for at least one.
    #[error("dataset contains no events")]
    EmptyDataset,

    /// Aggregation was cancelled at a batch boundary.
    #[error("aggregation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
