//! Error types for pythia-index

use thiserror::Error;

/// Index error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid chunker or index configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfiguration {
        /// Offending field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Backend transport failure.
    ///
    /// Raised instead of an empty result set, so callers can distinguish
    /// "no matches" from "backend unavailable".
    #[error("index backend error: {0}")]
    Backend(String),

    /// Document not present in the index
    #[error("document not found: {0}")]
    DocumentNotFound(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
