//! Error types for pythia-llm

use thiserror::Error;

/// Completion client error type
#[derive(Debug, Error)]
pub enum Error {
    /// API error from the backend
    #[error("api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
