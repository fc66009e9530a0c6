//! Error types for pythia-tools

use thiserror::Error;

/// Tool dispatch error type
#[derive(Debug, Error)]
pub enum Error {
    /// Requested tool is not in the catalog
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not satisfy the tool's parameter schema
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Backing index call failed
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Backing index call exceeded the per-call timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
