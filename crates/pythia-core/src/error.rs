//! Error types for pythia-core

use thiserror::Error;
use uuid::Uuid;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No execution record for the given query id
    #[error("query not found: {0}")]
    NotFound(Uuid),

    /// Completion backend error
    #[error("completion error: {0}")]
    Completion(#[from] pythia_llm::Error),

    /// Tool dispatch error
    #[error("tool error: {0}")]
    Tool(#[from] pythia_tools::Error),

    /// Retrieval index error
    #[error("index error: {0}")]
    Index(#[from] pythia_index::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
