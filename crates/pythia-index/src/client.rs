//! Retrieval index client trait
//!
//! The retrieval backend (hosted vector index, local store) is consumed
//! through this trait. Implementations must surface transport failures as
//! errors rather than silently empty result sets, so callers can tell
//! "no matches" apart from "backend unavailable".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::error::Result;

/// One ranked retrieval result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matching chunk id
    pub chunk_id: String,
    /// Owning document id
    pub document_id: String,
    /// Relevance score in `[0.0, 1.0]`, higher is more relevant
    pub score: f32,
    /// Chunk text
    pub text: String,
    /// Backend metadata (e.g. document title)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SearchHit {
    /// Document title from metadata, if the backend stored one
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").map(String::as_str)
    }
}

/// A document known to the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Document id
    pub document_id: String,
    /// Human-readable title
    pub title: String,
}

/// Contract a retrieval backend must satisfy.
#[async_trait::async_trait]
pub trait IndexClient: Send + Sync {
    /// Rank stored chunks against `query`, returning at most `top_k` hits
    /// ordered by descending score.
    async fn search(&self, query: &str, top_k: usize, namespace: &str) -> Result<Vec<SearchHit>>;

    /// Enumerate distinct documents in `namespace` with their titles.
    async fn list_documents(&self, namespace: &str) -> Result<Vec<DocumentEntry>>;

    /// All stored chunks of one document, ordered by ordinal.
    ///
    /// Fails with [`crate::Error::DocumentNotFound`] when the document is not
    /// in the namespace.
    async fn document_chunks(&self, document_id: &str, namespace: &str) -> Result<Vec<Chunk>>;
}
