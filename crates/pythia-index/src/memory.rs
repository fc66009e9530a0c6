//! In-memory retrieval index.
//!
//! Namespaced document and chunk storage behind `tokio::sync::RwLock` maps,
//! with deterministic lexical scoring. Serves as the index backend for tests
//! and small local corpora; hosted backends implement [`IndexClient`]
//! elsewhere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::chunk::{split, Chunk, ChunkerConfig};
use crate::client::{DocumentEntry, IndexClient, SearchHit};
use crate::error::{Error, Result};

struct StoredDocument {
    title: String,
    content_hash: String,
    chunks: Vec<Chunk>,
}

#[derive(Default)]
struct Namespace {
    documents: HashMap<String, StoredDocument>,
}

/// In-memory, namespaced retrieval index.
///
/// Documents are ingested through the chunker; re-ingesting a document id
/// atomically replaces its whole chunk set. Safe for concurrent read access
/// from multiple query runs.
#[derive(Default)]
pub struct MemoryIndex {
    namespaces: Arc<RwLock<HashMap<String, Namespace>>>,
}

impl MemoryIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk `text` and store it under `document_id`, replacing any previous
    /// chunk set for that document.
    ///
    /// Returns the number of chunks stored. Unchanged content (same text and
    /// chunker parameters) is skipped and the existing chunk count returned.
    pub async fn ingest(
        &self,
        namespace: &str,
        document_id: &str,
        title: &str,
        text: &str,
        config: &ChunkerConfig,
    ) -> Result<usize> {
        let content_hash = ingest_hash(text, config);

        let mut namespaces = self.namespaces.write().await;
        let ns = namespaces.entry(namespace.to_string()).or_default();

        if let Some(existing) = ns.documents.get(document_id) {
            if existing.content_hash == content_hash {
                debug!(document_id, namespace, "content unchanged, skipping re-ingest");
                return Ok(existing.chunks.len());
            }
        }

        let chunks = split(document_id, text, config)?;
        let count = chunks.len();
        ns.documents.insert(
            document_id.to_string(),
            StoredDocument {
                title: title.to_string(),
                content_hash,
                chunks,
            },
        );

        info!(document_id, namespace, chunks = count, "document ingested");
        Ok(count)
    }

    /// Remove a document and its chunks. Returns whether it existed.
    pub async fn remove(&self, namespace: &str, document_id: &str) -> bool {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .get_mut(namespace)
            .map(|ns| ns.documents.remove(document_id).is_some())
            .unwrap_or(false)
    }

    /// Number of documents stored in `namespace`
    pub async fn document_count(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(namespace)
            .map(|ns| ns.documents.len())
            .unwrap_or(0)
    }

    /// Number of chunks stored in `namespace`
    pub async fn chunk_count(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(namespace)
            .map(|ns| ns.documents.values().map(|d| d.chunks.len()).sum())
            .unwrap_or(0)
    }
}

fn ingest_hash(text: &str, config: &ChunkerConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(config.max_chars.to_le_bytes());
    hasher.update(config.overlap_chars.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lowercased alphanumeric terms of `text`
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of query terms present in the chunk, in `[0.0, 1.0]`.
fn score_chunk(query_terms: &HashSet<String>, chunk_terms: &HashSet<String>) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let matched = query_terms.intersection(chunk_terms).count();
    matched as f32 / query_terms.len() as f32
}

#[async_trait::async_trait]
impl IndexClient for MemoryIndex {
    async fn search(&self, query: &str, top_k: usize, namespace: &str) -> Result<Vec<SearchHit>> {
        let query_terms = terms(query);
        let namespaces = self.namespaces.read().await;
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = Vec::new();
        for (document_id, doc) in &ns.documents {
            for chunk in &doc.chunks {
                let score = score_chunk(&query_terms, &terms(&chunk.text));
                if score > 0.0 {
                    let mut metadata = HashMap::new();
                    metadata.insert("title".to_string(), doc.title.clone());
                    metadata.insert("ordinal".to_string(), chunk.ordinal.to_string());
                    hits.push(SearchHit {
                        chunk_id: chunk.chunk_id.clone(),
                        document_id: document_id.clone(),
                        score,
                        text: chunk.text.clone(),
                        metadata,
                    });
                }
            }
        }

        // Deterministic ranking: score descending, then chunk id ascending.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn list_documents(&self, namespace: &str) -> Result<Vec<DocumentEntry>> {
        let namespaces = self.namespaces.read().await;
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<DocumentEntry> = ns
            .documents
            .iter()
            .map(|(document_id, doc)| DocumentEntry {
                document_id: document_id.clone(),
                title: doc.title.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(entries)
    }

    async fn document_chunks(&self, document_id: &str, namespace: &str) -> Result<Vec<Chunk>> {
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(namespace)
            .and_then(|ns| ns.documents.get(document_id))
            .map(|doc| doc.chunks.clone())
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))
    }
}
