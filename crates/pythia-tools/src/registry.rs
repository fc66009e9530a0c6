//! Registry - tool catalog and dispatch
//!
//! The catalog is a closed set of retrieval operations, each an enum variant
//! mapped to a typed handler at compile time. Unknown names are rejected with
//! [`Error::UnknownTool`]; there is no dynamic lookup.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use pythia_index::chunk::reassemble;
use pythia_index::{IndexClient, SearchHit};
use pythia_llm::ToolDefinition;

use crate::error::{Error, Result};
use crate::spec::{ParamSpec, ParamType, ToolSpec};

/// Largest accepted `top_k`
const MAX_TOP_K: usize = 10;

/// The closed set of tool identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Keyword/topic search over indexed chunks
    SearchDocuments,
    /// Full-document reconstruction from its chunk set
    GetDocument,
    /// Dual-topic search reporting the overlap of two result sets
    SearchRelatedTopics,
    /// Corpus enumeration; needs no query
    ListDocuments,
}

impl ToolKind {
    /// Every tool in catalog order
    pub const ALL: [ToolKind; 4] = [
        ToolKind::SearchDocuments,
        ToolKind::GetDocument,
        ToolKind::SearchRelatedTopics,
        ToolKind::ListDocuments,
    ];

    /// Resolve a tool name, or `None` for anything outside the catalog
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "search_documents" => Some(Self::SearchDocuments),
            "get_document" => Some(Self::GetDocument),
            "search_related_topics" => Some(Self::SearchRelatedTopics),
            "list_documents" => Some(Self::ListDocuments),
            _ => None,
        }
    }

    /// The tool's registered name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchDocuments => "search_documents",
            Self::GetDocument => "get_document",
            Self::SearchRelatedTopics => "search_related_topics",
            Self::ListDocuments => "list_documents",
        }
    }

    /// The tool's parameter schema
    #[must_use]
    pub fn spec(&self) -> ToolSpec {
        match self {
            Self::SearchDocuments => ToolSpec::new(
                self.name(),
                "Search indexed documents by topic or keyword. Returns the most \
                 relevant text passages with relevance scores and source documents.",
                vec![
                    ParamSpec::required(
                        "query",
                        ParamType::String,
                        "Topic or keyword to search for (e.g. 'vacation', 'remote work')",
                    ),
                    ParamSpec::optional(
                        "top_k",
                        ParamType::Integer,
                        "Number of passages to return (1-10, default 3)",
                    ),
                ],
            ),
            Self::GetDocument => ToolSpec::new(
                self.name(),
                "Read one document in full, assembled from all of its indexed \
                 passages. Use when a search result needs complete context.",
                vec![ParamSpec::required(
                    "document_id",
                    ParamType::String,
                    "Identifier of the document to read",
                )],
            ),
            Self::SearchRelatedTopics => ToolSpec::new(
                self.name(),
                "Search two topics independently and report which documents \
                 cover both. Use to understand connections between topics.",
                vec![
                    ParamSpec::required("topic_a", ParamType::String, "First topic"),
                    ParamSpec::required("topic_b", ParamType::String, "Second topic"),
                ],
            ),
            Self::ListDocuments => ToolSpec::new(
                self.name(),
                "List every document in the knowledge base with its title. Use \
                 to discover what information is available.",
                vec![],
            ),
        }
    }
}

/// Configuration for the tool registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Index namespace all tools operate in
    pub namespace: String,
    /// Default `top_k` when the model omits it
    pub default_top_k: usize,
    /// Per-call timeout for backing index calls
    pub call_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            default_top_k: 3,
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    /// Create a configuration for the given namespace
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Set the default result count
    #[must_use]
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Fixed catalog of retrieval tools over one index namespace.
///
/// Read-only after construction; shared across concurrent query runs.
pub struct ToolRegistry {
    index: Arc<dyn IndexClient>,
    config: RegistryConfig,
}

impl ToolRegistry {
    /// Create a registry over the given index client
    #[must_use]
    pub fn new(index: Arc<dyn IndexClient>, config: RegistryConfig) -> Self {
        for kind in ToolKind::ALL {
            debug!(tool = kind.name(), "Registering tool");
        }
        Self { index, config }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// All tool schemas, in catalog order
    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        ToolKind::ALL.iter().map(ToolKind::spec).collect()
    }

    /// Tool declarations in the completion backend's format
    #[must_use]
    pub fn to_llm_tools(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.iter().map(|k| k.spec().to_definition()).collect()
    }

    /// Check if a tool name is in the catalog
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        ToolKind::from_name(name).is_some()
    }

    /// Validate `arguments` against the named tool's schema and execute it.
    ///
    /// The result is always a formatted text block ready to feed back into
    /// the conversation.
    pub async fn dispatch(&self, name: &str, arguments: &serde_json::Value) -> Result<String> {
        let kind = ToolKind::from_name(name).ok_or_else(|| {
            warn!(tool = name, "Unknown tool requested");
            Error::UnknownTool(name.to_string())
        })?;

        kind.spec()
            .validate(arguments)
            .map_err(Error::InvalidArguments)?;

        info!(tool = kind.name(), args = %arguments, "Dispatching tool");

        match kind {
            ToolKind::SearchDocuments => self.search_documents(arguments).await,
            ToolKind::GetDocument => self.get_document(arguments).await,
            ToolKind::SearchRelatedTopics => self.search_related_topics(arguments).await,
            ToolKind::ListDocuments => self.list_documents().await,
        }
    }

    async fn search_documents(&self, arguments: &serde_json::Value) -> Result<String> {
        let query = str_arg(arguments, "query");
        let top_k = arguments
            .get("top_k")
            .and_then(serde_json::Value::as_u64)
            .map(|n| (n as usize).clamp(1, MAX_TOP_K))
            .unwrap_or(self.config.default_top_k);

        let hits = self.search_with_timeout(query, top_k).await?;
        Ok(format_hits(query, &hits))
    }

    async fn get_document(&self, arguments: &serde_json::Value) -> Result<String> {
        let document_id = str_arg(arguments, "document_id");

        let call = self.index.document_chunks(document_id, &self.config.namespace);
        let chunks = match timeout(self.config.call_timeout, call).await {
            Ok(Ok(chunks)) => chunks,
            Ok(Err(pythia_index::Error::DocumentNotFound(_))) => {
                // Missing document is an answer for the model, not a failure.
                return Ok(format!("Document '{}' not found in the index.", document_id));
            }
            Ok(Err(e)) => return Err(Error::Upstream(e.to_string())),
            Err(_) => return Err(Error::Timeout(self.config.call_timeout.as_millis() as u64)),
        };

        let text = reassemble(&chunks);
        Ok(format!(
            "Document: {} ({} passages)\n\n{}",
            document_id,
            chunks.len(),
            text
        ))
    }

    async fn search_related_topics(&self, arguments: &serde_json::Value) -> Result<String> {
        let topic_a = str_arg(arguments, "topic_a");
        let topic_b = str_arg(arguments, "topic_b");

        let hits_a = self
            .search_with_timeout(topic_a, self.config.default_top_k)
            .await?;
        let hits_b = self
            .search_with_timeout(topic_b, self.config.default_top_k)
            .await?;

        let shared: Vec<&SearchHit> = hits_a
            .iter()
            .filter(|a| hits_b.iter().any(|b| b.document_id == a.document_id))
            .collect();

        let mut out = String::new();
        if shared.is_empty() {
            out.push_str(&format!(
                "No documents cover both '{}' and '{}'.",
                topic_a, topic_b
            ));
        } else {
            out.push_str(&format!(
                "Documents covering both '{}' and '{}':\n",
                topic_a, topic_b
            ));
            for hit in &shared {
                let score_b = hits_b
                    .iter()
                    .find(|b| b.document_id == hit.document_id)
                    .map(|b| b.score)
                    .unwrap_or(0.0);
                out.push_str(&format!(
                    "- {} ({}: {:.2}, {}: {:.2})\n",
                    hit.document_id, topic_a, hit.score, topic_b, score_b
                ));
            }
        }

        out.push_str(&format!("\nResults for '{}':\n", topic_a));
        out.push_str(&format_hits(topic_a, &hits_a));
        out.push_str(&format!("\n\nResults for '{}':\n", topic_b));
        out.push_str(&format_hits(topic_b, &hits_b));
        Ok(out)
    }

    async fn list_documents(&self) -> Result<String> {
        let entries = self
            .with_timeout(self.index.list_documents(&self.config.namespace))
            .await?;

        if entries.is_empty() {
            return Ok("No documents are indexed.".to_string());
        }

        let listing = entries
            .iter()
            .map(|e| format!("- {} — {}", e.document_id, e.title))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "Available documents:\n{}\n\nUse search_documents to find specific content.",
            listing
        ))
    }

    async fn search_with_timeout(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.with_timeout(self.index.search(query, top_k, &self.config.namespace))
            .await
    }

    async fn with_timeout<T>(
        &self,
        call: impl std::future::Future<Output = pythia_index::Result<T>>,
    ) -> Result<T> {
        match timeout(self.config.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::Upstream(e.to_string())),
            Err(_) => Err(Error::Timeout(self.config.call_timeout.as_millis() as u64)),
        }
    }
}

/// Extract a validated string argument. Validation has already guaranteed
/// presence and type, so the fallback is unreachable in practice.
fn str_arg<'a>(arguments: &'a serde_json::Value, name: &str) -> &'a str {
    arguments.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

/// Render ranked hits as the text block fed back to the model.
fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No documents found for '{}'.", query);
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "Result {} (relevance: {:.2}, source: {}):\n{}",
                i + 1,
                hit.score,
                hit.document_id,
                hit.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
