//! Execution records - per-query audit and live status.
//!
//! Every query run owns exactly one [`ExecutionRecord`]. The owning run
//! writes through its [`RecordHandle`]; external callers (polling UIs) only
//! ever see point-in-time snapshot copies via [`RecordStore::read`], so a
//! running orchestrator can never corrupt a caller's view mid-iteration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use pythia_llm::Message;

use crate::error::{Error, Result};

/// Default record retention
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// One turn of a query conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationTurn {
    /// System instruction seeding the run
    SystemInstruction {
        /// Instruction text
        content: String,
    },
    /// A user question
    UserQuery {
        /// Question text
        content: String,
    },
    /// Assistant text (interim or final)
    AssistantText {
        /// Assistant text
        content: String,
    },
    /// Result of one tool dispatch, fed back to the model
    ToolResult {
        /// Id of the tool call this answers
        tool_call_id: String,
        /// Tool name
        tool_name: String,
        /// Result (or failure) text
        content: String,
    },
}

impl ConversationTurn {
    /// System instruction turn
    #[must_use]
    pub fn system_instruction(content: impl Into<String>) -> Self {
        Self::SystemInstruction {
            content: content.into(),
        }
    }

    /// User query turn
    #[must_use]
    pub fn user_query(content: impl Into<String>) -> Self {
        Self::UserQuery {
            content: content.into(),
        }
    }

    /// Assistant text turn
    #[must_use]
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::AssistantText {
            content: content.into(),
        }
    }

    /// Tool result turn
    #[must_use]
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        }
    }

    /// Map into the completion backend's message type
    #[must_use]
    pub fn to_message(&self) -> Message {
        match self {
            Self::SystemInstruction { content } => Message::system(content),
            Self::UserQuery { content } => Message::user(content),
            Self::AssistantText { content } => Message::assistant(content),
            Self::ToolResult {
                tool_call_id,
                tool_name,
                content,
            } => Message::tool_response_named(tool_call_id, tool_name, content),
        }
    }
}

/// One tool call made during a run. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name as requested by the model
    pub tool_name: String,
    /// Arguments after JSON parsing (null when unparseable)
    pub arguments: serde_json::Value,
    /// 1-based iteration the call was requested in
    pub iteration: usize,
    /// Formatted result text on success
    pub result_text: Option<String>,
    /// Failure description on error
    pub error: Option<String>,
}

impl ToolInvocation {
    /// Whether the dispatch succeeded
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Terminal and live status of a query run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// Run in progress
    Running,
    /// Run finished with an answer (possibly truncated at the ceiling)
    Completed,
    /// Run failed (backend unreachable or cancelled)
    Failed,
}

/// Append-only audit record of one query run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Query id, unique per run
    pub query_id: Uuid,
    /// Current status
    pub status: QueryStatus,
    /// Conversation turns in order
    pub turns: Vec<ConversationTurn>,
    /// Tool invocations in dispatch order
    pub invocations: Vec<ToolInvocation>,
    /// Completed planning iterations
    pub iteration_count: usize,
    /// Final answer once completed
    pub final_answer: Option<String>,
    /// Failure reason once failed
    pub error: Option<String>,
    /// Whether the run was truncated at the iteration ceiling
    pub ceiling_reached: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl ExecutionRecord {
    fn new(query_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            query_id,
            status: QueryStatus::Running,
            turns: Vec::new(),
            invocations: Vec::new(),
            iteration_count: 0,
            final_answer: None,
            error: None,
            ceiling_reached: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the run has reached a terminal status
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, QueryStatus::Running)
    }
}

/// In-memory store of execution records with TTL-based retention.
///
/// One instance is shared between the query service (reads) and the
/// orchestrator runs (writes through handles); records are cloned out on
/// read.
pub struct RecordStore {
    records: RwLock<HashMap<Uuid, ExecutionRecord>>,
    ttl: Duration,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create a store with the default retention
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a store with a custom retention
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create the record for a new run and return its write handle.
    ///
    /// The handle is the only write surface; it belongs to the owning
    /// orchestrator run and must not be shared.
    pub async fn create(self: &Arc<Self>, query_id: Uuid) -> RecordHandle {
        let mut records = self.records.write().await;
        records.insert(query_id, ExecutionRecord::new(query_id));
        debug!(query_id = %query_id, "Execution record created");
        RecordHandle {
            store: Arc::clone(self),
            query_id,
        }
    }

    /// Snapshot a record. Fails with [`Error::NotFound`] for unknown ids.
    pub async fn read(&self, query_id: Uuid) -> Result<ExecutionRecord> {
        let records = self.records.read().await;
        records
            .get(&query_id)
            .cloned()
            .ok_or(Error::NotFound(query_id))
    }

    /// Drop a record. Returns whether it existed.
    pub async fn clear(&self, query_id: Uuid) -> bool {
        let mut records = self.records.write().await;
        records.remove(&query_id).is_some()
    }

    /// Number of retained records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Remove terminal records older than the retention TTL. Running records
    /// are never evicted.
    pub async fn cleanup_expired(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.is_terminal() || r.updated_at > cutoff);
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "Expired execution records cleaned up");
        }
        removed
    }

    async fn mutate<F>(&self, query_id: Uuid, f: F)
    where
        F: FnOnce(&mut ExecutionRecord),
    {
        let mut records = self.records.write().await;
        match records.get_mut(&query_id) {
            Some(record) => {
                f(record);
                record.updated_at = Utc::now();
            }
            None => {
                // Cleared mid-run; the run keeps going but has nowhere to write.
                warn!(query_id = %query_id, "Write to missing execution record dropped");
            }
        }
    }
}

/// Write handle owned by exactly one orchestrator run.
#[derive(Clone)]
pub struct RecordHandle {
    store: Arc<RecordStore>,
    query_id: Uuid,
}

impl RecordHandle {
    /// The owning run's query id
    #[must_use]
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Append a conversation turn
    pub async fn append_turn(&self, turn: ConversationTurn) {
        self.store
            .mutate(self.query_id, |r| r.turns.push(turn))
            .await;
    }

    /// Append a tool invocation
    pub async fn append_invocation(&self, invocation: ToolInvocation) {
        self.store
            .mutate(self.query_id, |r| r.invocations.push(invocation))
            .await;
    }

    /// Record the number of completed planning iterations
    pub async fn set_iteration_count(&self, iterations: usize) {
        self.store
            .mutate(self.query_id, |r| r.iteration_count = iterations)
            .await;
    }

    /// Finalize with an answer
    pub async fn finalize_completed(&self, answer: Option<String>, ceiling_reached: bool) {
        self.store
            .mutate(self.query_id, |r| {
                r.status = QueryStatus::Completed;
                r.final_answer = answer;
                r.ceiling_reached = ceiling_reached;
            })
            .await;
    }

    /// Finalize with a failure reason
    pub async fn finalize_failed(&self, reason: impl Into<String>) {
        self.store
            .mutate(self.query_id, |r| {
                r.status = QueryStatus::Failed;
                r.error = Some(reason.into());
            })
            .await;
    }

    /// Snapshot the owned record
    pub async fn snapshot(&self) -> Result<ExecutionRecord> {
        self.store.read(self.query_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_read_clear() {
        let store = Arc::new(RecordStore::new());
        let query_id = Uuid::new_v4();
        let handle = store.create(query_id).await;

        let record = store.read(query_id).await.unwrap();
        assert_eq!(record.status, QueryStatus::Running);
        assert_eq!(record.iteration_count, 0);
        assert!(record.turns.is_empty());

        handle
            .append_turn(ConversationTurn::user_query("What is the vacation policy?"))
            .await;
        handle.set_iteration_count(1).await;
        handle.finalize_completed(Some("answer".to_string()), false).await;

        let record = store.read(query_id).await.unwrap();
        assert_eq!(record.status, QueryStatus::Completed);
        assert_eq!(record.final_answer.as_deref(), Some("answer"));
        assert_eq!(record.turns.len(), 1);

        assert!(store.clear(query_id).await);
        assert!(matches!(
            store.read(query_id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_unknown_is_not_found() {
        let store = Arc::new(RecordStore::new());
        let err = store.read(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated() {
        let store = Arc::new(RecordStore::new());
        let query_id = Uuid::new_v4();
        let handle = store.create(query_id).await;

        let snapshot = store.read(query_id).await.unwrap();
        handle
            .append_turn(ConversationTurn::assistant_text("later"))
            .await;

        // The earlier snapshot does not see subsequent writes.
        assert!(snapshot.turns.is_empty());
        assert_eq!(store.read(query_id).await.unwrap().turns.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_spares_running_records() {
        let store = Arc::new(RecordStore::with_ttl(Duration::from_secs(0)));
        let running_id = Uuid::new_v4();
        let done_id = Uuid::new_v4();
        store.create(running_id).await;
        let done = store.create(done_id).await;
        done.finalize_completed(Some("done".to_string()), false).await;

        // Zero TTL: terminal records are expired immediately, running ones kept.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = store.cleanup_expired().await;
        assert_eq!(removed, 1);
        assert!(store.read(running_id).await.is_ok());
        assert!(store.read(done_id).await.is_err());
    }

    #[tokio::test]
    async fn test_turn_to_message_roles() {
        use pythia_llm::MessageRole;

        let turns = vec![
            ConversationTurn::system_instruction("sys"),
            ConversationTurn::user_query("q"),
            ConversationTurn::assistant_text("a"),
            ConversationTurn::tool_result("call_1", "search_documents", "result"),
        ];
        let roles: Vec<MessageRole> = turns.iter().map(|t| t.to_message().role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool
            ]
        );
    }
}
