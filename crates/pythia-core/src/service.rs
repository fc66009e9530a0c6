//! Query service - the caller-facing surface
//!
//! Submit a question and get a query id back immediately; poll the id for
//! live status and the answer; cancel a running query. Each submission runs
//! as an independent task, so distinct queries execute concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::orchestrator::{Orchestrator, QueryInput};
use crate::record::{ExecutionRecord, RecordStore};

/// Caller-facing query surface
pub struct QueryService {
    orchestrator: Arc<Orchestrator>,
    records: Arc<RecordStore>,
    /// Cancellation tokens of in-flight runs
    active: Arc<DashMap<Uuid, CancellationToken>>,
}

impl QueryService {
    /// Create a new service
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, records: Arc<RecordStore>) -> Self {
        Self {
            orchestrator,
            records,
            active: Arc::new(DashMap::new()),
        }
    }

    /// Start a query run and return its id immediately.
    pub async fn submit(&self, input: QueryInput) -> Uuid {
        let query_id = input.query_id;
        let handle = self.records.create(query_id).await;
        let token = CancellationToken::new();
        self.active.insert(query_id, token.clone());

        let orchestrator = Arc::clone(&self.orchestrator);
        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            let _ = orchestrator.run(input, handle, token).await;
            active.remove(&query_id);
        });

        info!(query_id = %query_id, "Query submitted");
        query_id
    }

    /// Snapshot the record of a query: status, answer, iterations, tool calls.
    pub async fn poll(&self, query_id: Uuid) -> Result<ExecutionRecord> {
        self.records.read(query_id).await
    }

    /// Request cancellation of a running query.
    ///
    /// Observed by the run at its next iteration boundary. Returns whether a
    /// running query with that id existed.
    pub fn cancel(&self, query_id: Uuid) -> bool {
        match self.active.get(&query_id) {
            Some(token) => {
                debug!(query_id = %query_id, "Cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop a query's record. Returns whether it existed.
    pub async fn clear(&self, query_id: Uuid) -> bool {
        self.records.clear(query_id).await
    }

    /// Number of in-flight runs
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
