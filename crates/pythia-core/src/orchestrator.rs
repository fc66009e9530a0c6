//! Orchestrator - the bounded query execution loop
//!
//! Drives a conversation with the completion backend: each iteration plans
//! one step, dispatches any requested retrieval tools in the order they were
//! listed, feeds the results back, and repeats until the backend produces a
//! final answer or the iteration ceiling is hit. Iterations within one run
//! are strictly serial so conversation ordering stays deterministic; distinct
//! queries run concurrently and share only the read-only registry.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pythia_llm::{CompletionClient, Message, ToolCall};
use pythia_tools::ToolRegistry;

use crate::error::Result;
use crate::memory::{MemorySessionStore, SessionContext, SessionStore};
use crate::planner::{Planner, PlannerConfig};
use crate::record::{ConversationTurn, ExecutionRecord, RecordHandle, ToolInvocation};

/// Answer used when the ceiling is hit before any assistant text appeared
const CEILING_FALLBACK_ANSWER: &str =
    "I reached the iteration limit before finishing. Please try a more specific question.";

/// Input for one query run
#[derive(Debug, Clone)]
pub struct QueryInput {
    /// Query id, unique per run
    pub query_id: Uuid,
    /// The user's question
    pub question: String,
    /// Session to load prior turns from and remember this exchange in
    pub session_key: Option<String>,
}

impl QueryInput {
    /// Create an input with a fresh query id
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            question: question.into(),
            session_key: None,
        }
    }

    /// Attach a session key
    #[must_use]
    pub fn with_session(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Iteration ceiling per run
    pub max_iterations: usize,
    /// Prior session turns carried into a run (most recent kept)
    pub history_window: usize,
    /// Planner configuration
    pub planner_config: PlannerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            history_window: 10,
            planner_config: PlannerConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration ceiling
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the session history window
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Set the planner configuration
    #[must_use]
    pub fn with_planner_config(mut self, config: PlannerConfig) -> Self {
        self.planner_config = config;
        self
    }
}

/// Main orchestrator coordinating one query run at a time per call
pub struct Orchestrator {
    planner: Planner,
    registry: Arc<ToolRegistry>,
    sessions: Arc<dyn SessionStore>,
    config: OrchestratorConfig,
    /// System instruction: behavioral guidance plus the tool capability list
    system_prompt: String,
}

impl Orchestrator {
    /// Create a new orchestrator
    #[must_use]
    pub fn new(
        client: Arc<dyn CompletionClient>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let system_prompt = compose_system_prompt(&config.planner_config, &registry);
        let planner = Planner::new(client, config.planner_config.clone());
        Self {
            planner,
            registry,
            sessions: Arc::new(MemorySessionStore::new()),
            config,
            system_prompt,
        }
    }

    /// Set the session store
    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Execute one query run to a terminal state.
    ///
    /// Writes the audit trail through `handle` as it goes and returns the
    /// final record snapshot. Cancellation is observed at iteration
    /// boundaries, never mid-call.
    pub async fn run(
        &self,
        input: QueryInput,
        handle: RecordHandle,
        cancel: CancellationToken,
    ) -> Result<ExecutionRecord> {
        let query_id = input.query_id;
        info!(query_id = %query_id, "Starting query run");

        handle
            .append_turn(ConversationTurn::system_instruction(&self.system_prompt))
            .await;

        let mut messages: Vec<Message> = Vec::new();
        if let Some(session_key) = &input.session_key {
            match self.sessions.get(session_key).await {
                Ok(Some(session)) => {
                    for turn in session.window(self.config.history_window) {
                        handle.append_turn(turn.clone()).await;
                        messages.push(turn.to_message());
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(query_id = %query_id, error = %e, "Session load failed, continuing without history");
                }
            }
        }

        handle
            .append_turn(ConversationTurn::user_query(&input.question))
            .await;
        messages.push(Message::user(&input.question));

        let tools = self.registry.to_llm_tools();
        let mut iteration = 0usize;
        let mut last_assistant_text: Option<String> = None;

        while iteration < self.config.max_iterations {
            if cancel.is_cancelled() {
                info!(query_id = %query_id, iterations = iteration, "Run cancelled by caller");
                handle.finalize_failed("cancelled by caller").await;
                return handle.snapshot().await;
            }

            iteration += 1;
            handle.set_iteration_count(iteration).await;
            debug!(query_id = %query_id, iteration, "Planning step");

            let plan = match self
                .planner
                .plan_step(&messages, &tools, &self.system_prompt)
                .await
            {
                Ok(plan) => plan,
                Err(e) => {
                    error!(query_id = %query_id, error = %e, "Planning failed");
                    handle
                        .finalize_failed(format!("completion backend unavailable: {}", e))
                        .await;
                    return handle.snapshot().await;
                }
            };

            if plan.is_final {
                let answer = plan.content.unwrap_or_default();
                handle
                    .append_turn(ConversationTurn::assistant_text(&answer))
                    .await;
                handle.finalize_completed(Some(answer.clone()), false).await;
                self.remember(&input, &answer).await;
                info!(query_id = %query_id, iterations = iteration, "Run completed");
                return handle.snapshot().await;
            }

            // Interim assistant text stays part of the audit trail and is the
            // best available partial answer if the ceiling interrupts later.
            if let Some(content) = plan.content.as_deref().filter(|c| !c.is_empty()) {
                handle
                    .append_turn(ConversationTurn::assistant_text(content))
                    .await;
                last_assistant_text = Some(content.to_string());
            }
            messages.push(Message::assistant_with_tool_calls(
                plan.content.clone().unwrap_or_default(),
                plan.tool_calls.clone(),
            ));

            // Dispatch strictly in the order the model listed the calls. A
            // failed call is reported back into the conversation instead of
            // ending the run, so the model can adapt.
            for call in &plan.tool_calls {
                let (arguments, outcome) = self.dispatch_call(call).await;
                let (result_text, dispatch_error, feedback) = match outcome {
                    Ok(text) => (Some(text.clone()), None, text),
                    Err(e) => {
                        let reason = e.to_string();
                        warn!(
                            query_id = %query_id,
                            tool = %call.name,
                            error = %reason,
                            "Tool call failed"
                        );
                        let feedback = format!("Tool '{}' failed: {}", call.name, reason);
                        (None, Some(reason), feedback)
                    }
                };

                handle
                    .append_invocation(ToolInvocation {
                        tool_name: call.name.clone(),
                        arguments,
                        iteration,
                        result_text,
                        error: dispatch_error,
                    })
                    .await;
                handle
                    .append_turn(ConversationTurn::tool_result(&call.id, &call.name, &feedback))
                    .await;
                messages.push(Message::tool_response_named(&call.id, &call.name, feedback));
            }
        }

        // Ceiling exhausted without a final answer: graceful truncation, not
        // a failure.
        warn!(query_id = %query_id, iterations = iteration, "Iteration ceiling reached");
        let answer =
            last_assistant_text.unwrap_or_else(|| CEILING_FALLBACK_ANSWER.to_string());
        handle.finalize_completed(Some(answer.clone()), true).await;
        self.remember(&input, &answer).await;
        handle.snapshot().await
    }

    /// Parse arguments and dispatch one tool call.
    ///
    /// Unparseable argument JSON is an invalid-arguments failure, recorded
    /// like any other dispatch error.
    async fn dispatch_call(
        &self,
        call: &ToolCall,
    ) -> (serde_json::Value, pythia_tools::Result<String>) {
        let arguments = match call.arguments_value() {
            Ok(value) => value,
            Err(e) => {
                return (
                    serde_json::Value::Null,
                    Err(pythia_tools::Error::InvalidArguments(format!(
                        "arguments are not valid JSON: {}",
                        e
                    ))),
                );
            }
        };
        let outcome = self.registry.dispatch(&call.name, &arguments).await;
        (arguments, outcome)
    }

    /// Persist the completed exchange into the caller's session, best effort.
    async fn remember(&self, input: &QueryInput, answer: &str) {
        let Some(session_key) = &input.session_key else {
            return;
        };
        let mut session = match self.sessions.get(session_key).await {
            Ok(Some(session)) => session,
            Ok(None) => SessionContext::new(session_key.clone()),
            Err(e) => {
                warn!(session_key = %session_key, error = %e, "Session load failed, exchange not remembered");
                return;
            }
        };
        session.add_user_query(&input.question);
        session.add_assistant_text(answer);
        if let Err(e) = self.sessions.save(&session).await {
            warn!(session_key = %session_key, error = %e, "Session save failed");
        }
    }
}

/// Compose the system instruction: behavioral guidance plus the capability
/// list drawn from the registry catalog.
fn compose_system_prompt(config: &PlannerConfig, registry: &ToolRegistry) -> String {
    let mut prompt = config.system_prompt.clone();
    prompt.push_str("\n\n## Tools\n");
    for spec in registry.specs() {
        prompt.push_str(&format!("- {}: {}\n", spec.name, spec.description));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_input_builder() {
        let input = QueryInput::new("What is the vacation policy?").with_session("user:alice");
        assert_eq!(input.question, "What is the vacation policy?");
        assert_eq!(input.session_key.as_deref(), Some("user:alice"));
    }

    #[test]
    fn test_orchestrator_config_builders() {
        let config = OrchestratorConfig::new()
            .with_max_iterations(3)
            .with_history_window(4);
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.history_window, 4);
    }

    #[test]
    fn test_distinct_query_ids() {
        let a = QueryInput::new("q");
        let b = QueryInput::new("q");
        assert_ne!(a.query_id, b.query_id);
    }
}
