//! Planner - one reasoning step over the completion backend
//!
//! Wraps the completion client with the system prompt, the per-call timeout,
//! and the final-vs-tool-requests interpretation of its responses.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument};

use pythia_llm::{
    CompletionClient, CompletionRequest, Message, ToolCall, ToolChoice, ToolCompletionRequest,
    ToolDefinition,
};

use crate::error::{Error, Result};

/// Default system prompt for the document assistant
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Pythia, an assistant that answers questions from an indexed document \
knowledge base.

## Rules
- Ground every answer in retrieved document content. Use the retrieval tools \
to find it; never answer from general knowledge alone.
- If the knowledge base has no relevant content, say so clearly instead of \
guessing.
- Cite the source documents you relied on.
- Be professional, concise, and clear.
- When a tool call fails, read the failure message and adapt: correct the \
arguments or try a different tool.";

/// Configuration for the planner
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// System prompt seeding every run
    pub system_prompt: String,
    /// Temperature for generation
    pub temperature: Option<f32>,
    /// Maximum tokens per response
    pub max_tokens: Option<u32>,
    /// Per-call timeout for the completion backend
    pub completion_timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: Some(0.7),
            max_tokens: Some(1024),
            completion_timeout: Duration::from_secs(60),
        }
    }
}

impl PlannerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn with_completion_timeout(mut self, completion_timeout: Duration) -> Self {
        self.completion_timeout = completion_timeout;
        self
    }
}

/// Result of one planning step
#[derive(Debug, Clone)]
pub struct PlanResponse {
    /// Text content from the response
    pub content: Option<String>,
    /// Tool calls requested
    pub tool_calls: Vec<ToolCall>,
    /// Whether this is a final answer (no tool calls)
    pub is_final: bool,
}

impl PlanResponse {
    /// Check if there are tool calls
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Planner over one completion client
pub struct Planner {
    client: Arc<dyn CompletionClient>,
    config: PlannerConfig,
}

impl Planner {
    /// Create a new planner
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>, config: PlannerConfig) -> Self {
        Self { client, config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(client: Arc<dyn CompletionClient>) -> Self {
        Self::new(client, PlannerConfig::default())
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a single step with the given conversation and tool catalog.
    ///
    /// `system_prompt` is prepended to the conversation; a call exceeding the
    /// configured timeout fails like an unreachable backend.
    #[instrument(skip(self, messages, tools, system_prompt))]
    pub async fn plan_step(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        system_prompt: &str,
    ) -> Result<PlanResponse> {
        let mut full_messages = vec![Message::system(system_prompt)];
        full_messages.extend(messages.iter().cloned());

        let request = ToolCompletionRequest {
            request: CompletionRequest {
                messages: full_messages,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            },
            tools: tools.to_vec(),
            tool_choice: ToolChoice::Auto,
        };

        debug!(
            client = self.client.name(),
            tool_count = tools.len(),
            "Making completion request"
        );

        let response = match timeout(
            self.config.completion_timeout,
            self.client.complete_with_tools(request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(Error::Completion(e)),
            Err(_) => {
                return Err(Error::Completion(pythia_llm::Error::Timeout(
                    self.config.completion_timeout.as_millis() as u64,
                )))
            }
        };

        let is_final = response.tool_calls.is_empty();
        Ok(PlanResponse {
            content: response.content,
            tool_calls: response.tool_calls,
            is_final,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pythia_llm::{ScriptedClient, ToolCompletionResponse};

    #[test]
    fn test_planner_config_builders() {
        let config = PlannerConfig::new()
            .with_temperature(0.2)
            .with_completion_timeout(Duration::from_secs(5))
            .with_system_prompt("custom");

        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.completion_timeout, Duration::from_secs(5));
        assert_eq!(config.system_prompt, "custom");
    }

    #[tokio::test]
    async fn test_plan_step_final_response() {
        let client = Arc::new(ScriptedClient::new());
        client.push_response(ToolCompletionResponse::final_answer("The answer."));

        let planner = Planner::with_defaults(client);
        let plan = planner
            .plan_step(&[Message::user("question")], &[], DEFAULT_SYSTEM_PROMPT)
            .await
            .unwrap();

        assert!(plan.is_final);
        assert!(!plan.has_tool_calls());
        assert_eq!(plan.content.as_deref(), Some("The answer."));
    }

    #[tokio::test]
    async fn test_plan_step_tool_requests() {
        let client = Arc::new(ScriptedClient::new());
        client.push_response(ToolCompletionResponse::tool_requests(vec![ToolCall {
            id: "call_1".to_string(),
            name: "search_documents".to_string(),
            arguments: r#"{"query": "vacation"}"#.to_string(),
        }]));

        let planner = Planner::with_defaults(client);
        let plan = planner
            .plan_step(&[Message::user("question")], &[], DEFAULT_SYSTEM_PROMPT)
            .await
            .unwrap();

        assert!(!plan.is_final);
        assert_eq!(plan.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn test_plan_step_propagates_backend_error() {
        let client = Arc::new(ScriptedClient::new());
        client.push_error("backend down");

        let planner = Planner::with_defaults(client);
        let err = planner
            .plan_step(&[Message::user("question")], &[], DEFAULT_SYSTEM_PROMPT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Completion(_)));
    }
}
