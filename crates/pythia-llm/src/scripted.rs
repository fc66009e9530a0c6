//! Scripted completion client for testing
//!
//! Returns queued responses in order, so tests can script an exact sequence
//! of tool-request and final-answer turns.

use crate::client::CompletionClient;
use crate::completion::{
    CompletionRequest, CompletionResponse, ToolCompletionRequest, ToolCompletionResponse,
};
use crate::error::{Error, Result};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted step: either a canned response or an injected error.
enum Step {
    Respond(ToolCompletionResponse),
    Fail(String),
}

/// A scripted completion client that replays queued responses.
///
/// When the queue drains it returns a default final answer, unless
/// [`ScriptedClient::repeat_forever`] installed a response to replay on every
/// further call (the "model that never stops asking for tools" case).
pub struct ScriptedClient {
    steps: Arc<Mutex<VecDeque<Step>>>,
    /// Response replayed on every call once the queue drains, if set.
    repeat_last: Arc<Mutex<Option<ToolCompletionResponse>>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    /// Create a new scripted client with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Arc::new(Mutex::new(VecDeque::new())),
            repeat_last: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a response.
    pub fn push_response(&self, response: ToolCompletionResponse) {
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Step::Respond(response));
    }

    /// Queue an error, simulating an unreachable backend for one call.
    pub fn push_error(&self, message: impl Into<String>) {
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Step::Fail(message.into()));
    }

    /// Replay `response` on every call after the queue drains.
    pub fn repeat_forever(&self, response: ToolCompletionResponse) {
        *self.repeat_last.lock().unwrap_or_else(|e| e.into_inner()) = Some(response);
    }

    /// Number of steps still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            content: "scripted response".to_string(),
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn complete_with_tools(
        &self,
        _request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse> {
        let step = self
            .steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match step {
            Some(Step::Respond(resp)) => Ok(resp),
            Some(Step::Fail(msg)) => Err(Error::Api(msg)),
            None => {
                let repeated = self
                    .repeat_last
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone();
                Ok(repeated.unwrap_or_else(|| {
                    ToolCompletionResponse::final_answer("scripted response")
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolCall;

    #[tokio::test]
    async fn test_scripted_order() {
        let client = ScriptedClient::new();
        client.push_response(ToolCompletionResponse::tool_requests(vec![ToolCall {
            id: "call_1".to_string(),
            name: "search_documents".to_string(),
            arguments: r#"{"query": "vacation"}"#.to_string(),
        }]));
        client.push_response(ToolCompletionResponse::final_answer("done"));

        let request = ToolCompletionRequest::new(CompletionRequest::new(), vec![]);
        let first = client.complete_with_tools(request.clone()).await.unwrap();
        assert!(first.has_tool_calls());

        let second = client.complete_with_tools(request).await.unwrap();
        assert_eq!(second.content.as_deref(), Some("done"));
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let client = ScriptedClient::new();
        client.push_error("backend unreachable");

        let request = ToolCompletionRequest::new(CompletionRequest::new(), vec![]);
        let err = client.complete_with_tools(request).await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }

    #[tokio::test]
    async fn test_repeat_forever() {
        let client = ScriptedClient::new();
        client.repeat_forever(ToolCompletionResponse::tool_requests(vec![ToolCall {
            id: "call_x".to_string(),
            name: "list_documents".to_string(),
            arguments: "{}".to_string(),
        }]));

        for _ in 0..3 {
            let request = ToolCompletionRequest::new(CompletionRequest::new(), vec![]);
            let resp = client.complete_with_tools(request).await.unwrap();
            assert!(resp.has_tool_calls());
        }
    }
}
