//! Completion client trait
//!
//! The orchestration layer is written against this trait only; concrete
//! backends (hosted APIs, local inference) live outside this workspace.

use crate::completion::{
    CompletionRequest, CompletionResponse, ToolCompletionRequest, ToolCompletionResponse,
};
use crate::error::Result;

/// Contract a chat-completion backend must satisfy.
///
/// A single blocking-with-timeout call per planning step: conversation in,
/// either a final text answer or a set of tool-call requests out. A response
/// with no tool calls is a final answer.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the client name (for logging)
    fn name(&self) -> &str;

    /// Complete a conversation (text only)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Complete a conversation with tools declared
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse>;
}
