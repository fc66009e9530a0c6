//! Pythia LLM - Completion Client Abstraction
//!
//! This crate defines the contract Pythia requires from a chat-completion
//! backend:
//! - Message: conversation message types
//! - Tools: tool declarations and tool-call requests
//! - Completion: request/response types with and without tools
//! - Client: the `CompletionClient` trait implemented by concrete backends
//! - Scripted: a queue-backed client for deterministic tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod completion;
pub mod error;
pub mod message;
pub mod scripted;
pub mod tools;

pub use client::CompletionClient;
pub use completion::{
    CompletionRequest, CompletionResponse, ToolCompletionRequest, ToolCompletionResponse,
};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use scripted::ScriptedClient;
pub use tools::{ToolCall, ToolChoice, ToolDefinition};
