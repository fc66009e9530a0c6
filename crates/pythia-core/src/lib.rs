//! Pythia Core - Query Orchestration Engine
//!
//! This crate drives a bounded, stateful tool-calling conversation between a
//! completion backend and the retrieval tool registry:
//! - Orchestrator: the planning/tool-dispatch loop with an iteration ceiling
//! - Record: append-only per-query audit records with live status
//! - Memory: bounded-window conversation sessions
//! - Service: the submit / poll / cancel surface for callers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod planner;
pub mod record;
pub mod service;

pub use error::{Error, Result};
pub use memory::{MemorySessionStore, SessionContext, SessionStore};
pub use orchestrator::{Orchestrator, OrchestratorConfig, QueryInput};
pub use planner::{PlanResponse, Planner, PlannerConfig, DEFAULT_SYSTEM_PROMPT};
pub use record::{
    ConversationTurn, ExecutionRecord, QueryStatus, RecordHandle, RecordStore, ToolInvocation,
};
pub use service::QueryService;
