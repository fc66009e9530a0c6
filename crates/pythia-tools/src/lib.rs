//! Pythia Tools - Retrieval Tool Registry
//!
//! This crate provides the fixed catalog of retrieval operations the
//! completion backend may request during a query run:
//! - Spec: ordered, typed parameter schemas for each tool
//! - Registry: name-to-handler dispatch with strict argument validation
//!
//! Every tool maps validated arguments to a formatted text block, because
//! tool output is fed straight back into the model conversation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod registry;
pub mod spec;

pub use error::{Error, Result};
pub use registry::{RegistryConfig, ToolKind, ToolRegistry};
pub use spec::{ParamSpec, ParamType, ToolSpec};
