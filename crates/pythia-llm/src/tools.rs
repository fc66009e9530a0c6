//! Tool types for completion-side function calling
//!
//! This module defines the declaration and request types for tools the
//! completion backend may ask to have executed on its behalf.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tool declaration offered to the completion backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call requested by the completion backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments as JSON string
    pub arguments: String,
}

impl ToolCall {
    /// Parse arguments as a typed value
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.arguments).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// Parse arguments as a JSON value, falling back to an empty object when
    /// the backend sent no arguments at all.
    pub fn arguments_value(&self) -> Result<serde_json::Value> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.arguments).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Tool choice strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide
    #[default]
    Auto,
    /// Don't use tools
    None,
    /// Force some tool to be used
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new(
            "search_documents",
            "Search indexed documents by topic or keyword",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"}
                },
                "required": ["query"]
            }),
        );

        assert_eq!(tool.name, "search_documents");
        assert!(tool.parameters["required"][0] == "query");
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        let tool_call = ToolCall {
            id: "call_123".to_string(),
            name: "search_documents".to_string(),
            arguments: r#"{"query": "vacation"}"#.to_string(),
        };

        #[derive(Deserialize)]
        struct Args {
            query: String,
        }

        let args: Args = tool_call.parse_arguments().unwrap();
        assert_eq!(args.query, "vacation");
    }

    #[test]
    fn test_tool_call_empty_arguments() {
        let tool_call = ToolCall {
            id: "call_1".to_string(),
            name: "list_documents".to_string(),
            arguments: String::new(),
        };

        let value = tool_call.arguments_value().unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_tool_choice_default() {
        let choice = ToolChoice::default();
        assert!(matches!(choice, ToolChoice::Auto));
    }
}
