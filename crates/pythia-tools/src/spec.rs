//! Tool parameter schemas.
//!
//! Each tool declares an ordered list of typed parameters. The list is the
//! validation contract for incoming arguments and converts to the JSON-schema
//! form the completion backend expects.

use serde::{Deserialize, Serialize};

use pythia_llm::ToolDefinition;

/// Parameter value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// JSON string
    String,
    /// JSON integer (floats are rejected)
    Integer,
}

impl ParamType {
    /// JSON-schema type name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Value type
    pub ty: ParamType,
    /// Whether the parameter must be present
    pub required: bool,
    /// Description shown to the completion backend
    pub description: String,
}

impl ParamSpec {
    /// Declare a required parameter
    #[must_use]
    pub fn required(name: &str, ty: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
            description: description.to_string(),
        }
    }

    /// Declare an optional parameter
    #[must_use]
    pub fn optional(name: &str, ty: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
            description: description.to_string(),
        }
    }
}

/// Schema of one tool: unique name, description, ordered parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Ordered parameter list
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Create a new tool spec
    #[must_use]
    pub fn new(name: &str, description: &str, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params,
        }
    }

    /// Validate an argument object against this schema.
    ///
    /// Any violation (a non-object payload, a missing required parameter, a
    /// wrong-typed value, or an undeclared parameter) is rejected outright;
    /// there is no partial coercion.
    pub fn validate(&self, arguments: &serde_json::Value) -> Result<(), String> {
        let Some(object) = arguments.as_object() else {
            return Err("arguments must be a JSON object".to_string());
        };

        for param in &self.params {
            match object.get(&param.name) {
                Some(value) => {
                    if !param.ty.matches(value) {
                        return Err(format!(
                            "parameter '{}' must be of type {}",
                            param.name,
                            param.ty.as_str()
                        ));
                    }
                }
                None if param.required => {
                    return Err(format!("missing required parameter '{}'", param.name));
                }
                None => {}
            }
        }

        for key in object.keys() {
            if !self.params.iter().any(|p| &p.name == key) {
                return Err(format!("unexpected parameter '{}'", key));
            }
        }

        Ok(())
    }

    /// Convert to the JSON-schema declaration handed to the completion backend.
    #[must_use]
    pub fn to_definition(&self) -> ToolDefinition {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.ty.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(serde_json::Value::String(param.name.clone()));
            }
        }

        ToolDefinition::new(
            &self.name,
            &self.description,
            serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        )
    }
}
