//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Tool call from the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier, unique within the message that introduced the call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments for the tool
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Get an input argument by key
    pub fn get_arg(&self, key: &str) -> Option<&Value> {
        self.input.get(key)
    }

    /// Get an input argument as a string
    pub fn get_arg_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(|v| v.as_str())
    }
}

/// Result of one tool call, ready to be fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    #[serde(rename = "callId")]
    pub call_id: String,
    /// Name of the tool that produced it
    pub name: String,
    /// The result content
    pub content: String,
    /// Whether this result represents an error
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(call: &ToolCall, error: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: error.into(),
            is_error: true,
        }
    }
}

/// One part of a tool provider's response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text output
    Text { text: String },
    /// Any non-text part (image, resource, ...); only its kind is kept
    Other { kind: String },
}

impl ToolContent {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }
}

/// The primary result string of a tool response: its first text part
pub fn primary_text(content: &[ToolContent]) -> Option<&str> {
    content.iter().find_map(|c| match c {
        ToolContent::Text { text } => Some(text.as_str()),
        ToolContent::Other { .. } => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_creation() {
        let tool = Tool::new("tree", "Render a directory tree").with_schema(json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" }
            },
            "required": ["path"]
        }));

        assert_eq!(tool.name, "tree");
        assert!(tool.input_schema.is_some());
    }

    #[test]
    fn test_tool_call_args() {
        let call = ToolCall::new("call_123", "tree", json!({"path": "src", "maxDepth": 2}));

        assert_eq!(call.get_arg_str("path"), Some("src"));
        assert_eq!(call.get_arg("maxDepth"), Some(&json!(2)));
        assert_eq!(call.get_arg_str("nonexistent"), None);
    }

    #[test]
    fn test_tool_result() {
        let call = ToolCall::new("call_123", "tree", json!({}));
        let success = ToolResult::success(&call, "src\n└── lib.rs");
        assert!(!success.is_error);
        assert_eq!(success.name, "tree");

        let error = ToolResult::error(&call, "Error: denied");
        assert!(error.is_error);
        assert_eq!(error.call_id, "call_123");
    }

    #[test]
    fn test_primary_text_skips_other_parts() {
        let content = vec![
            ToolContent::Other { kind: "image".to_string() },
            ToolContent::text("first"),
            ToolContent::text("second"),
        ];
        assert_eq!(primary_text(&content), Some("first"));
        assert_eq!(primary_text(&[]), None);
    }
}
