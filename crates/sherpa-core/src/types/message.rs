//! Conversation message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A single conversation message
///
/// The order of messages in a conversation is the prompt, so messages are
/// only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: MessageRole,
    /// The content of the message (string or structured parts)
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant message from streamed text and the tool calls it requested
    ///
    /// Without tool calls this is a plain text message. With tool calls the text
    /// (if any) comes first, followed by one `tool-call` part per call.
    pub fn assistant_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let text = text.into();
        if tool_calls.is_empty() {
            return Self::assistant(text);
        }

        let mut parts = Vec::with_capacity(tool_calls.len() + 1);
        if !text.is_empty() {
            parts.push(ContentPart::text(text));
        }
        parts.extend(tool_calls.into_iter().map(ContentPart::from));

        Self::with_parts(MessageRole::Assistant, parts)
    }

    /// Create a tool message carrying results for a batch of tool calls
    pub fn tool_results(parts: Vec<ContentPart>) -> Self {
        Self::with_parts(MessageRole::Tool, parts)
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }

    /// Get the text content if this is a simple text message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(_) => None,
        }
    }

    /// All text in this message, whether plain or carried in `text` parts
    pub fn joined_text(&self) -> String {
        match &self.content {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Tool calls requested by this message, in order
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ToolCall { id, name, args } => {
                        Some(ToolCall::new(id.clone(), name.clone(), args.clone()))
                    }
                    _ => None,
                })
                .collect(),
        }
    }

    /// Whether this is an assistant message that requests at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        self.role == MessageRole::Assistant
            && matches!(&self.content, MessageContent::Parts(parts)
                if parts.iter().any(|p| matches!(p, ContentPart::ToolCall { .. })))
    }
}

/// Message content - either simple text or structured parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content with multiple parts
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// Content part for assistant and tool messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    /// Text content
    Text {
        text: String,
    },
    /// Tool call requested by the assistant
    ToolCall {
        id: String,
        name: String,
        args: serde_json::Value,
    },
    /// Result for a tool call, correlated by `id`
    ToolResult {
        id: String,
        name: String,
        result: String,
    },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Create a tool call content part
    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        ContentPart::ToolCall {
            id: id.into(),
            name: name.into(),
            args,
        }
    }

    /// Create a tool result content part
    pub fn tool_result(id: impl Into<String>, name: impl Into<String>, result: impl Into<String>) -> Self {
        ContentPart::ToolResult {
            id: id.into(),
            name: name.into(),
            result: result.into(),
        }
    }
}

impl From<ToolResult> for ContentPart {
    fn from(result: ToolResult) -> Self {
        ContentPart::ToolResult {
            id: result.call_id,
            name: result.name,
            result: result.content,
        }
    }
}

impl From<ToolCall> for ContentPart {
    fn from(call: ToolCall) -> Self {
        ContentPart::ToolCall {
            id: call.id,
            name: call.name,
            args: call.input,
        }
    }
}
