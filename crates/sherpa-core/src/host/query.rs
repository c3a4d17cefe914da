//! Request, output channels and outcome of one query

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::types::{ChatMessage, ModelSelection};

use super::engine::HostResult;

/// One user turn, as sent by the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub user_prompt: String,
    /// Conversation so far; empty for a new conversation
    #[serde(default)]
    pub previous_messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub model: ModelSelection,
    /// Files the user attached; seeds a new conversation instead of the tree
    #[serde(default)]
    pub user_files: Vec<String>,
}

impl QueryRequest {
    pub fn new(user_prompt: impl Into<String>, model: ModelSelection) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            previous_messages: Vec::new(),
            model,
            user_files: Vec::new(),
        }
    }

    pub fn with_history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.previous_messages = messages;
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_files = files.into_iter().map(Into::into).collect();
        self
    }
}

/// Where a query delivers its output
///
/// Every appended message goes to `messages`, every streamed token to
/// `text`. A receiver that has gone away is ignored and the query runs on.
#[derive(Debug, Clone, Default)]
pub struct QuerySinks {
    messages: Option<UnboundedSender<ChatMessage>>,
    text: Option<UnboundedSender<String>>,
}

impl QuerySinks {
    /// Sinks that discard everything
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(messages: UnboundedSender<ChatMessage>, text: UnboundedSender<String>) -> Self {
        Self {
            messages: Some(messages),
            text: Some(text),
        }
    }

    /// Sinks plus the receiving ends of both channels
    pub fn channel() -> (Self, UnboundedReceiver<ChatMessage>, UnboundedReceiver<String>) {
        let (message_tx, message_rx) = unbounded_channel();
        let (text_tx, text_rx) = unbounded_channel();
        (Self::new(message_tx, text_tx), message_rx, text_rx)
    }

    pub(crate) fn emit_message(&self, message: &ChatMessage) {
        if let Some(tx) = &self.messages {
            let _ = tx.send(message.clone());
        }
    }

    pub(crate) fn emit_text(&self, text: &str) {
        if let Some(tx) = &self.text {
            let _ = tx.send(text.to_string());
        }
    }
}

/// Terminal status reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum QueryStatus {
    Completed,
    Error(String),
}

/// Everything a query produced
#[derive(Debug)]
pub struct QueryOutcome {
    /// Full conversation up to completion or failure; usable for a retry
    pub messages: Vec<ChatMessage>,
    pub result: HostResult<()>,
}

impl QueryOutcome {
    pub fn status(&self) -> QueryStatus {
        match &self.result {
            Ok(()) => QueryStatus::Completed,
            Err(e) => QueryStatus::Error(e.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_ok()
    }

    /// Text of the final assistant message
    pub fn answer(&self) -> Option<String> {
        self.messages
            .last()
            .filter(|m| m.role == crate::types::MessageRole::Assistant)
            .map(ChatMessage::joined_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_chat_body() {
        let request: QueryRequest = serde_json::from_value(json!({
            "userPrompt": "where is main?",
            "previousMessages": [],
            "model": "claude-3-5-sonnet-20241022",
            "modelProvider": "anthropic",
            "apiKey": "sk-test"
        }))
        .unwrap();

        assert_eq!(request.user_prompt, "where is main?");
        assert_eq!(request.model.provider_id, "anthropic");
        assert_eq!(request.model.model_id, "claude-3-5-sonnet-20241022");
        assert_eq!(request.model.credential.as_deref(), Some("sk-test"));
        assert!(request.user_files.is_empty());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(QueryStatus::Completed).unwrap(),
            json!({"status": "completed"})
        );
        assert_eq!(
            serde_json::to_value(QueryStatus::Error("boom".into())).unwrap(),
            json!({"status": "error", "message": "boom"})
        );
    }

    #[test]
    fn test_dropped_receivers_are_ignored() {
        let (sinks, messages, text) = QuerySinks::channel();
        drop(messages);
        drop(text);
        sinks.emit_message(&ChatMessage::user("hi"));
        sinks.emit_text("token");
    }
}
