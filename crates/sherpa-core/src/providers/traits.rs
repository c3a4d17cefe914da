//! Provider trait definition

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::types::{ChatMessage, ProviderMetadata, StreamChunk, Tool};
use super::error::ProviderResult;

/// Model configuration for provider requests
#[derive(Clone)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// API key for authentication
    pub api_key: Option<String>,
}

impl ProviderModelConfig {
    /// Create a new model config
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl std::fmt::Debug for ProviderModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderModelConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Options for streaming chat requests
#[derive(Debug, Clone, Default)]
pub struct StreamChatOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools available for the model to use
    pub tools: Option<Vec<Tool>>,
}

impl StreamChatOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Type alias for the streaming response
pub type StreamResponse = Pin<Box<dyn Stream<Item = ProviderResult<StreamChunk>> + Send>>;

/// Provider trait for LLM implementations
///
/// Each vendor binding implements this trait; the host never branches on
/// which vendor it is talking to.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Get provider metadata
    fn metadata(&self) -> ProviderMetadata;

    /// Stream a chat completion
    ///
    /// Text arrives as `StreamChunk::Text`; every tool call the model made
    /// arrives as a complete `StreamChunk::ToolCall` before the stream ends.
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
    ) -> ProviderResult<StreamResponse>;
}
