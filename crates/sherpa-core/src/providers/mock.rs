//! Mock provider for testing
//!
//! Provides deterministic, configurable responses without network dependencies.
//! `MockMode::Script` plays back one scripted turn per `stream_chat` call,
//! which is how host tests drive multi-round conversations.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
use crate::logging::Logger;
use crate::types::{ChatMessage, MessageRole, ProviderMetadata, StreamChunk, Tool, ToolCall};

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// Stream these chunks, then end normally
    Respond(Vec<StreamChunk>),
    /// Stream these chunks, then fail the stream with `message`
    FailAfter {
        chunks: Vec<StreamChunk>,
        message: String,
    },
}

impl MockTurn {
    /// A turn that only streams text
    pub fn text(text: impl Into<String>) -> Self {
        MockTurn::Respond(vec![StreamChunk::text(text)])
    }

    /// A turn that optionally streams text, then requests tool calls
    pub fn tool_calls(text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let text = text.into();
        let mut chunks = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            chunks.push(StreamChunk::text(text));
        }
        chunks.extend(calls.into_iter().map(StreamChunk::tool_call));
        MockTurn::Respond(chunks)
    }

    /// A turn whose stream fails immediately
    pub fn fail(message: impl Into<String>) -> Self {
        MockTurn::FailAfter {
            chunks: Vec::new(),
            message: message.into(),
        }
    }
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Return response as specific chunks with delays
    Chunks(Vec<String>),
    /// Simulate an error after `delay_chunks` text chunks
    Error { message: String, delay_chunks: usize },
    /// Return nothing (empty response)
    Empty,
    /// Play back one turn per call; calls past the end of the script fail
    Script(Vec<MockTurn>),
}

/// Configuration for the mock provider
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay between chunks in milliseconds (0 = no delay)
    pub chunk_delay_ms: u64,
    /// Size of each chunk when splitting fixed/echo responses
    pub chunk_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            chunk_delay_ms: 0,
            chunk_size: 10,
        }
    }
}

/// A request as the mock provider received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub tools: Vec<Tool>,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: MockConfig,
    turn: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider with default config
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            turn: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a chunked response provider
    pub fn chunked(chunks: Vec<String>, delay_ms: u64, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Chunks(chunks), logger).with_delay(delay_ms)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(
            MockMode::Error {
                message: message.into(),
                delay_chunks: 0,
            },
            logger,
        )
    }

    /// Create a provider that plays back `turns` in order
    pub fn scripted(turns: Vec<MockTurn>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Script(turns), logger)
    }

    fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode,
                ..Default::default()
            },
            logger,
        )
    }

    /// Set chunk delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.chunk_delay_ms = delay_ms;
        self
    }

    /// Set chunk size for splitting responses
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of `stream_chat` calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Extract last user message content
    fn get_last_user_message(&self, messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .map(ChatMessage::joined_text)
            .find(|text| !text.is_empty())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    /// Split text into chunks
    fn split_into_chunks(&self, text: &str) -> Vec<StreamChunk> {
        if self.config.chunk_size == 0 || text.is_empty() {
            return vec![StreamChunk::text(text)];
        }

        text.chars()
            .collect::<Vec<_>>()
            .chunks(self.config.chunk_size)
            .map(|c| StreamChunk::text(c.iter().collect::<String>()))
            .collect()
    }

    /// Chunks to stream for this call, and an optional trailing error
    fn plan_turn(&self, messages: &[ChatMessage]) -> (Vec<StreamChunk>, Option<String>) {
        match &self.config.mode {
            MockMode::Echo => {
                let user_msg = self.get_last_user_message(messages);
                self.logger.debug(&format!("MockProvider: Echo mode, echoing: {}", user_msg));
                (self.split_into_chunks(&format!("Echo: {}", user_msg)), None)
            }
            MockMode::Fixed(response) => {
                self.logger.debug(&format!("MockProvider: Fixed mode, response len: {}", response.len()));
                (self.split_into_chunks(response), None)
            }
            MockMode::Chunks(chunks) => {
                self.logger.debug(&format!("MockProvider: Chunks mode, {} chunks", chunks.len()));
                (chunks.iter().map(StreamChunk::text).collect(), None)
            }
            MockMode::Empty => {
                self.logger.debug("MockProvider: Empty mode");
                (Vec::new(), None)
            }
            MockMode::Error { message, delay_chunks } => {
                self.logger.debug(&format!("MockProvider: Error mode after {} chunks", delay_chunks));
                let chunks = (0..*delay_chunks)
                    .map(|i| StreamChunk::text(format!("Chunk {} before error. ", i)))
                    .collect();
                (chunks, Some(message.clone()))
            }
            MockMode::Script(turns) => {
                let index = self.turn.fetch_add(1, Ordering::SeqCst);
                self.logger.debug(&format!("MockProvider: Script turn {} of {}", index + 1, turns.len()));
                match turns.get(index) {
                    Some(MockTurn::Respond(chunks)) => (chunks.clone(), None),
                    Some(MockTurn::FailAfter { chunks, message }) => (chunks.clone(), Some(message.clone())),
                    None => (Vec::new(), Some(format!("script exhausted after {} turns", turns.len()))),
                }
            }
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "mock".to_string(),
            display_name: "Mock Provider".to_string(),
            requires_api_key: false,
        }
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
    ) -> ProviderResult<StreamResponse> {
        self.logger.debug("MockProvider: stream_chat called");

        let (chunks, failure) = self.plan_turn(&messages);

        self.requests.lock().push(RecordedRequest {
            messages,
            model: model.model,
            tools: options.tools.unwrap_or_default(),
        });

        let delay_ms = self.config.chunk_delay_ms;
        let logger = self.logger.clone();

        let items = chunks
            .into_iter()
            .map(Ok::<StreamChunk, ProviderError>)
            .chain(failure.map(|msg| Err(ProviderError::Other(format!("Mock error: {}", msg)))));

        let stream = stream::iter(items.enumerate()).then(move |(i, item)| {
            let logger = logger.clone();
            async move {
                // Apply delay (except for first chunk)
                if i > 0 && delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                if let Ok(chunk) = &item {
                    logger.debug(&format!("MockProvider: Yielding chunk {}: {:?}", i, chunk));
                }
                item
            }
        });

        Ok(Box::pin(stream))
    }
}
