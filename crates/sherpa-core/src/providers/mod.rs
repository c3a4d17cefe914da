//! LLM Provider implementations
//!
//! ## Architecture
//!
//! Every vendor is a `Provider`. The genai-backed vendors (OpenAI, Anthropic,
//! Gemini, DeepSeek, Groq, xAI, Ollama, Cohere) share one `GenaiProvider`;
//! `MockProvider` covers tests. `ModelGateway` maps a `ModelSelection` onto
//! one of them and fails fast on anything else.
//!
//! Auth is the credential carried by the selection. Nothing is read from the
//! environment.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod gateway;

// Core traits and types
pub use traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;
pub use genai_adapter::is_genai_supported;

// Mock provider for testing
pub use mock::{MockConfig, MockMode, MockProvider, MockTurn, RecordedRequest};

pub use gateway::{supported_providers, ModelGateway, ModelHandle};
