//! Core types for conversations, tools and model selection
//!
//! This module contains all the shared types used across providers, tool
//! clients and the host.

mod message;
mod model;
mod tool;
mod stream;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent};
pub use model::{ModelSelection, ProviderMetadata};
pub use tool::{primary_text, Tool, ToolCall, ToolContent, ToolResult};
pub use stream::StreamChunk;
