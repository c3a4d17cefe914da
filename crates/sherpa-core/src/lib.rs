//! Sherpa Core
//!
//! The engine of a codebase question-answering agent: a language model
//! answers questions about one local directory by calling tools served over
//! MCP, while its output streams back to the caller.
//!
//! ## Components
//!
//! - `providers`: the `Provider` trait, genai-backed vendors and `ModelGateway`
//! - `mcp`: `ProtocolClient`, the in-process and stdio `McpClient`, `McpManager`
//! - `filesystem`: the bundled read-only filesystem tool server
//! - `tree`: .gitignore-aware directory trees
//! - `tools`: the aggregated `ToolRegistry`
//! - `host`: the conversation loop
//!
//! ```rust,ignore
//! use sherpa_core::{Host, HostConfig, McpManager, ModelGateway, QueryRequest, QuerySinks};
//!
//! let manager = McpManager::new(logger.clone());
//! manager.initialize(&McpConfigFile::user().load()?).await?;
//!
//! let gateway = Arc::new(ModelGateway::new(logger.clone()));
//! let host = Host::connect(repo_dir, &manager, gateway, HostConfig::default(), logger).await?;
//!
//! let (sinks, messages, tokens) = QuerySinks::channel();
//! let outcome = host.process_query(QueryRequest::new("How is config loaded?", selection), &sinks).await;
//! println!("{:?}", outcome.status());
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod providers;
pub mod tree;
pub mod filesystem;
pub mod mcp;
pub mod tools;
pub mod host;

// Re-export commonly used types
pub use types::{
    ChatMessage, ContentPart, MessageRole, MessageContent,
    ModelSelection, ProviderMetadata,
    Tool, ToolCall, ToolResult, ToolContent,
    StreamChunk,
};

pub use logging::{Logger, NoOpLogger, TracingLogger, MemoryLogger};

pub use config::{McpConfigFile, McpServerConfig, McpServersConfig, ConfigError};

pub use providers::{Provider, ProviderError, ModelGateway, ModelHandle, GenaiProvider, MockProvider};

pub use mcp::{McpClient, McpError, McpManager, ManagerError, ProtocolClient, TransportConfig};

pub use tools::{ToolRegistry, ToolInfo, ToolError};

pub use host::{Host, HostConfig, HostError, QueryOutcome, QueryRequest, QuerySinks, QueryStatus};
