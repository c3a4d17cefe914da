//! MCP (Model Context Protocol) clients
//!
//! Uses the official rmcp SDK. Each tool provider gets one `McpClient`,
//! reached either in-process (the bundled filesystem server over a duplex
//! stream) or as a child process speaking MCP on stdio.
//!
//! # Example
//!
//! ```rust,ignore
//! use sherpa_core::mcp::{McpClient, ProtocolClient};
//! use sherpa_core::logging::NoOpLogger;
//!
//! let client = McpClient::filesystem("/path/to/repo", NoOpLogger::shared());
//! client.connect().await?;
//!
//! let tools = client.list_tools().await?;
//! let content = client.call_tool("tree", json!({"path": ".", "maxDepth": 2})).await?;
//!
//! client.close().await?;
//! ```

mod client;
mod manager;
mod traits;

pub use client::{
    from_mcp_content, from_mcp_tool, McpClient, McpError, McpResult, TransportConfig,
    DEFAULT_HANDSHAKE_TIMEOUT,
};
pub use manager::{ManagerError, ManagerResult, McpManager};
pub use traits::ProtocolClient;
