//! Protocol client abstraction

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Tool, ToolContent};

use super::client::McpResult;

/// A session with one tool provider
///
/// The registry and host only see this trait, so any transport (or a test
/// double) can stand behind a provider name.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Provider name, used as the `source` of its tools
    fn name(&self) -> &str;

    /// Establish the session
    async fn connect(&self) -> McpResult<()>;

    /// Full tool catalog of the provider
    async fn list_tools(&self) -> McpResult<Vec<Tool>>;

    /// Invoke a tool; the first text part is the primary result
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Vec<ToolContent>>;

    /// Release the transport; safe to call more than once
    async fn close(&self) -> McpResult<()>;
}
