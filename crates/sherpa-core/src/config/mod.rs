//! Configuration for externally hosted tool providers
//!
//! - `McpServersConfig`: the `{"mcpServers": {...}}` document model
//! - `McpConfigFile`: loads/saves that document from disk

mod servers;
mod file;

pub use servers::{McpServerConfig, McpServersConfig};
pub use file::{McpConfigFile, ConfigError, ConfigResult};
