//! Document model for externally configured MCP tool providers

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One child-process tool provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Executable to spawn
    pub command: String,
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

impl McpServerConfig {
    /// Create a provider config for `command`
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: None,
        }
    }

    /// Set the arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add one environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// The `mcp_servers.json` document
///
/// Server order is preserved as written; it is the connection order, which
/// in turn decides which provider wins a tool-name collision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServersConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: IndexMap<String, McpServerConfig>,
}

impl McpServersConfig {
    /// Add a server entry
    pub fn with_server(mut self, name: impl Into<String>, config: McpServerConfig) -> Self {
        self.mcp_servers.insert(name.into(), config);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mcp_servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let config: McpServersConfig = serde_json::from_str(
            r#"{
                "mcpServers": {
                    "zeta": { "command": "npx", "args": ["-y", "zeta-mcp"] },
                    "alpha": { "command": "alpha-mcp", "args": [], "env": { "TOKEN": "t" } }
                }
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = config.mcp_servers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(config.mcp_servers["zeta"].args, vec!["-y", "zeta-mcp"]);
        assert_eq!(
            config.mcp_servers["alpha"].env.as_ref().and_then(|e| e.get("TOKEN")).map(String::as_str),
            Some("t")
        );
    }

    #[test]
    fn test_args_default_to_empty() {
        let config: McpServerConfig = serde_json::from_str(r#"{"command": "srv"}"#).unwrap();
        assert!(config.args.is_empty());
        assert!(config.env.is_none());
    }

    #[test]
    fn test_builder() {
        let config = McpServerConfig::new("uvx")
            .with_args(["mcp-server-git"])
            .with_env("GIT_DIR", "/repo/.git");
        assert_eq!(config.args, vec!["mcp-server-git".to_string()]);
        assert_eq!(config.env.map(|e| e.len()), Some(1));
    }
}
