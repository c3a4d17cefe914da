//! Tool registry: the aggregated catalog of every connected provider
//!
//! The ToolRegistry is responsible for:
//! - Discovering tools from each connected `ProtocolClient`
//! - Routing a tool name to the client that owns it
//! - Converting the catalog to the model-facing `Tool` list
//! - Executing a batch of tool calls and collecting their results

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::logging::Logger;
use crate::mcp::{McpResult, ProtocolClient};
use crate::types::{primary_text, Tool, ToolCall, ToolContent, ToolResult};

/// Information about a tool with its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for tool parameters
    pub input_schema: Value,
    /// Name of the provider that serves this tool
    pub source: String,
}

impl ToolInfo {
    fn from_tool(tool: Tool, source: &str) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            input_schema: tool
                .input_schema
                .unwrap_or_else(|| serde_json::json!({"type": "object"})),
            source: source.to_string(),
        }
    }
}

impl From<&ToolInfo> for Tool {
    fn from(info: &ToolInfo) -> Self {
        Tool {
            name: info.name.clone(),
            description: info.description.clone(),
            input_schema: Some(info.input_schema.clone()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
}

/// Immutable once built; share it behind an `Arc`
pub struct ToolRegistry {
    tools: IndexMap<String, ToolInfo>,
    routes: IndexMap<String, Arc<dyn ProtocolClient>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Build the catalog from `clients`, in order
    ///
    /// A provider whose catalog cannot be listed is left out. When two
    /// providers expose the same name, the later one wins.
    pub async fn build(clients: &[Arc<dyn ProtocolClient>], logger: Arc<dyn Logger>) -> Self {
        let mut tools = IndexMap::new();
        let mut routes: IndexMap<String, Arc<dyn ProtocolClient>> = IndexMap::new();

        for client in clients {
            let listed = match client.list_tools().await {
                Ok(listed) => listed,
                Err(e) => {
                    logger.error(&format!(
                        "[ToolRegistry] Failed to list tools from {}: {}",
                        client.name(),
                        e
                    ));
                    continue;
                }
            };

            logger.info(&format!(
                "[ToolRegistry] Discovered {} tools from {}",
                listed.len(),
                client.name()
            ));

            for tool in listed {
                let info = ToolInfo::from_tool(tool, client.name());
                if let Some(previous) = routes.insert(info.name.clone(), Arc::clone(client)) {
                    logger.warn(&format!(
                        "[ToolRegistry] Tool {} from {} replaces the one from {}",
                        info.name,
                        client.name(),
                        previous.name()
                    ));
                }
                tools.insert(info.name.clone(), info);
            }
        }

        Self { tools, routes, logger }
    }

    /// Every tool, in discovery order
    pub fn tools(&self) -> Vec<ToolInfo> {
        self.tools.values().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolInfo> {
        self.tools.get(name)
    }

    /// Tools in the form sent to the model
    pub fn llm_tools(&self) -> Vec<Tool> {
        self.tools.values().map(Tool::from).collect()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// The client that serves `name`
    pub fn client_for(&self, name: &str) -> Result<Arc<dyn ProtocolClient>, ToolError> {
        self.routes
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Call one tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpResult<Vec<ToolContent>>, ToolError> {
        let client = self.client_for(name)?;
        self.logger.info(&format!("[ToolRegistry] Calling tool: {}", name));
        Ok(client.call_tool(name, arguments).await)
    }

    /// Execute a batch of tool calls concurrently
    ///
    /// Every name is resolved before anything is invoked, so an unknown tool
    /// fails the whole batch untouched. Individual call failures come back as
    /// `Error: ...` results. Results keep the order of `calls`.
    pub async fn execute_tool_calls(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>, ToolError> {
        let resolved = calls
            .iter()
            .map(|call| self.client_for(&call.name).map(|client| (call, client)))
            .collect::<Result<Vec<_>, _>>()?;

        self.logger.debug(&format!("[ToolRegistry] Executing {} tool calls", resolved.len()));

        let results = join_all(resolved.into_iter().map(|(call, client)| async move {
            match client.call_tool(&call.name, call.input.clone()).await {
                Ok(content) => ToolResult::success(call, primary_text(&content).unwrap_or_default()),
                Err(e) => {
                    self.logger.warn(&format!("[ToolRegistry] Tool {} failed: {}", call.name, e));
                    ToolResult::error(call, format!("Error: {}", e))
                }
            }
        }))
        .await;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::McpError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider double with a fixed catalog that echoes its own name
    struct FakeClient {
        name: String,
        tools: Option<Vec<&'static str>>,
        delay: Duration,
        calls: Mutex<Vec<(String, Value)>>,
        in_flight: AtomicUsize,
        /// Most calls ever running at once
        peak: AtomicUsize,
    }

    impl FakeClient {
        fn with(name: &str, tools: Option<Vec<&'static str>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                tools,
                delay,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }

        fn new(name: &str, tools: &[&'static str]) -> Arc<Self> {
            Self::with(name, Some(tools.to_vec()), Duration::ZERO)
        }

        fn broken(name: &str) -> Arc<Self> {
            Self::with(name, None, Duration::ZERO)
        }

        fn slow(name: &str, tools: &[&'static str], delay: Duration) -> Arc<Self> {
            Self::with(name, Some(tools.to_vec()), delay)
        }
    }

    #[async_trait]
    impl ProtocolClient for FakeClient {
        fn name(&self) -> &str {
            &self.name
        }

        async fn connect(&self) -> McpResult<()> {
            Ok(())
        }

        async fn list_tools(&self) -> McpResult<Vec<Tool>> {
            match &self.tools {
                Some(tools) => Ok(tools
                    .iter()
                    .map(|t| Tool::new(*t, format!("{} from {}", t, self.name)))
                    .collect()),
                None => Err(McpError::Protocol("listing failed".to_string())),
            }
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Vec<ToolContent>> {
            self.calls.lock().push((name.to_string(), arguments.clone()));
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if name == "explode" {
                return Err(McpError::ToolCallFailed("boom".to_string()));
            }
            Ok(vec![
                ToolContent::Other {
                    kind: "image".to_string(),
                },
                ToolContent::text(format!("{}:{}:{}", self.name, name, arguments)),
                ToolContent::text("ignored"),
            ])
        }

        async fn close(&self) -> McpResult<()> {
            Ok(())
        }
    }

    fn as_dyn(clients: Vec<Arc<FakeClient>>) -> Vec<Arc<dyn ProtocolClient>> {
        clients.into_iter().map(|c| c as Arc<dyn ProtocolClient>).collect()
    }

    #[tokio::test]
    async fn test_catalog_keeps_discovery_order() {
        let a = FakeClient::new("a", &["tree", "read_files"]);
        let b = FakeClient::new("b", &["search"]);
        let registry = ToolRegistry::build(&as_dyn(vec![a, b]), NoOpLogger::shared()).await;

        let names: Vec<String> = registry.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["tree", "read_files", "search"]);
        assert_eq!(registry.get("search").unwrap().source, "b");
        assert_eq!(registry.llm_tools().len(), 3);
        assert_eq!(
            registry.llm_tools()[0].input_schema,
            Some(json!({"type": "object"}))
        );
    }

    #[tokio::test]
    async fn test_collision_last_registered_wins() {
        let logger = Arc::new(MemoryLogger::new());
        let first = FakeClient::new("first", &["tree"]);
        let second = FakeClient::new("second", &["tree"]);
        let registry = ToolRegistry::build(&as_dyn(vec![first, second.clone()]), logger.clone()).await;

        assert_eq!(registry.tool_count(), 1);
        assert_eq!(registry.get("tree").unwrap().source, "second");
        assert_eq!(registry.client_for("tree").unwrap().name(), "second");
        assert!(logger.contains(LogLevel::Warn, "replaces the one from first"));

        let calls = [ToolCall::new("c1", "tree", json!({}))];
        registry.execute_tool_calls(&calls).await.unwrap();
        assert_eq!(second.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_provider_is_excluded() {
        let logger = Arc::new(MemoryLogger::new());
        let broken = FakeClient::broken("broken");
        let ok = FakeClient::new("ok", &["tree"]);
        let registry = ToolRegistry::build(&as_dyn(vec![broken, ok]), logger.clone()).await;

        assert_eq!(registry.tool_count(), 1);
        assert!(logger.contains(LogLevel::Error, "Failed to list tools from broken"));
    }

    #[tokio::test]
    async fn test_batch_calls_run_concurrently() {
        let delay = Duration::from_millis(100);
        let client = FakeClient::slow("fs", &["tree", "read_files"], delay);
        let registry =
            ToolRegistry::build(&as_dyn(vec![client.clone()]), NoOpLogger::shared()).await;

        let calls = [
            ToolCall::new("id-1", "tree", json!({"path": "."})),
            ToolCall::new("id-2", "read_files", json!({"paths": ["a"]})),
        ];
        let results = registry.execute_tool_calls(&calls).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(client.peak.load(Ordering::SeqCst), 2);
        assert_eq!(client.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_keep_call_order_and_ids() {
        let slow = FakeClient::slow("slow", &["tree"], Duration::from_millis(50));
        let fast = FakeClient::new("fast", &["read_files"]);
        let registry = ToolRegistry::build(&as_dyn(vec![slow, fast]), NoOpLogger::shared()).await;

        let calls = [
            ToolCall::new("id-1", "tree", json!({"path": "."})),
            ToolCall::new("id-2", "read_files", json!({"paths": ["a"]})),
        ];
        let results = registry.execute_tool_calls(&calls).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["id-1", "id-2"]);
        assert_eq!(results[0].content, r#"slow:tree:{"path":"."}"#);
        assert_eq!(results[1].name, "read_files");
        assert!(!results[0].is_error);
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_before_any_call() {
        let client = FakeClient::new("a", &["tree"]);
        let registry = ToolRegistry::build(&as_dyn(vec![client.clone()]), NoOpLogger::shared()).await;

        let calls = [
            ToolCall::new("1", "tree", json!({})),
            ToolCall::new("2", "nope", json!({})),
        ];
        assert_eq!(
            registry.execute_tool_calls(&calls).await.unwrap_err(),
            ToolError::NotFound("nope".to_string())
        );
        assert!(client.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_call_failure_is_inlined() {
        let client = FakeClient::new("a", &["tree", "explode"]);
        let registry = ToolRegistry::build(&as_dyn(vec![client]), NoOpLogger::shared()).await;

        let calls = [
            ToolCall::new("1", "explode", json!({})),
            ToolCall::new("2", "tree", json!({})),
        ];
        let results = registry.execute_tool_calls(&calls).await.unwrap();
        assert!(results[0].is_error);
        assert_eq!(results[0].content, "Error: Tool call failed: boom");
        assert!(!results[1].is_error);
    }

    #[tokio::test]
    async fn test_call_tool_routes_by_name() {
        let a = FakeClient::new("a", &["tree"]);
        let registry = ToolRegistry::build(&as_dyn(vec![a]), NoOpLogger::shared()).await;

        let content = registry.call_tool("tree", json!(1)).await.unwrap().unwrap();
        assert_eq!(primary_text(&content), Some("a:tree:1"));
        assert!(registry.call_tool("missing", json!(null)).await.is_err());
    }
}
