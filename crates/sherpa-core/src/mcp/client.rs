//! MCP Client using the official rmcp SDK
//!
//! One client per tool provider, over either an in-process duplex stream to
//! the bundled filesystem server or a child process speaking MCP on stdio.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, ClientCapabilities, ClientInfo, Content, Implementation, RawContent,
        Tool as McpTool,
    },
    service::{Peer, RunningService},
    transport::TokioChildProcess,
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::config::McpServerConfig;
use crate::filesystem::FilesystemServer;
use crate::logging::Logger;
use crate::types::{Tool, ToolContent};

use super::traits::ProtocolClient;

/// Default bound on the MCP initialize handshake
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size of each direction of the in-process duplex stream
const IN_PROCESS_BUFFER: usize = 64 * 1024;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Not connected to server: {0}")]
    NotConnected(String),

    #[error("Already connected to server: {0}")]
    AlreadyConnected(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

/// How a client reaches its provider
#[derive(Debug, Clone)]
pub enum TransportConfig {
    /// The bundled filesystem server, hosted on a task in this process
    InProcess { allowed_directory: PathBuf },
    /// An external server spawned as a child process, MCP over stdin/stdout
    Stdio(McpServerConfig),
}

/// MCP client for one tool provider
pub struct McpClient {
    name: String,
    transport: TransportConfig,
    handshake_timeout: Duration,
    /// Held across the handshake so concurrent `connect` calls serialize
    session: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Create an unconnected client
    pub fn new(name: impl Into<String>, transport: TransportConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            name: name.into(),
            transport,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            session: Mutex::new(None),
            logger,
        }
    }

    /// Client for the bundled filesystem server over `allowed_directory`
    pub fn filesystem(allowed_directory: impl Into<PathBuf>, logger: Arc<dyn Logger>) -> Self {
        Self::new(
            "filesystem",
            TransportConfig::InProcess {
                allowed_directory: allowed_directory.into(),
            },
            logger,
        )
    }

    /// Client for a configured child-process server
    pub fn stdio(name: impl Into<String>, config: McpServerConfig, logger: Arc<dyn Logger>) -> Self {
        Self::new(name, TransportConfig::Stdio(config), logger)
    }

    /// Set the handshake timeout
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    fn client_info() -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "sherpa-core".to_string(),
                title: Some("Sherpa".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
        }
    }

    async fn await_handshake<F, E>(&self, handshake: F) -> McpResult<RunningService<RoleClient, ClientInfo>>
    where
        F: Future<Output = Result<RunningService<RoleClient, ClientInfo>, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.handshake_timeout, handshake).await {
            Ok(Ok(running)) => Ok(running),
            Ok(Err(e)) => Err(McpError::InitializationFailed(e.to_string())),
            Err(_) => Err(McpError::InitializationFailed(format!(
                "handshake with {} timed out after {:?}",
                self.name, self.handshake_timeout
            ))),
        }
    }

    async fn connect_in_process(
        &self,
        allowed_directory: &Path,
    ) -> McpResult<RunningService<RoleClient, ClientInfo>> {
        let server = FilesystemServer::new(allowed_directory, Arc::clone(&self.logger))
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let (client_io, server_io) = tokio::io::duplex(IN_PROCESS_BUFFER);

        let logger = Arc::clone(&self.logger);
        tokio::spawn(async move {
            match server.serve(server_io).await {
                Ok(running) => {
                    if let Err(e) = running.waiting().await {
                        logger.warn(&format!("[McpClient] In-process server task ended: {}", e));
                    }
                }
                Err(e) => {
                    logger.error(&format!("[McpClient] In-process server failed to start: {}", e));
                }
            }
        });

        self.await_handshake(Self::client_info().serve(client_io)).await
    }

    async fn connect_stdio(
        &self,
        config: &McpServerConfig,
    ) -> McpResult<RunningService<RoleClient, ClientInfo>> {
        let mut command = Command::new(&config.command);
        command.args(&config.args);
        if let Some(env) = &config.env {
            command.envs(env);
        }

        let transport = TokioChildProcess::new(command).map_err(|e| {
            McpError::ConnectionFailed(format!("failed to spawn '{}': {}", config.command, e))
        })?;

        self.await_handshake(Self::client_info().serve(transport)).await
    }

    async fn peer(&self) -> McpResult<Peer<RoleClient>> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|running| running.peer().clone())
            .ok_or_else(|| McpError::NotConnected(self.name.clone()))
    }
}

/// Convert an MCP catalog entry
pub fn from_mcp_tool(tool: McpTool) -> Tool {
    Tool::new(tool.name.to_string(), tool.description.as_deref().unwrap_or_default())
        .with_schema(Value::Object(tool.input_schema.as_ref().clone()))
}

/// Convert one MCP content part
pub fn from_mcp_content(content: &Content) -> ToolContent {
    let kind = match &content.raw {
        RawContent::Text(t) => return ToolContent::text(t.text.clone()),
        RawContent::Image(_) => "image",
        RawContent::Audio(_) => "audio",
        RawContent::Resource(_) => "resource",
        _ => "other",
    };
    ToolContent::Other {
        kind: kind.to_string(),
    }
}

fn error_text(content: &[ToolContent]) -> String {
    content
        .iter()
        .filter_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Other { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ProtocolClient for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> McpResult<()> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Err(McpError::AlreadyConnected(self.name.clone()));
        }

        self.logger.info(&format!("[McpClient] Connecting to {} ({:?})", self.name, self.transport));

        let running = match &self.transport {
            TransportConfig::InProcess { allowed_directory } => {
                self.connect_in_process(allowed_directory).await?
            }
            TransportConfig::Stdio(config) => self.connect_stdio(config).await?,
        };

        if let Some(info) = running.peer_info() {
            self.logger.debug(&format!(
                "[McpClient] {} is {} {}",
                self.name, info.server_info.name, info.server_info.version
            ));
        }
        self.logger.info(&format!("[McpClient] Connected and initialized: {}", self.name));

        *session = Some(running);
        Ok(())
    }

    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let peer = self.peer().await?;
        let tools = peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!("[McpClient] {} listed {} tools", self.name, tools.len()));

        Ok(tools.into_iter().map(from_mcp_tool).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Vec<ToolContent>> {
        let peer = self.peer().await?;
        self.logger.info(&format!("[McpClient] Calling tool {} on {}", name, self.name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        let content: Vec<ToolContent> = result.content.iter().map(from_mcp_content).collect();
        if result.is_error.unwrap_or(false) {
            return Err(McpError::ToolCallFailed(error_text(&content)));
        }
        Ok(content)
    }

    async fn close(&self) -> McpResult<()> {
        let running = self.session.lock().await.take();
        if let Some(running) = running {
            self.logger.info(&format!("[McpClient] Closing connection: {}", self.name));
            running
                .cancel()
                .await
                .map_err(|e| McpError::Protocol(e.to_string()))?;
        }
        Ok(())
    }
}
