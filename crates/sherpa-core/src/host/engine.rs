//! The conversation loop between one model and the connected tools

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::filesystem::{canonical_root, validate_path, FsError, ALLOWED_DIRECTORY_HEADER};
use crate::logging::Logger;
use crate::mcp::{ManagerError, McpClient, McpError, McpManager, ProtocolClient};
use crate::providers::{ModelGateway, ModelHandle, ProviderError, StreamChatOptions};
use crate::tools::{ToolError, ToolRegistry};
use crate::tree::{build_tree, TreeNode, TreeOptions};
use crate::types::{primary_text, ChatMessage, ContentPart, ModelSelection, StreamChunk, ToolCall};
use crate::{log_debug, log_error, log_info};

use super::config::HostConfig;
use super::prompts::SYSTEM_PROMPT;
use super::query::{QueryOutcome, QueryRequest, QuerySinks};

/// Errors that end a query or fail host start-up
#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    ToolNotFound(#[from] ToolError),

    #[error("Model stream failed: {0}")]
    ModelStream(#[source] ProviderError),

    #[error(transparent)]
    Provider(ProviderError),

    #[error("No final answer after {0} model calls")]
    MaxRoundsExceeded(usize),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error(transparent)]
    Mcp(#[from] McpError),

    #[error(transparent)]
    Path(#[from] FsError),

    #[error("Directory walk failed: {0}")]
    Io(#[from] io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Drives queries against the shared tool registry and model gateway
///
/// # Example
///
/// ```rust,ignore
/// let manager = McpManager::new(logger.clone());
/// manager.initialize(&McpConfigFile::user().load()?).await?;
///
/// let gateway = Arc::new(ModelGateway::new(logger.clone()));
/// let host = Host::connect("/path/to/repo", &manager, gateway, HostConfig::default(), logger).await?;
///
/// let (sinks, mut messages, mut tokens) = QuerySinks::channel();
/// let outcome = host.process_query(QueryRequest::new("What does main do?", selection), &sinks).await;
/// ```
pub struct Host {
    root: PathBuf,
    filesystem: Arc<McpClient>,
    registry: Arc<ToolRegistry>,
    gateway: Arc<ModelGateway>,
    config: HostConfig,
    logger: Arc<dyn Logger>,
}

impl Host {
    /// Connect the filesystem provider for `allowed_directory` and build the registry
    ///
    /// The manager's clients register first and the filesystem client last,
    /// so its tools win any name collision.
    pub async fn connect(
        allowed_directory: impl AsRef<Path>,
        manager: &McpManager,
        gateway: Arc<ModelGateway>,
        config: HostConfig,
        logger: Arc<dyn Logger>,
    ) -> HostResult<Self> {
        let root = canonical_root(allowed_directory.as_ref())?;
        let mut clients = manager.clients().await?;

        let filesystem = Arc::new(McpClient::filesystem(root.clone(), Arc::clone(&logger)));
        filesystem.connect().await?;
        clients.push(Arc::clone(&filesystem) as Arc<dyn ProtocolClient>);

        let registry = Arc::new(ToolRegistry::build(&clients, Arc::clone(&logger)).await);
        log_info!(
            logger,
            "[Host] Ready with {} tools from {} clients over {}",
            registry.tool_count(),
            clients.len(),
            root.display()
        );

        Ok(Self {
            root,
            filesystem,
            registry,
            gateway,
            config,
            logger,
        })
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Run one user turn to completion
    ///
    /// Never panics or returns early: failures land in `QueryOutcome::result`
    /// next to the conversation as far as it got.
    pub async fn process_query(&self, request: QueryRequest, sinks: &QuerySinks) -> QueryOutcome {
        let QueryRequest {
            user_prompt,
            previous_messages,
            model,
            user_files,
        } = request;

        let mut messages = previous_messages;
        let result = self
            .run_query(&user_prompt, &model, &user_files, &mut messages, sinks)
            .await;

        match &result {
            Ok(()) => log_info!(self.logger, "[Host] Query completed with {} messages", messages.len()),
            Err(e) => log_error!(self.logger, "[Host] Query failed: {}", e),
        }

        QueryOutcome { messages, result }
    }

    async fn run_query(
        &self,
        user_prompt: &str,
        model: &ModelSelection,
        user_files: &[String],
        messages: &mut Vec<ChatMessage>,
        sinks: &QuerySinks,
    ) -> HostResult<()> {
        let handle = self.gateway.set_model(model).map_err(HostError::Provider)?;

        let first_turn = messages.is_empty();
        if first_turn {
            self.append(messages, sinks, ChatMessage::system(SYSTEM_PROMPT));
        }
        self.append(messages, sinks, ChatMessage::user(user_prompt));

        if first_turn {
            let seed = self.seed_call(user_files);
            log_debug!(self.logger, "[Host] Seeding conversation with {}", seed.name);
            self.append(messages, sinks, ChatMessage::assistant_with_tool_calls("", vec![seed]));
            self.dispatch(messages, sinks).await?;
        }

        for round in 1..=self.config.max_rounds {
            log_debug!(self.logger, "[Host] Model call {} of {}", round, self.config.max_rounds);

            let reply = self.call_model(&handle, messages, sinks).await?;
            let wants_tools = reply.has_tool_calls();
            self.append(messages, sinks, reply);

            if !wants_tools {
                return Ok(());
            }
            self.dispatch(messages, sinks).await?;
        }

        Err(HostError::MaxRoundsExceeded(self.config.max_rounds))
    }

    fn append(&self, messages: &mut Vec<ChatMessage>, sinks: &QuerySinks, message: ChatMessage) {
        sinks.emit_message(&message);
        messages.push(message);
    }

    /// The forced first call: the user's files, or else the top of the tree
    fn seed_call(&self, user_files: &[String]) -> ToolCall {
        let id = format!("seed-{}", Uuid::new_v4());
        if user_files.is_empty() {
            ToolCall::new(id, "tree", json!({"path": ".", "maxDepth": self.config.seed_tree_depth}))
        } else {
            ToolCall::new(id, "read_files", json!({"paths": user_files}))
        }
    }

    async fn call_model(
        &self,
        handle: &ModelHandle,
        messages: &[ChatMessage],
        sinks: &QuerySinks,
    ) -> HostResult<ChatMessage> {
        let mut options = StreamChatOptions::new()
            .with_max_tokens(self.config.max_tokens)
            .with_tools(self.registry.llm_tools());
        if let Some(temperature) = self.config.temperature {
            options = options.with_temperature(temperature);
        }

        let mut stream = handle
            .stream_chat(messages.to_vec(), options)
            .await
            .map_err(HostError::ModelStream)?;

        let mut text = String::new();
        let mut calls = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(HostError::ModelStream)? {
                StreamChunk::Text { text: token } => {
                    sinks.emit_text(&token);
                    text.push_str(&token);
                }
                StreamChunk::ToolCall { mut tool_call } => {
                    if tool_call.id.is_empty() {
                        tool_call.id = Uuid::new_v4().to_string();
                    }
                    calls.push(tool_call);
                }
                StreamChunk::ToolCallDelta { .. } => {}
            }
        }

        Ok(ChatMessage::assistant_with_tool_calls(text, calls))
    }

    /// Run every tool call of the last message and append one tool message
    async fn dispatch(&self, messages: &mut Vec<ChatMessage>, sinks: &QuerySinks) -> HostResult<()> {
        let calls = messages.last().map(ChatMessage::tool_calls).unwrap_or_default();
        log_info!(
            self.logger,
            "[Host] Dispatching {} tool calls: {}",
            calls.len(),
            calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        let results = self.registry.execute_tool_calls(&calls).await?;
        let parts = results.into_iter().map(ContentPart::from).collect();
        self.append(messages, sinks, ChatMessage::tool_results(parts));
        Ok(())
    }

    /// The allowed directory as reported by the filesystem provider
    pub async fn allowed_directory(&self) -> HostResult<String> {
        let content = self
            .registry
            .call_tool("list_allowed_directories", json!({}))
            .await??;
        let text = primary_text(&content).unwrap_or_default();
        Ok(text.strip_prefix(ALLOWED_DIRECTORY_HEADER).unwrap_or(text).to_string())
    }

    /// Structured tree of `path`, with node paths relative to it
    pub async fn directory_tree(&self, path: &str, max_depth: Option<usize>) -> HostResult<TreeNode> {
        let path = validate_path(path, &self.root)?;
        let options = TreeOptions { max_depth };

        let node = tokio::task::spawn_blocking(move || build_tree(&path, &path, options))
            .await
            .map_err(io::Error::other)??;
        Ok(node)
    }

    /// Close the filesystem client; the manager's clients are closed by the manager
    pub async fn cleanup(&self) -> HostResult<()> {
        self.filesystem.close().await?;
        Ok(())
    }
}
