//! Lifecycle of the configured external tool providers

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::McpServersConfig;
use crate::logging::Logger;
use crate::{log_error, log_info};

use super::client::McpClient;
use super::traits::ProtocolClient;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ManagerError {
    #[error("MCP manager is already initialized")]
    AlreadyInitialized,

    #[error("MCP manager is not initialized")]
    NotInitialized,
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Owns one client per configured provider
///
/// Created once per process and handed to `Host::connect`. Providers that
/// fail to spawn or handshake are logged and left out; the rest stay usable.
pub struct McpManager {
    clients: RwLock<Option<Vec<Arc<dyn ProtocolClient>>>>,
    logger: Arc<dyn Logger>,
}

impl McpManager {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            clients: RwLock::new(None),
            logger,
        }
    }

    /// Spawn and connect every configured provider concurrently
    ///
    /// Connected clients keep configuration order. Returns how many connected.
    pub async fn initialize(&self, config: &McpServersConfig) -> ManagerResult<usize> {
        let mut slot = self.clients.write().await;
        if slot.is_some() {
            return Err(ManagerError::AlreadyInitialized);
        }

        let candidates: Vec<Arc<dyn ProtocolClient>> = config
            .mcp_servers
            .iter()
            .map(|(name, server)| {
                Arc::new(McpClient::stdio(name.clone(), server.clone(), Arc::clone(&self.logger)))
                    as Arc<dyn ProtocolClient>
            })
            .collect();

        *slot = Some(self.connect_all(candidates).await);
        let connected = slot.as_ref().map_or(0, Vec::len);

        log_info!(
            self.logger,
            "[McpManager] Connected {} of {} configured servers",
            connected,
            config.mcp_servers.len()
        );
        Ok(connected)
    }

    /// Adopt clients that were built elsewhere, connecting them the same way
    pub async fn initialize_with(&self, candidates: Vec<Arc<dyn ProtocolClient>>) -> ManagerResult<usize> {
        let mut slot = self.clients.write().await;
        if slot.is_some() {
            return Err(ManagerError::AlreadyInitialized);
        }
        let connected = self.connect_all(candidates).await;
        let count = connected.len();
        *slot = Some(connected);
        Ok(count)
    }

    async fn connect_all(&self, candidates: Vec<Arc<dyn ProtocolClient>>) -> Vec<Arc<dyn ProtocolClient>> {
        let attempts = join_all(candidates.iter().map(|client| client.connect())).await;

        candidates
            .into_iter()
            .zip(attempts)
            .filter_map(|(client, attempt)| match attempt {
                Ok(()) => Some(client),
                Err(e) => {
                    log_error!(self.logger, "[McpManager] Failed to connect to {}: {}", client.name(), e);
                    None
                }
            })
            .collect()
    }

    pub async fn is_initialized(&self) -> bool {
        self.clients.read().await.is_some()
    }

    /// Connected clients, in configuration order
    pub async fn clients(&self) -> ManagerResult<Vec<Arc<dyn ProtocolClient>>> {
        self.clients
            .read()
            .await
            .clone()
            .ok_or(ManagerError::NotInitialized)
    }

    /// Close every client and return to the uninitialized state
    pub async fn cleanup(&self) {
        let Some(clients) = self.clients.write().await.take() else {
            return;
        };

        let closed = join_all(clients.iter().map(|client| client.close())).await;
        for (client, result) in clients.iter().zip(closed) {
            if let Err(e) = result {
                log_error!(self.logger, "[McpManager] Failed to close {}: {}", client.name(), e);
            }
        }
        log_info!(self.logger, "[McpManager] Closed {} servers", clients.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::McpServerConfig;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};

    #[tokio::test]
    async fn test_use_before_initialize() {
        let manager = McpManager::new(NoOpLogger::shared());
        assert!(!manager.is_initialized().await);
        assert!(matches!(manager.clients().await, Err(ManagerError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_empty_config_initializes_with_no_clients() {
        let manager = McpManager::new(NoOpLogger::shared());
        assert_eq!(manager.initialize(&McpServersConfig::default()).await.unwrap(), 0);
        assert!(manager.is_initialized().await);
        assert!(manager.clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_double_initialize_is_rejected() {
        let manager = McpManager::new(NoOpLogger::shared());
        manager.initialize(&McpServersConfig::default()).await.unwrap();
        assert_eq!(
            manager.initialize(&McpServersConfig::default()).await,
            Err(ManagerError::AlreadyInitialized)
        );
    }

    #[tokio::test]
    async fn test_failed_server_is_skipped_and_logged() {
        let logger = Arc::new(MemoryLogger::new());
        let manager = McpManager::new(logger.clone());
        let config = McpServersConfig::default()
            .with_server("ghost", McpServerConfig::new("sherpa-test-no-such-binary-4f1c"));

        assert_eq!(manager.initialize(&config).await.unwrap(), 0);
        assert!(manager.clients().await.unwrap().is_empty());
        assert!(logger.contains(LogLevel::Error, "Failed to connect to ghost"));
    }

    #[tokio::test]
    async fn test_cleanup_allows_reinitialize() {
        let manager = McpManager::new(NoOpLogger::shared());
        manager.initialize(&McpServersConfig::default()).await.unwrap();
        manager.cleanup().await;
        assert!(!manager.is_initialized().await);

        manager.cleanup().await;
        manager.initialize(&McpServersConfig::default()).await.unwrap();
        assert!(manager.is_initialized().await);
    }

    #[tokio::test]
    async fn test_initialize_with_in_process_client() {
        let dir = tempfile::tempdir().unwrap();
        let manager = McpManager::new(NoOpLogger::shared());
        let missing = dir.path().join("missing");
        let clients: Vec<Arc<dyn ProtocolClient>> = vec![
            Arc::new(McpClient::filesystem(dir.path(), NoOpLogger::shared())),
            Arc::new(McpClient::filesystem(missing, NoOpLogger::shared())),
        ];

        assert_eq!(manager.initialize_with(clients).await.unwrap(), 1);
        let clients = manager.clients().await.unwrap();
        assert_eq!(clients[0].name(), "filesystem");
        assert_eq!(clients[0].list_tools().await.unwrap().len(), 3);

        manager.cleanup().await;
    }
}
