//! File-based MCP provider configuration (JSON)
//!
//! Lives at `<config_dir>/sherpa/mcp_servers.json`. A missing file means no
//! external providers.

use std::fs;
use std::path::{Path, PathBuf};

use super::servers::McpServersConfig;

/// Errors that can occur while loading or writing configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Handle on the `mcp_servers.json` document
///
/// # Example
///
/// ```no_run
/// use sherpa_core::config::McpConfigFile;
///
/// let servers = McpConfigFile::user().load().unwrap_or_default();
/// ```
#[derive(Debug, Clone)]
pub struct McpConfigFile {
    path: PathBuf,
}

impl McpConfigFile {
    /// Create a config handle for a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The user-level document (`~/.config/sherpa/mcp_servers.json` on Linux)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("sherpa").join("mcp_servers.json"))
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document; a missing file is the empty provider set
    pub fn load(&self) -> ConfigResult<McpServersConfig> {
        if !self.path.exists() {
            return Ok(McpServersConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Like `load`, but writes the default document when the file is missing
    ///
    /// A default document that cannot be written is reported as an error.
    pub fn load_or_create(&self) -> ConfigResult<McpServersConfig> {
        if !self.path.exists() {
            let config = McpServersConfig::default();
            self.save(&config)?;
            return Ok(config);
        }
        self.load()
    }

    /// Save the document, creating parent directories as needed
    pub fn save(&self, config: &McpServersConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
