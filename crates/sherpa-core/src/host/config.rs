//! Host settings

use serde::{Deserialize, Serialize};

/// Settings for the conversation loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    /// Model calls allowed per query
    pub max_rounds: usize,
    /// Completion token limit per model call
    pub max_tokens: u32,
    /// Depth of the `tree` call that seeds a new conversation
    pub seed_tree_depth: usize,
    /// Sampling temperature; provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            max_tokens: 8000,
            seed_tree_depth: 3,
            temperature: None,
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_seed_tree_depth(mut self, depth: usize) -> Self {
        self.seed_tree_depth = depth;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.max_rounds, 20);
        assert_eq!(config.max_tokens, 8000);
        assert_eq!(config.seed_tree_depth, 3);
        assert_eq!(config.temperature, None);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: HostConfig = serde_json::from_str(r#"{"maxRounds": 5}"#).unwrap();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.max_tokens, 8000);
    }
}
