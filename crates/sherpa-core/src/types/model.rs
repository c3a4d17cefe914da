//! Model selection and provider metadata types

use serde::{Deserialize, Serialize};

/// Which model a query should run against
///
/// Arrives with every chat request; the provider id picks the vendor binding
/// and the credential authenticates against it.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Provider identifier (openai, anthropic, gemini, ...)
    #[serde(rename = "modelProvider")]
    pub provider_id: String,
    /// Model identifier as used by the provider's API
    #[serde(rename = "model")]
    pub model_id: String,
    /// API key for the provider
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl ModelSelection {
    /// Create a new model selection
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            credential: None,
        }
    }

    /// Set the credential
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

impl std::fmt::Debug for ModelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSelection")
            .field("provider_id", &self.provider_id)
            .field("model_id", &self.model_id)
            .field("credential", &self.credential.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Provider metadata (static information about a provider)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Provider identifier
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Whether API key is required
    pub requires_api_key: bool,
}
