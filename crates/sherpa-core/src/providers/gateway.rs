//! Model gateway: turns a `ModelSelection` into a ready provider handle

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::logging::Logger;
use crate::types::{ChatMessage, ModelSelection};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::GENAI_PROVIDERS;
use super::genai_provider::GenaiProvider;
use super::mock::MockProvider;
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    GENAI_PROVIDERS.iter().copied().chain(["mock"]).collect()
}

/// A provider bound to one model and credential
///
/// Queries hold on to the handle they started with, so a later `set_model`
/// never changes the model under a running conversation.
pub struct ModelHandle {
    selection: ModelSelection,
    provider: Arc<dyn Provider>,
}

impl ModelHandle {
    pub fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Stream a completion from the bound model
    pub async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        options: StreamChatOptions,
    ) -> ProviderResult<StreamResponse> {
        let mut model = ProviderModelConfig::new(&self.selection.model_id);
        if let Some(key) = &self.selection.credential {
            model = model.with_api_key(key);
        }
        self.provider.stream_chat(messages, model, options).await
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("selection", &self.selection)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Selects and constructs vendor bindings
///
/// # Example
///
/// ```no_run
/// use sherpa_core::logging::NoOpLogger;
/// use sherpa_core::providers::ModelGateway;
/// use sherpa_core::types::ModelSelection;
///
/// let gateway = ModelGateway::new(NoOpLogger::shared());
/// let handle = gateway
///     .set_model(&ModelSelection::new("anthropic", "claude-3-5-sonnet-20241022").with_credential("sk-..."))
///     .unwrap();
/// ```
pub struct ModelGateway {
    current: RwLock<Option<Arc<ModelHandle>>>,
    custom: HashMap<String, Arc<dyn Provider>>,
    logger: Arc<dyn Logger>,
}

impl ModelGateway {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            current: RwLock::new(None),
            custom: HashMap::new(),
            logger,
        }
    }

    /// Register a provider under `id`, shadowing any built-in binding
    pub fn with_provider(mut self, id: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.custom.insert(id.into().to_lowercase(), provider);
        self
    }

    /// Whether `provider_id` can be selected
    pub fn supports(&self, provider_id: &str) -> bool {
        let id = provider_id.to_lowercase();
        self.custom.contains_key(&id) || id == "mock" || GenaiProvider::supports(&id)
    }

    /// Replace the current model with `selection`
    ///
    /// Unknown provider ids fail here, before any request is made.
    pub fn set_model(&self, selection: &ModelSelection) -> ProviderResult<Arc<ModelHandle>> {
        let provider = self.create_provider(&selection.provider_id)?;
        let handle = Arc::new(ModelHandle {
            selection: selection.clone(),
            provider,
        });

        self.logger.info(&format!(
            "[ModelGateway] Model set: provider={}, model={}",
            selection.provider_id, selection.model_id
        ));

        *self.current.write() = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// The handle from the most recent `set_model`
    pub fn current(&self) -> Option<Arc<ModelHandle>> {
        self.current.read().clone()
    }

    fn create_provider(&self, provider_id: &str) -> ProviderResult<Arc<dyn Provider>> {
        let id = provider_id.to_lowercase();

        if let Some(provider) = self.custom.get(&id) {
            return Ok(Arc::clone(provider));
        }

        match id.as_str() {
            "mock" => Ok(Arc::new(MockProvider::echo(Arc::clone(&self.logger)))),
            _ if GenaiProvider::supports(&id) => {
                Ok(Arc::new(GenaiProvider::new(id, Arc::clone(&self.logger))))
            }
            _ => {
                self.logger.error(&format!("[ModelGateway] Unsupported model provider: {}", provider_id));
                Err(ProviderError::unsupported(provider_id))
            }
        }
    }
}
