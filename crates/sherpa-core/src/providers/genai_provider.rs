//! GenaiProvider - vendor binding over the genai crate
//!
//! One instance per selected vendor. The vendor id pins the genai adapter
//! (see `namespaced_model`) and the selection's credential is the only
//! source of auth.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Arc;

use genai::chat::{ChatRequest, ChatStreamEvent};

use crate::logging::Logger;
use crate::types::{ChatMessage, ProviderMetadata};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_event, is_genai_supported, namespaced_model, to_genai_messages,
    to_genai_options, to_genai_tools,
};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};

/// Provider for every genai-backed vendor
pub struct GenaiProvider {
    /// Provider identifier
    provider_id: String,
    /// Logger for debug output
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    /// Create a new GenaiProvider
    pub fn new(provider_id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into().to_lowercase(),
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    fn display_name(&self) -> &str {
        match self.provider_id.as_str() {
            "openai" => "OpenAI",
            "anthropic" => "Anthropic",
            "gemini" => "Google Gemini",
            "deepseek" => "DeepSeek",
            "groq" => "Groq",
            "xai" => "xAI",
            "ollama" => "Ollama",
            "cohere" => "Cohere",
            other => other,
        }
    }

    fn requires_api_key(&self) -> bool {
        self.provider_id != "ollama"
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: self.provider_id.clone(),
            display_name: self.display_name().to_string(),
            requires_api_key: self.requires_api_key(),
        }
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: StreamChatOptions,
    ) -> ProviderResult<StreamResponse> {
        self.logger.info(&format!(
            "[GenaiProvider] stream_chat called: provider={}, model={}, messages={}",
            self.provider_id,
            model_config.model,
            messages.len()
        ));

        if self.requires_api_key() && model_config.api_key.is_none() {
            return Err(ProviderError::missing_api_key(&self.provider_id));
        }

        let client = create_client(model_config.api_key.clone());

        let mut chat_req = ChatRequest::new(to_genai_messages(messages));
        if let Some(tools) = &options.tools {
            chat_req = chat_req.with_tools(to_genai_tools(tools.clone()));
        }

        let genai_options = to_genai_options(&options);
        let model_name = namespaced_model(&self.provider_id, &model_config.model);

        let chat_stream = client
            .exec_chat_stream(model_name.as_str(), chat_req, Some(&genai_options))
            .await
            .map_err(|e| ProviderError::api_error(&self.provider_id, 500, e.to_string()))?;

        self.logger.info("[GenaiProvider] Stream started successfully");

        let logger = Arc::clone(&self.logger);
        let provider_id = self.provider_id.clone();

        let stream = chat_stream.stream.flat_map(move |result| {
            let chunks = match result {
                Ok(event) => {
                    match &event {
                        ChatStreamEvent::Start => {
                            logger.debug("[GenaiProvider] Stream event: Start");
                        }
                        ChatStreamEvent::Chunk(c) => {
                            logger.debug(&format!(
                                "[GenaiProvider] Stream event: Chunk ({} chars)",
                                c.content.len()
                            ));
                        }
                        ChatStreamEvent::ToolCallChunk(_) => {
                            logger.debug("[GenaiProvider] Stream event: ToolCallChunk");
                        }
                        ChatStreamEvent::End(_) => {
                            logger.info("[GenaiProvider] Stream event: End");
                        }
                        _ => {}
                    }
                    from_genai_event(event)
                }
                Err(e) => {
                    logger.error(&format!("[GenaiProvider] Stream error: {}", e));
                    vec![Err(ProviderError::api_error(&provider_id, 500, e.to_string()))]
                }
            };
            stream::iter(chunks)
        });

        Ok(Box::pin(stream))
    }
}
