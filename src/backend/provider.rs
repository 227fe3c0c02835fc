//! Adapter from `edgequake_llm::LLMProvider` to [`TextBackend`].
//!
//! Lets any provider edgequake-llm knows about (OpenAI, Anthropic, Gemini,
//! Ollama, LM Studio, Azure, …) serve outline extraction and lesson-plan
//! generation. The provider's error `Display` is passed through unchanged
//! so that `429` / `503` wording still reaches the retry classifier.

use super::{BackendFailure, GenerateRequest, TextBackend};
use crate::config::PlannerConfig;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tracing::debug;

pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &PlannerConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

#[async_trait]
impl TextBackend for ProviderBackend {
    fn name(&self) -> &str {
        "edgequake"
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendFailure> {
        let messages = build_messages(request);
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| BackendFailure::new(e.to_string()))?;

        debug!(
            "Provider call: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// System message first (when present), then the prompt as the user turn.
fn build_messages(request: &GenerateRequest<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system_instruction {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(request.prompt));
    messages
}

fn build_options(config: &PlannerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
