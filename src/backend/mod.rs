//! Text-generation backends.
//!
//! The resilient caller talks to a [`TextBackend`]: one method, one network
//! request per call, a plain-text error description on failure. Retry and
//! classification live in [`crate::pipeline::llm`], never here, so a backend
//! stays a thin translation of one HTTP operation.
//!
//! Two implementations ship with the crate:
//!
//! * [`GeminiBackend`] — the Gemini `generateContent` REST call, bound to a
//!   resolved [`crate::credentials::ApiKey`]. The default.
//! * [`ProviderBackend`] — any `edgequake_llm::LLMProvider` (OpenAI,
//!   Anthropic, Ollama, …), keyed from the environment by edgequake-llm.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiBackend;
pub use provider::ProviderBackend;

use crate::config::{PlannerConfig, DEFAULT_PROVIDER_MODEL};
use crate::credentials::resolve_api_key;
use crate::error::PlannerError;
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// One request to a backend.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    /// Session-level steering text. `None` when empty or whitespace-only.
    pub system_instruction: Option<&'a str>,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(prompt: &'a str, system_instruction: Option<&'a str>) -> Self {
        Self {
            prompt,
            system_instruction: system_instruction.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// A failed backend request, described as text.
///
/// The description is what [`crate::pipeline::llm::classify_failure`]
/// inspects, so backends must keep HTTP status codes and provider messages
/// in it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub message: String,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendFailure {}

/// A generative-text service that answers one prompt per call.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Short label for logs ("gemini", "edgequake").
    fn name(&self) -> &str;

    /// Issue exactly one request and return the generated text.
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendFailure>;
}

/// Resolve the backend, from most-specific to least-specific:
///
/// 1. **Pre-built backend** (`config.backend`) — used as-is.
/// 2. **Pre-built provider** (`config.provider`) — wrapped in a [`ProviderBackend`].
/// 3. **Named provider** (`config.provider_name`) — created through
///    [`ProviderFactory::create_llm_provider`], which reads the provider's
///    own API-key variable.
/// 4. **Gemini** — bound to `user_key`, else `config.api_key`, else the
///    environment default.
pub fn resolve_backend(
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<Arc<dyn TextBackend>, PlannerError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderBackend::new(Arc::clone(provider), config)));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_PROVIDER_MODEL);
        info!("Using edgequake-llm provider '{}' with model {}", name, model);
        let provider: Arc<dyn LLMProvider> = ProviderFactory::create_llm_provider(name, model)
            .map_err(|e| PlannerError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            })?;
        return Ok(Arc::new(ProviderBackend::new(provider, config)));
    }

    let key = resolve_api_key(user_key.or(config.api_key.as_deref()))?;
    info!(
        "Using Gemini model {} ({:?} key)",
        config.gemini_model(),
        key.source()
    );
    let backend = GeminiBackend::new(key, config.gemini_model(), config.api_timeout())?
        .with_base_url(&config.gemini_base_url);
    Ok(Arc::new(backend))
}
