//! Configuration types for outline extraction and lesson-plan generation.
//!
//! All behaviour is controlled through [`PlannerConfig`], built via its
//! [`PlannerConfigBuilder`]. The retry knobs live in their own small
//! [`RetryPolicy`] so the resilient caller can take them without the rest of
//! the configuration.

use crate::backend::TextBackend;
use crate::error::PlannerError;
use crate::progress::Observer;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Model used by the Gemini backend when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Model used for a named edgequake-llm provider when none is configured.
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-nano";

/// Public Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Attempt budget and backoff base for one logical LLM call.
///
/// The delay after failed attempt `i` (0-indexed) is `base_delay * 2^i`:
/// with the defaults that is 2 s, then 4 s, and a third failure is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of requests, including the first. Default: 3.
    pub max_attempts: u32,
    /// Delay after the first transient failure. Default: 2 s.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff before the attempt that follows failed attempt `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Configuration for outline extraction and lesson-plan generation.
///
/// Built via [`PlannerConfig::builder()`] or using
/// [`PlannerConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_lessonplan::PlannerConfig;
/// use std::time::Duration;
///
/// let config = PlannerConfig::builder()
///     .model("gemini-2.0-flash")
///     .max_attempts(5)
///     .base_delay(Duration::from_secs(1))
///     .build()
///     .unwrap();
/// assert_eq!(config.retry.max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct PlannerConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_GEMINI_MODEL`] for the
    /// Gemini backend or [`DEFAULT_PROVIDER_MODEL`] for a named provider.
    pub model: Option<String>,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, the Gemini backend is used.
    pub provider_name: Option<String>,

    /// Pre-constructed edgequake-llm provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed backend. Takes precedence over everything else.
    pub backend: Option<Arc<dyn TextBackend>>,

    /// Gemini API key. If None, falls back to `GOOGLE_API_KEY` / `GEMINI_API_KEY`.
    pub api_key: Option<String>,

    /// Base URL of the Gemini REST API. Default: [`DEFAULT_GEMINI_BASE_URL`].
    pub gemini_base_url: String,

    /// Attempt budget and backoff. Default: 3 attempts, 2 s base.
    pub retry: RetryPolicy,

    /// Sampling temperature (edgequake-llm providers only). Default: 0.4.
    pub temperature: f32,

    /// Maximum tokens to generate (edgequake-llm providers only). Default: 4096.
    pub max_tokens: usize,

    /// How many characters of outline text go into the extraction prompt. Default: 8000.
    ///
    /// Course outlines put the subject header and the timetable of activities
    /// up front; the tail is usually assessment policy boilerplate.
    pub max_outline_chars: usize,

    /// Per-request timeout for backend calls in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted outlines.
    pub password: Option<String>,

    /// Custom system instruction. If None, uses [`crate::prompts::SYSTEM_INSTRUCTION`].
    pub system_instruction: Option<String>,

    /// Attempt-level event sink.
    pub observer: Option<Observer>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            temperature: 0.4,
            max_tokens: 4096,
            max_outline_chars: 8000,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            password: None,
            system_instruction: None,
            observer: None,
        }
    }
}

impl fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("retry", &self.retry)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_outline_chars", &self.max_outline_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn CompletionObserver>"))
            .finish()
    }
}

impl PlannerConfig {
    /// Create a new builder for `PlannerConfig`.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model the Gemini backend should use.
    pub fn gemini_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Builder for [`PlannerConfig`].
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl fmt::Debug for PlannerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PlannerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn TextBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_base_url = url.into();
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_outline_chars(mut self, n: usize) -> Self {
        self.config.max_outline_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.system_instruction = Some(instruction.into());
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PlannerConfig, PlannerError> {
        let c = &self.config;
        if c.retry.max_attempts == 0 {
            return Err(PlannerError::InvalidConfig(
                "max attempts must be ≥ 1".into(),
            ));
        }
        if c.max_outline_chars == 0 {
            return Err(PlannerError::InvalidConfig(
                "max outline chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PlannerError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = PlannerConfig::default();
        assert_eq!(c.retry.max_attempts, 3);
        assert_eq!(c.retry.base_delay, Duration::from_secs(2));
        assert_eq!(c.max_outline_chars, 8000);
        assert_eq!(c.gemini_model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn delays_double_from_base() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(0), Duration::from_secs(2));
        assert_eq!(p.delay_for(1), Duration::from_secs(4));
        assert_eq!(p.delay_for(2), Duration::from_secs(8));
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        let p = RetryPolicy::new(100, Duration::from_secs(2));
        assert_eq!(p.delay_for(64), Duration::from_secs(2).saturating_mul(u32::MAX));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = PlannerConfig::builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(err, PlannerError::InvalidConfig(_)));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = PlannerConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = PlannerConfig::builder()
            .api_key("AIza-super-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));
    }
}
