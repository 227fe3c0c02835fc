//! API-key resolution for the Gemini backend.
//!
//! A key the user supplied (their own quota) always wins; otherwise the
//! system default from the environment is used. The resolved [`ApiKey`]
//! never prints its secret.

use crate::error::PlannerError;
use std::fmt;
use tracing::debug;

/// Environment variables checked, in order, for the system default key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Supplied explicitly by the user.
    User,
    /// Read from the named environment variable.
    Environment(&'static str),
}

/// A non-empty API key.
#[derive(Clone)]
pub struct ApiKey {
    secret: String,
    source: ApiKeySource,
}

impl ApiKey {
    /// Wrap a user-supplied key. Returns `None` for a blank key.
    pub fn from_user(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self {
                secret: key.to_string(),
                source: ApiKeySource::User,
            })
        }
    }

    pub fn expose(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> ApiKeySource {
        self.source
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail: String = self
            .secret
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        f.debug_struct("ApiKey")
            .field("secret", &format!("…{tail}"))
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the key to use: the user's if non-blank, else the environment's.
pub fn resolve_api_key(user_key: Option<&str>) -> Result<ApiKey, PlannerError> {
    resolve_api_key_with(user_key, |name| std::env::var(name).ok())
}

/// Same as [`resolve_api_key`] with an injectable environment lookup.
pub fn resolve_api_key_with<F>(user_key: Option<&str>, lookup: F) -> Result<ApiKey, PlannerError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = user_key.and_then(ApiKey::from_user) {
        debug!("Using user-supplied API key");
        return Ok(key);
    }

    for var in API_KEY_ENV_VARS {
        if let Some(value) = lookup(var) {
            let value = value.trim();
            if !value.is_empty() {
                debug!("Using API key from {}", var);
                return Ok(ApiKey {
                    secret: value.to_string(),
                    source: ApiKeySource::Environment(var),
                });
            }
        }
    }

    Err(PlannerError::ProviderNotConfigured {
        provider: "gemini".to_string(),
        hint: format!(
            "LLM API key not configured.\n\
            Pass --api-key, or set {} in the environment or a .env file.",
            API_KEY_ENV_VARS.join(" or ")
        ),
    })
}
