//! The resilient completion caller.
//!
//! Every LLM call in the crate goes through [`complete`]: one logical
//! request, a bounded number of attempts, exponential backoff between
//! attempts that failed for capacity reasons, and exactly one terminal
//! outcome.
//!
//! ## Retry Strategy
//!
//! Overloaded and rate-limited backends recover over seconds to minutes, so
//! transient failures are retried after `base_delay * 2^attempt`: with the
//! defaults (3 attempts, 2 s) the waits are 2 s then 4 s. Anything else
//! (malformed request, bad key, content policy) is surfaced on the first
//! failure; retrying cannot change its outcome.
//!
//! A failure counts as transient when its description contains, ignoring
//! case, one of [`TRANSIENT_MARKERS`]. [`classify_failure`] is the only
//! place that decision is made.
//!
//! ## Cancellation
//!
//! Backoff is a `tokio::time::sleep`, so waiting never blocks other tasks.
//! Dropping the returned future (a request timeout, `select!`, client
//! disconnect) cancels the pending delay and no further attempt is issued.

use crate::backend::{GenerateRequest, TextBackend};
use crate::config::RetryPolicy;
use crate::error::CompletionError;
use crate::progress::{CompletionObserver, NoopObserver};
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Substrings that mark a backend failure as capacity-related and retryable.
pub const TRANSIENT_MARKERS: [&str; 6] = [
    "overloaded",
    "rate limit",
    "quota",
    "unavailable",
    "503",
    "429",
];

/// How a backend failure is treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Capacity or rate limiting; retried until the budget runs out.
    Transient,
    /// Anything else; surfaced immediately.
    Permanent,
}

/// Classify a failure by its textual description.
pub fn classify_failure(description: &str) -> FailureKind {
    let lowered = description.to_lowercase();
    if TRANSIENT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        FailureKind::Transient
    } else {
        FailureKind::Permanent
    }
}

/// Send `prompt` to `backend`, retrying transient failures per `policy`.
///
/// Returns the text of the first successful attempt, or
/// [`CompletionError::ServiceOverloaded`] once every attempt failed
/// transiently, or [`CompletionError::Backend`] on the first permanent
/// failure. A blank `system_instruction` is not sent.
pub async fn complete(
    backend: &dyn TextBackend,
    prompt: &str,
    system_instruction: Option<&str>,
    policy: &RetryPolicy,
) -> Result<String, CompletionError> {
    complete_with_observer(backend, prompt, system_instruction, policy, &NoopObserver).await
}

/// [`complete`], reporting each attempt, backoff and the outcome to `observer`.
pub async fn complete_with_observer(
    backend: &dyn TextBackend,
    prompt: &str,
    system_instruction: Option<&str>,
    policy: &RetryPolicy,
    observer: &dyn CompletionObserver,
) -> Result<String, CompletionError> {
    let request = GenerateRequest::new(prompt, system_instruction);
    let max_attempts = policy.max_attempts;
    let start = Instant::now();

    for attempt in 0..max_attempts {
        let attempt_num = attempt + 1;
        info!(
            "LLM call attempt {}/{} via {}",
            attempt_num,
            max_attempts,
            backend.name()
        );
        observer.on_attempt(attempt_num, max_attempts);

        let failure = match backend.generate(&request).await {
            Ok(text) => {
                info!(
                    "LLM call succeeded on attempt {} in {:?}",
                    attempt_num,
                    start.elapsed()
                );
                debug!("Response: {} chars", text.chars().count());
                observer.on_success(attempt_num);
                return Ok(text);
            }
            Err(failure) => failure,
        };

        match classify_failure(&failure.message) {
            FailureKind::Permanent => {
                error!("LLM call failed with non-retryable error: {}", failure);
                let err = CompletionError::Backend {
                    message: failure.message,
                };
                observer.on_failure(&err);
                return Err(err);
            }
            FailureKind::Transient if attempt_num < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "LLM API overloaded/rate limited. Retrying in {:?}... (attempt {}/{}): {}",
                    delay, attempt_num, max_attempts, failure
                );
                observer.on_backoff(attempt_num, delay, &failure.message);
                sleep(delay).await;
            }
            FailureKind::Transient => {
                error!(
                    "Max attempts ({}) exceeded for LLM API overload/rate limiting: {}",
                    max_attempts, failure
                );
                let err = CompletionError::ServiceOverloaded {
                    attempts: max_attempts,
                    last_error: failure.message,
                };
                observer.on_failure(&err);
                return Err(err);
            }
        }
    }

    // Only reachable with a zero attempt budget.
    let err = CompletionError::Internal(
        "failed to process request after multiple attempts".to_string(),
    );
    observer.on_failure(&err);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendFailure;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingBackend {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TextBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate(&self, _request: &GenerateRequest<'_>) -> Result<String, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("ok".into())
        }
    }

    #[test]
    fn markers_match_case_insensitively() {
        for msg in [
            "503 Service Unavailable",
            "429 Too Many Requests",
            "The model is OVERLOADED",
            "Rate Limit exceeded",
            "Quota exceeded for metric",
            "service UNAVAILABLE",
        ] {
            assert_eq!(classify_failure(msg), FailureKind::Transient, "{msg}");
        }
    }

    #[test]
    fn other_failures_are_permanent() {
        for msg in [
            "invalid API key",
            "400 Bad Request: API key not valid",
            "content blocked by safety filter",
            "",
        ] {
            assert_eq!(classify_failure(msg), FailureKind::Permanent, "{msg}");
        }
    }

    #[test]
    fn ratelimit_without_space_is_not_a_marker() {
        assert_eq!(classify_failure("ratelimited"), FailureKind::Permanent);
    }

    #[tokio::test]
    async fn zero_budget_hits_the_fallback_without_calling() {
        let backend = CountingBackend {
            calls: AtomicU32::new(0),
        };
        let policy = RetryPolicy::new(0, Duration::from_secs(2));
        let err = complete(&backend, "hi", None, &policy).await.unwrap_err();
        assert!(matches!(err, CompletionError::Internal(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
