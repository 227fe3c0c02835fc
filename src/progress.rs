//! Observer trait for attempt-level events of a resilient completion call.
//!
//! Inject an [`Arc<dyn CompletionObserver>`] via
//! [`crate::config::PlannerConfigBuilder::observer`] to be told when an
//! attempt starts, when the caller backs off, and how the call ended.
//!
//! The CLI uses this to keep its spinner honest ("rate limited, retrying in
//! 4s") while a request is waiting out a backoff delay. Tests use it to
//! record the exact delay schedule.
//!
//! # Example
//!
//! ```rust
//! use edgequake_lessonplan::{CompletionObserver, PlannerConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//! use std::time::Duration;
//!
//! struct CountingObserver {
//!     backoffs: AtomicU32,
//! }
//!
//! impl CompletionObserver for CountingObserver {
//!     fn on_backoff(&self, attempt: u32, delay: Duration, reason: &str) {
//!         self.backoffs.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("attempt {attempt} failed ({reason}); waiting {delay:?}");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { backoffs: AtomicU32::new(0) });
//!
//! let config = PlannerConfig::builder()
//!     .observer(observer as Arc<dyn CompletionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::CompletionError;
use std::sync::Arc;
use std::time::Duration;

/// Called by [`crate::pipeline::llm::complete_with_observer`] as it works
/// through its attempt budget.
///
/// Implementations must be `Send + Sync`: independent calls may run
/// concurrently on different worker threads and share one observer. All
/// methods have default no-op implementations.
pub trait CompletionObserver: Send + Sync {
    /// Called just before a request is sent to the backend.
    ///
    /// # Arguments
    /// * `attempt`      — 1-indexed attempt number
    /// * `max_attempts` — the attempt budget
    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// Called after a transient failure, before sleeping.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed attempt that just failed
    /// * `delay`   — how long the caller will wait before the next attempt
    /// * `reason`  — the backend's error description
    fn on_backoff(&self, attempt: u32, delay: Duration, reason: &str) {
        let _ = (attempt, delay, reason);
    }

    /// Called once when an attempt returns text.
    fn on_success(&self, attempt: u32) {
        let _ = attempt;
    }

    /// Called once when the call ends in a terminal failure.
    fn on_failure(&self, error: &CompletionError) {
        let _ = error;
    }
}

/// A no-op observer. Used when none is configured.
pub struct NoopObserver;

impl CompletionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::PlannerConfig`].
pub type Observer = Arc<dyn CompletionObserver>;
