//! Behaviour of the resilient completion caller against a scripted backend.
//!
//! Tokio time is paused, so backoff sleeps complete instantly while
//! `tokio::time::Instant` still advances by exactly the requested delay.

use async_trait::async_trait;
use edgequake_lessonplan::{
    classify_failure, complete, complete_with_observer, BackendFailure, CompletionError,
    CompletionObserver, FailureKind, GenerateRequest, RetryPolicy, TextBackend,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replays a fixed list of outcomes, one per call, and records each call.
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Call>>,
}

#[derive(Debug, Clone)]
struct Call {
    at: Instant,
    prompt: String,
    system: Option<String>,
}

impl ScriptedBackend {
    fn new<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<&'static str, &'static str>>,
    {
        let script = outcomes
            .into_iter()
            .map(|o| o.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails with `message` on each of the first `times` calls.
    fn always_failing(message: &'static str, times: usize) -> Self {
        Self::new(std::iter::repeat_n(Err(message), times))
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Time between consecutive calls.
    fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|w| w[1].at.duration_since(w[0].at))
            .collect()
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendFailure> {
        self.calls.lock().unwrap().push(Call {
            at: Instant::now(),
            prompt: request.prompt.to_string(),
            system: request.system_instruction.map(str::to_string),
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(BackendFailure::new(message)),
            None => Err(BackendFailure::new("script exhausted")),
        }
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
    delays: Mutex<Vec<Duration>>,
}

impl CompletionObserver for RecordingObserver {
    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        self.events
            .lock()
            .unwrap()
            .push(format!("attempt {attempt}/{max_attempts}"));
    }

    fn on_backoff(&self, attempt: u32, delay: Duration, _reason: &str) {
        self.delays.lock().unwrap().push(delay);
        self.events
            .lock()
            .unwrap()
            .push(format!("backoff after {attempt}"));
    }

    fn on_success(&self, attempt: u32) {
        self.events
            .lock()
            .unwrap()
            .push(format!("success on {attempt}"));
    }

    fn on_failure(&self, error: &CompletionError) {
        self.events
            .lock()
            .unwrap()
            .push(format!("failure ({})", error.status_code()));
    }
}

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn default_policy() -> RetryPolicy {
    RetryPolicy::default()
}

// ── Contract scenarios ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn first_attempt_success_makes_one_call() {
    let backend = ScriptedBackend::new([Ok("Hello")]);
    let start = Instant::now();

    let text = complete(&backend, "Hi", None, &default_policy()).await.unwrap();

    assert_eq!(text, "Hello");
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn persistent_503_exhausts_budget_with_doubling_delays() {
    init_tracing();
    let backend = ScriptedBackend::always_failing("503 Service Unavailable", 3);

    let err = complete(&backend, "p", None, &default_policy())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CompletionError::ServiceOverloaded {
            attempts: 3,
            last_error: "503 Service Unavailable".into(),
        }
    );
    assert_eq!(backend.calls().len(), 3);
    assert_eq!(
        backend.gaps(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(err.status_code(), 429);
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_returns_immediately() {
    let backend = ScriptedBackend::new([Err("invalid API key"), Ok("never reached")]);
    let start = Instant::now();

    let err = complete(&backend, "p", None, &default_policy())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CompletionError::Backend {
            message: "invalid API key".into()
        }
    );
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(err.status_code(), 502);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_then_success_waits_once() {
    let backend = ScriptedBackend::new([Err("rate limit exceeded"), Ok("Hello")]);

    let text = complete(&backend, "p", None, &default_policy()).await.unwrap();

    assert_eq!(text, "Hello");
    assert_eq!(backend.calls().len(), 2);
    assert_eq!(backend.gaps(), vec![Duration::from_secs(2)]);
}

#[tokio::test(start_paused = true)]
async fn transient_then_permanent_stops_at_the_permanent_error() {
    let backend = ScriptedBackend::new([
        Err("model overloaded"),
        Err("400 Bad Request: malformed"),
    ]);

    let err = complete(&backend, "p", None, &default_policy())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Backend { ref message } if message.contains("400")));
    assert_eq!(backend.calls().len(), 2);
    assert_eq!(backend.gaps(), vec![Duration::from_secs(2)]);
}

#[tokio::test(start_paused = true)]
async fn n_attempts_give_n_calls_and_n_minus_one_delays() {
    let base = Duration::from_millis(500);
    for n in 1..=5u32 {
        let backend = ScriptedBackend::always_failing("Quota exceeded", n as usize);
        let policy = RetryPolicy::new(n, base);

        let err = complete(&backend, "p", None, &policy).await.unwrap_err();

        assert!(err.is_overloaded(), "n={n}: {err:?}");
        assert_eq!(backend.calls().len(), n as usize);
        let expected: Vec<Duration> = (0..n.saturating_sub(1))
            .map(|i| base * 2u32.pow(i))
            .collect();
        assert_eq!(backend.gaps(), expected, "n={n}");
    }
}

#[tokio::test(start_paused = true)]
async fn markers_are_matched_in_any_case() {
    for message in ["SERVICE UNAVAILABLE", "Rate Limit hit", "HTTP 429", "Overloaded"] {
        let backend = ScriptedBackend::new([Err(message), Ok("ok")]);
        let text = complete(&backend, "p", None, &default_policy()).await.unwrap();
        assert_eq!(text, "ok", "{message}");
        assert_eq!(backend.calls().len(), 2, "{message}");
    }
}

#[tokio::test(start_paused = true)]
async fn same_inputs_classify_the_same_way() {
    for _ in 0..3 {
        let backend = ScriptedBackend::new([Err("permission denied")]);
        let err = complete(&backend, "p", None, &default_policy())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CompletionError::Backend {
                message: "permission denied".into()
            }
        );
    }
    assert_eq!(classify_failure("permission denied"), FailureKind::Permanent);
    assert_eq!(classify_failure("permission denied"), FailureKind::Permanent);
}

// ── Request shape ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn every_attempt_sends_the_same_request() {
    let backend = ScriptedBackend::new([Err("503"), Err("503"), Ok("done")]);

    complete(&backend, "Outline please", Some("Be precise."), &default_policy())
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    for call in calls {
        assert_eq!(call.prompt, "Outline please");
        assert_eq!(call.system.as_deref(), Some("Be precise."));
    }
}

#[tokio::test(start_paused = true)]
async fn blank_system_instruction_is_not_sent() {
    let backend = ScriptedBackend::new([Ok("done")]);
    complete(&backend, "p", Some("   "), &default_policy())
        .await
        .unwrap();
    assert_eq!(backend.calls()[0].system, None);
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn timeout_during_backoff_stops_further_attempts() {
    let backend = ScriptedBackend::always_failing("503 Service Unavailable", 3);

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        complete(&backend, "p", None, &default_policy()),
    )
    .await;

    assert!(outcome.is_err(), "expected the timeout to fire first");
    assert_eq!(backend.calls().len(), 1);

    // Well past every backoff: nothing resumes the dropped call.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.calls().len(), 1);
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn observer_sees_attempts_backoffs_and_outcome() {
    init_tracing();
    let backend = ScriptedBackend::new([
        Err("429 Too Many Requests"),
        Err("overloaded"),
        Ok("fine"),
    ]);
    let observer = RecordingObserver::default();

    let text = complete_with_observer(&backend, "p", None, &default_policy(), &observer)
        .await
        .unwrap();

    assert_eq!(text, "fine");
    assert_eq!(
        *observer.delays.lock().unwrap(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(
        *observer.events.lock().unwrap(),
        vec![
            "attempt 1/3",
            "backoff after 1",
            "attempt 2/3",
            "backoff after 2",
            "attempt 3/3",
            "success on 3",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn observer_sees_exhaustion_once() {
    let backend = ScriptedBackend::always_failing("unavailable", 2);
    let observer = RecordingObserver::default();
    let policy = RetryPolicy::new(2, Duration::from_secs(1));

    let err = complete_with_observer(&backend, "p", None, &policy, &observer)
        .await
        .unwrap_err();

    assert!(err.is_overloaded());
    let events = observer.events.lock().unwrap();
    assert_eq!(events.iter().filter(|e| e.starts_with("failure")).count(), 1);
    assert_eq!(events.last().map(String::as_str), Some("failure (429)"));
}
