//! # edgequake-lessonplan
//!
//! Extract the structure of a course outline PDF and generate lesson plans
//! with an LLM, surviving an overloaded or rate-limited backend.
//!
//! ## Pipeline Overview
//!
//! ```text
//! outline PDF
//!  │
//!  ├─ 1. Input   resolve local file, URL download or in-memory upload
//!  ├─ 2. Text    page text via pdfium (spawn_blocking)
//!  ├─ 3. LLM     resilient call: bounded attempts, exponential backoff
//!  └─ 4. Parse   lenient JSON → subjects, lecture topics, focus topics
//!
//! lesson-plan request
//!  │
//!  ├─ 1. Prompt  Bloom's level, AQF level, duration, optional focus topic
//!  ├─ 2. LLM     same resilient call
//!  ├─ 3. Polish  strip stray Markdown, normalise bullets
//!  └─ 4. Render  Markdown document with a metadata table
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_lessonplan::{
//!     extract_outline, generate_lesson_plan, AqfLevel, BloomsLevel, LessonDuration,
//!     LessonPlanRequest, PlannerConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Gemini key read from GOOGLE_API_KEY / GEMINI_API_KEY
//!     let config = PlannerConfig::default();
//!     let outline = extract_outline("outline.pdf", None, &config, None).await?;
//!
//!     let lecture = &outline.lecture_topics[0];
//!     let request = LessonPlanRequest {
//!         subject_name: outline.subject_names[0].clone(),
//!         lecture_topic: lecture.clone(),
//!         focus_topic: outline.focus_topics(lecture).first().cloned(),
//!         blooms_taxonomy: BloomsLevel::Apply,
//!         aqf_level: AqfLevel::new(7).ok_or("bad AQF level")?,
//!         lesson_duration: LessonDuration::Hours1_5,
//!     };
//!     let plan = generate_lesson_plan(&request, &config, None).await?;
//!     println!("{}", plan.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `lessonplan` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-lessonplan = { version = "0.1", default-features = false }
//! ```
//!
//! ## Backends
//!
//! Gemini is called directly over REST by default. Set
//! [`PlannerConfig::provider_name`] to route through any edgequake-llm
//! provider instead, or inject a [`TextBackend`] of your own.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    resolve_backend, BackendFailure, GeminiBackend, GenerateRequest, ProviderBackend, TextBackend,
};
pub use config::{PlannerConfig, PlannerConfigBuilder, RetryPolicy};
pub use credentials::{resolve_api_key, ApiKey, ApiKeySource};
pub use document::{download_filename, render_markdown};
pub use error::{CompletionError, PlannerError};
pub use options::{AqfLevel, BloomsLevel, LessonDuration, LessonOptions, ParseOptionError};
pub use output::{LessonPlan, LessonPlanRequest, OutlineExtraction};
pub use pipeline::llm::{classify_failure, complete, complete_with_observer, FailureKind};
pub use planner::{
    check_api_key, extract_outline, extract_outline_from_bytes, extract_outline_from_text,
    generate_lesson_plan, generate_lesson_plan_to_file,
};
pub use progress::{CompletionObserver, NoopObserver, Observer};
