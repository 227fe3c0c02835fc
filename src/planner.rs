//! Library entry points: outline extraction, lesson-plan generation and
//! API-key checks.
//!
//! Every entry point resolves a [`TextBackend`] from the config (see
//! [`resolve_backend`]) and sends exactly one logical request through the
//! resilient caller in [`crate::pipeline::llm`].

use crate::backend::{resolve_backend, GeminiBackend, TextBackend};
use crate::config::PlannerConfig;
use crate::credentials::ApiKey;
use crate::document;
use crate::error::{CompletionError, PlannerError};
use crate::output::{LessonPlan, LessonPlanRequest, OutlineExtraction};
use crate::pipeline::{input, llm, parse, postprocess, text};
use crate::progress::{CompletionObserver, NoopObserver};
use crate::prompts;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Extract subjects, lecture topics and their focus topics from a course
/// outline PDF.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `filename`  — Name to record in the result; defaults to the file's own name
/// * `config`    — Planner configuration
/// * `user_key`  — Per-request Gemini key; falls back to the config, then the environment
///
/// # Errors
/// - File not found, not a PDF, or no extractable text
/// - [`PlannerError::Completion`] when the model could not be reached
/// - [`PlannerError::OutlineParse`] / [`PlannerError::EmptyOutline`] when the
///   reply carried no usable outline
pub async fn extract_outline(
    input_str: impl AsRef<str>,
    filename: Option<&str>,
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<OutlineExtraction, PlannerError> {
    let input_str = input_str.as_ref();
    info!("Extracting outline from: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let name = filename
        .map(str::to_string)
        .unwrap_or_else(|| resolved.display_name());
    outline_from_resolved(&resolved, name, config, user_key).await
}

/// [`extract_outline`] for PDF bytes already in memory (an upload).
///
/// The bytes are staged in a managed temp directory that is removed on
/// return.
pub async fn extract_outline_from_bytes(
    bytes: &[u8],
    filename: &str,
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<OutlineExtraction, PlannerError> {
    info!("Extracting outline from upload: {} ({} bytes)", filename, bytes.len());
    let staged = input::stage_bytes(bytes, filename).await?;
    outline_from_resolved(&staged, filename.to_string(), config, user_key).await
}

/// Run the outline prompt over text that was already extracted.
///
/// Blank text is rejected before any model call.
pub async fn extract_outline_from_text(
    outline_text: &str,
    filename: &str,
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<OutlineExtraction, PlannerError> {
    if outline_text.trim().is_empty() {
        return Err(PlannerError::NoReadableText {
            path: filename.into(),
        });
    }

    let backend = resolve_backend(config, user_key)?;
    let excerpt = prompts::truncate_chars(outline_text, config.max_outline_chars);
    debug!(
        "Outline text: {} chars, sending {}",
        outline_text.chars().count(),
        excerpt.chars().count()
    );

    let prompt = prompts::outline_extraction_prompt(excerpt);
    let start = Instant::now();
    let raw = call(backend.as_ref(), &prompt, config).await?;
    let parsed = parse::parse_outline(&raw)?;
    info!(
        "Outline extracted in {:?}: {} subjects, {} lecture topics",
        start.elapsed(),
        parsed.subject_names.len(),
        parsed.lecture_topics.len()
    );

    Ok(OutlineExtraction {
        id: Uuid::new_v4(),
        filename: filename.to_string(),
        subject_names: parsed.subject_names,
        lecture_topics: parsed.lecture_topics,
        lecture_focus_mapping: parsed.lecture_focus_mapping,
        extracted_at: Utc::now(),
    })
}

async fn outline_from_resolved(
    resolved: &input::ResolvedInput,
    filename: String,
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<OutlineExtraction, PlannerError> {
    let outline_text = text::extract_text(resolved.path(), config.password.as_deref()).await?;
    extract_outline_from_text(&outline_text, &filename, config, user_key).await
}

/// Generate a lesson plan for `request`.
///
/// The returned [`LessonPlan::content`] is the cleaned plain text; use
/// [`document::render_markdown`] for the downloadable document.
pub async fn generate_lesson_plan(
    request: &LessonPlanRequest,
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<LessonPlan, PlannerError> {
    request.validate()?;
    info!(
        "Generating lesson plan: {} / {} ({}, {}, {})",
        request.subject_name.trim(),
        request.lecture_topic.trim(),
        request.blooms_taxonomy,
        request.aqf_level.label(),
        request.lesson_duration
    );

    let backend = resolve_backend(config, user_key)?;
    let prompt = prompts::lesson_plan_prompt(request);
    let start = Instant::now();
    let raw = call(backend.as_ref(), &prompt, config).await?;
    let content = postprocess::clean_content(&raw);
    info!(
        "Lesson plan generated in {:?} ({} chars)",
        start.elapsed(),
        content.chars().count()
    );

    Ok(LessonPlan {
        id: Uuid::new_v4(),
        request_data: request.clone(),
        content,
        generated_at: Utc::now(),
    })
}

/// Generate a lesson plan and write its Markdown document to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_lesson_plan_to_file(
    request: &LessonPlanRequest,
    output_path: impl AsRef<Path>,
    config: &PlannerConfig,
    user_key: Option<&str>,
) -> Result<LessonPlan, PlannerError> {
    let plan = generate_lesson_plan(request, config, user_key).await?;
    let path = output_path.as_ref();
    let markdown = document::render_markdown(&plan);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PlannerError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &markdown)
        .await
        .map_err(|e| PlannerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(PlannerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    info!("Wrote lesson plan to {}", path.display());
    Ok(plan)
}

/// Check that `key` is accepted by Gemini by sending a minimal prompt.
///
/// Overload exhaustion is reported as [`CompletionError::ServiceOverloaded`]
/// (the key may well be fine); every other failure means the key is invalid.
pub async fn check_api_key(key: &str, config: &PlannerConfig) -> Result<(), PlannerError> {
    let api_key = ApiKey::from_user(key).ok_or_else(|| PlannerError::InvalidApiKey {
        reason: "API key is empty".to_string(),
    })?;
    let backend = GeminiBackend::new(api_key, config.gemini_model(), config.api_timeout())?
        .with_base_url(&config.gemini_base_url);

    match call(&backend, prompts::API_KEY_CHECK_PROMPT, config).await {
        Ok(reply) if reply.trim().is_empty() => Err(PlannerError::InvalidApiKey {
            reason: "empty response from model".to_string(),
        }),
        Ok(_) => {
            info!("API key accepted by {}", backend.model());
            Ok(())
        }
        Err(PlannerError::Completion(err @ CompletionError::ServiceOverloaded { .. })) => {
            warn!("Could not verify API key: {}", err);
            Err(err.into())
        }
        Err(PlannerError::Completion(err)) => Err(PlannerError::InvalidApiKey {
            reason: err.to_string(),
        }),
        Err(other) => Err(other),
    }
}

/// One resilient call with the configured system instruction and observer.
async fn call(
    backend: &dyn TextBackend,
    prompt: &str,
    config: &PlannerConfig,
) -> Result<String, PlannerError> {
    let system = config
        .system_instruction
        .as_deref()
        .unwrap_or(prompts::SYSTEM_INSTRUCTION);
    let observer: &dyn CompletionObserver = match config.observer {
        Some(ref o) => o.as_ref(),
        None => &NoopObserver,
    };
    let text =
        llm::complete_with_observer(backend, prompt, Some(system), &config.retry, observer).await?;
    Ok(text)
}
