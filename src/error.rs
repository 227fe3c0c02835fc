//! Error types for the edgequake-lessonplan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CompletionError`] — the outcome of one logical LLM call made through
//!   [`crate::pipeline::llm::complete`]. It is small, `Clone`, and maps
//!   cleanly onto an HTTP status at whatever boundary consumes it
//!   ([`CompletionError::status_code`]).
//!
//! * [`PlannerError`] — **Fatal** for a whole pipeline run: bad input file,
//!   missing credential, unparseable outline. Returned from the top-level
//!   functions in [`crate::planner`]. A failed completion is wrapped as
//!   [`PlannerError::Completion`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-lessonplan library.
#[derive(Debug, Error)]
pub enum PlannerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File must be a PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt, or the PDF is encrypted.
    #[error(
        "Unable to process this PDF '{path}': {detail}\n\
Try a different PDF file, or provide the password with --password."
    )]
    CorruptPdf { path: PathBuf, detail: String },

    /// The PDF opened fine but no page carried extractable text.
    #[error(
        "No readable text found in '{path}'.\n\
Ensure the PDF contains text content and is not a scanned image."
    )]
    NoReadableText { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or set PDFIUM_LIB_PATH to the\n\
directory that contains it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No API key was supplied and none is configured in the environment.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A resilient completion call ended in a terminal failure.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// The key under test was rejected by the backend.
    #[error("Invalid API key or failed to connect to the Gemini API: {reason}")]
    InvalidApiKey { reason: String },

    /// The LLM answered, but not with the JSON object we asked for.
    #[error("Failed to parse LLM response: {detail}")]
    OutlineParse { detail: String },

    /// The JSON parsed but named neither subjects nor lecture topics.
    #[error("Could not extract meaningful data from PDF")]
    EmptyOutline,

    // ── Request / config errors ───────────────────────────────────────────
    /// A lesson-plan request is missing a required field.
    #[error("Invalid lesson plan request: {0}")]
    InvalidRequest(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Terminal outcome of one logical LLM call.
///
/// Exactly one of these is produced for every call that does not succeed;
/// there is no partial or degraded result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Every attempt failed with a transient (capacity / rate-limit) error.
    #[error(
        "The AI service is currently overloaded ({attempts} attempts). Please try again in a few \
minutes. If you're using your own API key, you may need to check your quota or upgrade your plan.\n\
Last error: {last_error}"
    )]
    ServiceOverloaded { attempts: u32, last_error: String },

    /// The backend failed for a reason retrying cannot fix.
    #[error("LLM backend error: {message}")]
    Backend { message: String },

    /// The retry loop finished without an outcome.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompletionError {
    /// HTTP status a request boundary should answer with.
    ///
    /// `ServiceOverloaded` → 429, `Backend` → 502, `Internal` → 500.
    pub fn status_code(&self) -> u16 {
        match self {
            CompletionError::ServiceOverloaded { .. } => 429,
            CompletionError::Backend { .. } => 502,
            CompletionError::Internal(_) => 500,
        }
    }

    /// `true` when the caller should suggest retrying later.
    pub fn is_overloaded(&self) -> bool {
        matches!(self, CompletionError::ServiceOverloaded { .. })
    }
}
