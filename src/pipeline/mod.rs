//! Pipeline stages for outline extraction and lesson-plan generation.
//!
//! Each submodule implements exactly one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! outline:      input ──▶ text ──▶ llm ──▶ parse
//!               (URL/path) (pdfium) (retry) (JSON)
//!
//! lesson plan:  prompt ──▶ llm ──▶ postprocess
//! ```
//!
//! 1. [`input`]  resolves the user-supplied path, URL or upload to a local PDF
//! 2. [`text`]   pulls page text out with PDFium inside `spawn_blocking`
//! 3. [`llm`]    the resilient completion caller; the only stage with network I/O
//! 4. [`parse`]  turns the model's JSON reply into outline fields
//! 5. [`postprocess`] deterministic cleanup of generated lesson-plan text

pub mod input;
pub mod llm;
pub mod parse;
pub mod postprocess;
pub mod text;
