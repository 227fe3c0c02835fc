//! Text extraction from a PDF via PDFium.
//!
//! `pdfium-render` wraps the PDFium C++ library, which is not async-safe,
//! so the work runs inside `tokio::task::spawn_blocking`.
//!
//! The library is bound from `PDFIUM_LIB_PATH` (a directory holding the
//! platform's PDFium shared library) when set, otherwise from the system
//! library search path.

use crate::error::PlannerError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Directory containing the PDFium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Extract the text of every readable page, joined with `\n`.
///
/// Pages whose text cannot be read are logged and skipped; blank pages are
/// dropped. Returns [`PlannerError::NoReadableText`] when nothing remains.
pub async fn extract_text(pdf_path: &Path, password: Option<&str>) -> Result<String, PlannerError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_text_blocking(&path, password.as_deref()))
        .await
        .map_err(|e| PlannerError::Internal(format!("Text extraction task panicked: {}", e)))?
}

fn bind_pdfium() -> Result<Pdfium, PlannerError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            debug!("Binding PDFium from {}", dir);
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PlannerError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn extract_text_blocking(pdf_path: &Path, password: Option<&str>) -> Result<String, PlannerError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| PlannerError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        match page.text() {
            Ok(text) => texts.push(text.all()),
            Err(e) => warn!("Skipping page {}: text unavailable ({:?})", idx + 1, e),
        }
    }

    let text = join_page_texts(texts);
    if text.is_empty() {
        return Err(PlannerError::NoReadableText {
            path: pdf_path.to_path_buf(),
        });
    }

    debug!("Extracted {} chars of text", text.chars().count());
    Ok(text)
}

/// Join non-blank page texts with `\n`.
fn join_page_texts<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    pages
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_pages_are_dropped() {
        let joined = join_page_texts(vec![
            "Week 1: Cells".to_string(),
            "   \n".to_string(),
            String::new(),
            "Week 2: Genetics".to_string(),
        ]);
        assert_eq!(joined, "Week 1: Cells\nWeek 2: Genetics");
    }

    #[test]
    fn all_blank_is_empty() {
        assert!(join_page_texts(vec![" ".to_string(), "\n\t".to_string()]).is_empty());
    }
}
