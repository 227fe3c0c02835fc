//! Input resolution: turn a user-supplied path, URL or upload into a local
//! PDF file.
//!
//! PDFium opens documents by path, so downloads and in-memory uploads are
//! written into a `TempDir` that lives as long as the [`ResolvedInput`].
//! The `%PDF` magic is checked before returning so callers get a meaningful
//! error instead of a PDFium failure.

use crate::error::PlannerError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A local PDF ready for text extraction.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was downloaded or uploaded; the `TempDir` is removed on drop.
    Temporary { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Temporary { path, .. } => path,
        }
    }

    /// File name shown to users, e.g. `outline.pdf`.
    pub fn display_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "outline.pdf".to_string())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local PDF, downloading it first if it is a URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PlannerError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write uploaded bytes to a temp file named after `filename`.
pub async fn stage_bytes(bytes: &[u8], filename: &str) -> Result<ResolvedInput, PlannerError> {
    let name = sanitise_filename(filename);
    let temp_dir = TempDir::new().map_err(|e| PlannerError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(name);

    check_magic(bytes, &path)?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| PlannerError::Internal(format!("Failed to write temp file: {}", e)))?;

    debug!("Staged {} uploaded bytes at {}", bytes.len(), path.display());
    Ok(ResolvedInput::Temporary {
        path,
        _temp_dir: temp_dir,
    })
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, PlannerError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(PlannerError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
                return Err(PlannerError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PlannerError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PlannerError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, PlannerError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PlannerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PlannerError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PlannerError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(PlannerError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PlannerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let staged = stage_bytes(&bytes, &filename).await?;
    info!("Downloaded to: {}", staged.path().display());
    Ok(staged)
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), PlannerError> {
    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(PlannerError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Last URL path segment when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

/// Keep only the final path component so uploads cannot escape the temp dir.
fn sanitise_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        "outline.pdf".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://uni.edu/outlines/BIO101.pdf?v=2"),
            "BIO101.pdf"
        );
        assert_eq!(filename_from_url("https://uni.edu/outlines/"), "downloaded.pdf");
    }

    #[test]
    fn test_sanitise_filename() {
        assert_eq!(sanitise_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitise_filename("C:\\Users\\me\\outline.pdf"), "outline.pdf");
        assert_eq!(sanitise_filename(".."), "outline.pdf");
        assert_eq!(sanitise_filename(""), "outline.pdf");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_local("/definitely/not/here.pdf").err().unwrap();
        assert!(matches!(err, PlannerError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 zip archive").unwrap();
        let err = resolve_local(f.path().to_str().unwrap()).err().unwrap();
        match err {
            PlannerError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        let resolved = resolve_local(f.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved.path(), f.path());
    }

    #[tokio::test]
    async fn staged_bytes_live_until_drop() {
        let staged = stage_bytes(b"%PDF-1.4\n", "dir/Outline.pdf").await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(staged.display_name(), "Outline.pdf");
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn staged_non_pdf_is_rejected() {
        let err = stage_bytes(b"<html>", "page.html").await.err().unwrap();
        assert!(matches!(err, PlannerError::NotAPdf { .. }));
    }
}
