use crate::error::GranskaError;
use crate::source::{split_pages, TextSource};
use std::io::Write;
use std::process::Command;

/// PDF text backend using pdftotext (from poppler-utils).
///
/// Runs in reading-order mode (no `-layout`) so that prose paragraphs come
/// out as continuous lines rather than column-aligned fragments.
pub struct PdftotextSource;

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for PdftotextSource {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, GranskaError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| GranskaError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(bytes)
            .map_err(|e| GranskaError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GranskaError::PdftotextNotFound
                } else {
                    GranskaError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(GranskaError::PdftotextFailed { code, stderr });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_pages(&text);
        tracing::debug!(pages = pages.len(), "pdftotext extracted pages");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}
