use crate::error::GranskaError;
use crate::source::{split_pages, TextSource};

/// Text backend for documents that are already plain text.
///
/// Pages are separated by form feeds; a file without any is one page.
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, GranskaError> {
        let text = String::from_utf8_lossy(bytes);
        Ok(split_pages(&text))
    }

    fn backend_name(&self) -> &str {
        "plain"
    }
}
