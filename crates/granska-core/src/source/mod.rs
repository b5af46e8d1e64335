pub mod pdftotext;
pub mod plain;

use crate::error::GranskaError;

/// Trait for document-to-text backends.
///
/// Implementations return one string per page, in document order. Blank
/// pages are kept so that page numbers stay aligned with the source.
pub trait TextSource: Send + Sync {
    /// Extract page texts from the raw document bytes.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, GranskaError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Split text on form feeds (the page separator pdftotext emits).
///
/// A trailing empty page after the final form feed is dropped.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(|p| p.to_string()).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_on_form_feed() {
        let pages = split_pages("page one\x0cpage two\x0c");
        assert_eq!(pages, vec!["page one", "page two"]);
    }

    #[test]
    fn test_split_pages_keeps_inner_blank_page() {
        let pages = split_pages("one\x0c\x0cthree");
        assert_eq!(pages.len(), 3);
        assert!(pages[1].is_empty());
    }

    #[test]
    fn test_split_pages_without_separator() {
        assert_eq!(split_pages("single page"), vec!["single page"]);
    }
}
