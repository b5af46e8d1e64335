pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod scoring;
pub mod segment;
pub mod source;
pub mod store;
pub mod strategy;
pub mod trace;

pub use aggregate::{build_report, AggregationOptions, Completeness};
use chrono::Utc;
use config::ExtractConfig;
use error::GranskaError;
use pipeline::{ExtractionRun, Pipeline};
use source::TextSource;

/// Extract scored candidates from already paginated text.
///
/// All records of the run share one `extracted_at` stamp.
pub fn extract_text(
    document_id: &str,
    pages: &[String],
    config: &ExtractConfig,
) -> Result<ExtractionRun, GranskaError> {
    let pipeline = Pipeline::new(config.clone())?;
    Ok(pipeline.run(document_id, pages, Utc::now()))
}

/// Main API entry point: extract scored candidates from a PDF.
///
/// Text extraction goes through `source`; a document without any text
/// yields an empty run, not an error.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    source: &dyn TextSource,
    document_id: &str,
    config: &ExtractConfig,
) -> Result<ExtractionRun, GranskaError> {
    let pages = source.extract_pages(pdf_bytes)?;
    tracing::info!(document_id, backend = source.backend_name(), pages = pages.len(), "text extracted");
    extract_text(document_id, &pages, config)
}
