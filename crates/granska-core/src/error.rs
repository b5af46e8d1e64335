use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GranskaError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("unknown field '{0}'. Expected one of: auditor, date, factory, findings, all")]
    UnknownField(String),

    #[error("candidate log {path}: line {line} is not a valid record: {reason}")]
    CorruptLogLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A contained failure of one strategy on one segment.
///
/// Never escapes the pipeline: the segment is skipped for that strategy and
/// the fault is recorded as a run warning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyFault {
    #[error("date-shaped token '{token}' is not a valid calendar date")]
    InvalidDate { token: String },
}
