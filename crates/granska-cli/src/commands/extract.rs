use granska_core::config::{ExtractConfig, FieldSelection};
use granska_core::error::GranskaError;
use granska_core::source::pdftotext::PdftotextSource;
use granska_core::source::plain::PlainTextSource;
use granska_core::source::TextSource;
use granska_core::store::{CandidateLog, JsonlCandidateLog};
use std::path::{Path, PathBuf};

use crate::output;

pub struct ExtractArgs {
    pub input_file: PathBuf,
    pub extract: Vec<String>,
    pub min_confidence: Option<f64>,
    pub config: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub document_id: Option<String>,
    pub parallel: bool,
    pub output_format: String,
    pub show_candidates: bool,
}

pub fn run(args: ExtractArgs) -> Result<(), GranskaError> {
    let config = effective_config(&args)?;

    let document_id = args
        .document_id
        .clone()
        .unwrap_or_else(|| file_stem(&args.input_file));

    // Anything that is not plain text goes through pdftotext
    let is_text = args
        .input_file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    let source: Box<dyn TextSource> = if is_text {
        Box::new(PlainTextSource)
    } else {
        Box::new(PdftotextSource::new())
    };

    let bytes = std::fs::read(&args.input_file)?;
    let run = granska_core::extract_pdf(&bytes, source.as_ref(), &document_id, &config)?;

    let log_path = args
        .log
        .clone()
        .unwrap_or_else(|| default_log_path(&args.input_file));
    let log = JsonlCandidateLog::new(&log_path);
    log.append(&run.records)?;
    tracing::info!(path = %log_path.display(), records = run.records.len(), "candidates logged");

    for warning in &run.warnings {
        eprintln!("Warning: {warning}");
    }

    let report = run.report(&config.aggregation(), chrono::Utc::now());
    match args.output_format.as_str() {
        "json" => {
            if args.show_candidates {
                output::json::print_run(&report, &run.records)?
            } else {
                output::json::print(&report)?
            }
        }
        _ => {
            output::table::print_report(&report);
            if args.show_candidates {
                println!();
                output::table::print_candidates(&run.records, config.min_confidence);
            }
        }
    }

    Ok(())
}

/// Config file first, then command-line overrides.
fn effective_config(args: &ExtractArgs) -> Result<ExtractConfig, GranskaError> {
    let mut config = match &args.config {
        Some(path) => ExtractConfig::load(path)?,
        None => ExtractConfig::default(),
    };
    if !args.extract.is_empty() {
        config.extract = FieldSelection::parse_list(&args.extract)?;
    }
    if let Some(min_confidence) = args.min_confidence {
        config.min_confidence = min_confidence;
    }
    if args.parallel {
        config.parallel_strategies = true;
    }
    config.validate()?;
    Ok(config)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// `<dir>/<stem>.candidates.jsonl` next to the input.
fn default_log_path(input: &Path) -> PathBuf {
    input.with_file_name(format!("{}.candidates.jsonl", file_stem(input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ExtractArgs {
        ExtractArgs {
            input_file: PathBuf::from("audits/sunrise-2024.pdf"),
            extract: Vec::new(),
            min_confidence: None,
            config: None,
            log: None,
            document_id: None,
            parallel: false,
            output_format: "table".into(),
            show_candidates: false,
        }
    }

    #[test]
    fn test_default_log_path_next_to_input() {
        assert_eq!(
            default_log_path(Path::new("audits/sunrise-2024.pdf")),
            PathBuf::from("audits/sunrise-2024.candidates.jsonl")
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let mut a = args();
        a.extract = vec!["date".into(), "supplier".into()];
        a.min_confidence = Some(0.8);
        a.parallel = true;
        let config = effective_config(&a).unwrap();
        assert!(!config.extract.is_all());
        assert_eq!(config.min_confidence, 0.8);
        assert!(config.parallel_strategies);
    }

    #[test]
    fn test_bad_floor_rejected() {
        let mut a = args();
        a.min_confidence = Some(2.0);
        assert!(effective_config(&a).is_err());
    }
}
