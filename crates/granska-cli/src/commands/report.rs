use granska_core::aggregate::{self, AggregationOptions, Completeness};
use granska_core::error::GranskaError;
use granska_core::model::Report;
use granska_core::store::{CandidateLog, JsonlCandidateLog};
use std::path::PathBuf;

use crate::output;

pub fn run(
    log_file: PathBuf,
    document_id: Option<String>,
    min_confidence: Option<f64>,
    latest_run: bool,
    output_format: &str,
    out: Option<PathBuf>,
) -> Result<(), GranskaError> {
    let mut options = AggregationOptions::default();
    if let Some(min_confidence) = check_floor(min_confidence)? {
        options.min_confidence = min_confidence;
    }

    let log = JsonlCandidateLog::new(&log_file);
    let mut records = match &document_id {
        Some(id) => log.read_document(id)?,
        None => log.read_all()?,
    };
    if latest_run {
        records = aggregate::latest_run(&records);
    }

    let ids = match document_id {
        Some(id) => vec![id],
        None => aggregate::document_ids(&records),
    };
    let generated_at = chrono::Utc::now();
    let reports: Vec<Report> = ids
        .iter()
        .map(|id| {
            let own: Vec<_> = records
                .iter()
                .filter(|r| &r.document_id == id)
                .cloned()
                .collect();
            let completeness = aggregate::log_completeness(id, &own);
            if completeness == Completeness::Partial {
                tracing::warn!(document_id = %id, "log holds a run that was cut short");
            }
            aggregate::build_report(id, &own, &options, completeness, generated_at)
        })
        .collect();

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(&path, json)?;
        eprintln!("Wrote {} report(s) to {}", reports.len(), path.display());
        return Ok(());
    }

    match output_format {
        "json" => output::json::print(&reports)?,
        _ => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                output::table::print_report(report);
            }
        }
    }
    Ok(())
}

/// Reject a `--min-confidence` outside `[0, 1]`.
pub fn check_floor(min_confidence: Option<f64>) -> Result<Option<f64>, GranskaError> {
    match min_confidence {
        Some(x) if !(0.0..=1.0).contains(&x) => Err(GranskaError::InvalidConfig(format!(
            "--min-confidence must be within [0, 1], got {x}"
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_floor() {
        assert_eq!(check_floor(None).unwrap(), None);
        assert_eq!(check_floor(Some(0.75)).unwrap(), Some(0.75));
        assert!(check_floor(Some(1.2)).is_err());
        assert!(check_floor(Some(f64::NAN)).is_err());
    }
}
