use granska_core::aggregate::DEFAULT_MIN_CONFIDENCE;
use granska_core::error::GranskaError;
use granska_core::model::FieldKind;
use granska_core::store::{CandidateLog, JsonlCandidateLog};
use std::path::PathBuf;

use crate::commands::report::check_floor;
use crate::output;

pub fn run(
    log_file: PathBuf,
    document_id: Option<String>,
    field: Option<String>,
    min_confidence: Option<f64>,
) -> Result<(), GranskaError> {
    let floor = resolve_floor(min_confidence)?;
    let field = field
        .map(|name| FieldKind::from_str_loose(&name).ok_or(GranskaError::UnknownField(name)))
        .transpose()?;

    let log = JsonlCandidateLog::new(&log_file);
    let mut records = match &document_id {
        Some(id) => log.read_document(id)?,
        None => log.read_all()?,
    };
    if let Some(field) = field {
        records.retain(|r| r.field == field);
    }

    output::table::print_candidates(&records, floor);
    Ok(())
}

/// The floor below which candidates are flagged.
fn resolve_floor(min_confidence: Option<f64>) -> Result<f64, GranskaError> {
    Ok(check_floor(min_confidence)?.unwrap_or(DEFAULT_MIN_CONFIDENCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_defaults_and_overrides() {
        assert_eq!(resolve_floor(None).unwrap(), DEFAULT_MIN_CONFIDENCE);
        assert_eq!(resolve_floor(Some(0.3)).unwrap(), 0.3);
        assert_eq!(resolve_floor(Some(0.0)).unwrap(), 0.0);
        assert!(matches!(resolve_floor(Some(-0.1)), Err(GranskaError::InvalidConfig(_))));
    }
}
