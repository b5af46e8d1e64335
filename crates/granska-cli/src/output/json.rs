use granska_core::error::GranskaError;
use granska_core::model::{CandidateRecord, Report};
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), GranskaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct RunOutput<'a> {
    report: &'a Report,
    candidates: &'a [CandidateRecord],
}

/// Report plus every candidate of the run.
pub fn print_run(report: &Report, candidates: &[CandidateRecord]) -> Result<(), GranskaError> {
    print(&RunOutput { report, candidates })
}
