use crate::error::StrategyFault;
use crate::model::{FieldKind, Provenance, Segment};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contained, non-fatal problem met during an extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWarning {
    /// Where in the document it happened; `None` for whole-run problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldKind>,
    pub message: String,
}

impl RunWarning {
    /// A strategy gave up on one segment.
    pub fn strategy_fault(segment: &Segment, field: FieldKind, fault: &StrategyFault) -> Self {
        RunWarning {
            location: Some(segment.provenance()),
            field: Some(field),
            message: fault.to_string(),
        }
    }

    /// The run stopped before this segment.
    pub fn cancelled(segment: &Segment) -> Self {
        RunWarning {
            location: Some(segment.provenance()),
            field: None,
            message: "run cancelled; remaining segments were not processed".to_string(),
        }
    }

    /// A field's worker died; its candidates are missing from the run.
    pub fn worker_panicked(field: FieldKind) -> Self {
        RunWarning {
            location: None,
            field: Some(field),
            message: "strategy worker panicked; candidates for this field are incomplete".to_string(),
        }
    }

    /// The whole document's worker died before producing a run.
    pub fn run_aborted() -> Self {
        RunWarning {
            location: None,
            field: None,
            message: "document worker panicked; no candidates were produced".to_string(),
        }
    }

    pub fn page(&self) -> Option<u32> {
        self.location.map(|l| l.page)
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.location {
            write!(f, "{location} ")?;
        }
        if let Some(field) = self.field {
            write!(f, "[{field}] ")?;
        }
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineSpan;

    #[test]
    fn test_display() {
        let segment = Segment {
            ordinal: 0,
            page: 3,
            line_span: LineSpan::new(2, 4),
            text: "Audit date: 2023-02-30".into(),
        };
        let fault = StrategyFault::InvalidDate {
            token: "2023-02-30".into(),
        };
        let warning = RunWarning::strategy_fault(&segment, FieldKind::AuditDate, &fault);
        assert_eq!(
            warning.to_string(),
            "p3:2-4 [Audit date] date-shaped token '2023-02-30' is not a valid calendar date"
        );
        assert_eq!(warning.page(), Some(3));
    }

    #[test]
    fn test_panicked_worker_has_no_location() {
        let warning = RunWarning::worker_panicked(FieldKind::Finding);
        assert_eq!(warning.page(), None);
        assert!(warning.to_string().starts_with("[Finding] strategy worker panicked"));
    }
}
