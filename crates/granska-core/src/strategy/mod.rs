pub mod audit_date;
pub mod auditor;
pub mod factory;
pub mod finding;
pub mod keywords;
pub mod names;

use crate::error::StrategyFault;
use crate::model::{FieldKind, RawCandidate, Segment, Signals};

/// Proposes raw candidates for one field from one segment.
///
/// Implementations are stateless. No match is an empty `Vec`; a fault
/// skips the segment for this strategy only.
pub trait FieldStrategy: Send + Sync {
    fn field(&self) -> FieldKind;

    fn propose(&self, segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault>;
}

/// The strategy registered for `field`.
pub fn for_field(field: FieldKind) -> &'static dyn FieldStrategy {
    match field {
        FieldKind::Auditor => &auditor::AuditorStrategy,
        FieldKind::AuditDate => &audit_date::AuditDateStrategy,
        FieldKind::Factory => &factory::FactoryStrategy,
        FieldKind::Finding => &finding::FindingStrategy,
    }
}

pub(crate) fn signals(pairs: &[(&str, f64)]) -> Signals {
    pairs.iter().map(|(name, v)| (name.to_string(), *v)).collect()
}

pub(crate) struct Proposal {
    pub value: String,
    /// Byte range of the matched text within the segment.
    pub span: (usize, usize),
    pub keyword: Option<&'static str>,
    pub signals: Signals,
}

impl Proposal {
    pub fn into_candidate(self, field: FieldKind, segment: &Segment) -> RawCandidate {
        let raw = segment.text.get(self.span.0..self.span.1).unwrap_or_default();
        RawCandidate {
            field,
            value: self.value,
            raw: raw.to_string(),
            span: self.span,
            keyword: self.keyword.map(str::to_string),
            segment: segment.clone(),
            signals: self.signals,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_field() {
        for field in FieldKind::ALL {
            assert_eq!(for_field(field).field(), field);
        }
    }

    #[test]
    fn test_strategies_tolerate_junk() {
        let junk = test_util::seg("\u{fffd}\u{fffd} ;;; 99/99 ::: ,,, ---");
        for field in FieldKind::ALL {
            if let Ok(found) = for_field(field).propose(&junk) {
                assert!(found.iter().all(|c| c.field == field));
            }
        }
    }
}
