use super::keywords;
use super::{signals, FieldStrategy, Proposal};
use crate::error::StrategyFault;
use crate::model::{FieldKind, RawCandidate, Segment};
use crate::scoring::signal::{KEYWORD_MATCH, LENGTH_NORM, LIST_MARKER, NEGATION_REQUIREMENT};
use crate::segment::strip_list_marker;

const NONCOMPLIANCE: &[&str] = &[
    "non-compliance",
    "noncompliance",
    "non-conformance",
    "nonconformance",
    "non-conformity",
    "nonconformity",
    "violation",
    "violations",
    "finding",
    "findings",
    "issue",
    "issues",
    "deficiency",
    "deficiencies",
    "breach",
    "corrective action",
    "not compliant",
];

const NEGATIONS: &[&str] = &[
    "not",
    "no",
    "without",
    "failed to",
    "fail to",
    "lack of",
    "lacking",
    "missing",
    "insufficient",
    "inadequate",
    "absent",
    "expired",
];

const REQUIREMENTS: &[&str] = &[
    "required",
    "requirement",
    "requirements",
    "provided",
    "maintained",
    "records",
    "record",
    "policy",
    "procedure",
    "procedures",
    "permit",
    "permits",
    "license",
    "licence",
    "training",
    "equipment",
    "documentation",
    "documented",
    "certificate",
    "ppe",
    "posted",
];

/// Word count range that reads like a single finding.
const MIN_WORDS: usize = 5;
const MAX_WORDS: usize = 60;

/// Proposes whole sentences that describe a non-compliance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindingStrategy;

impl FieldStrategy for FindingStrategy {
    fn field(&self) -> FieldKind {
        FieldKind::Finding
    }

    fn propose(&self, segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault> {
        let (listed, body) = strip_list_marker(&segment.text);
        let body = body.trim();
        if body.is_empty() {
            return Ok(Vec::new());
        }

        let keyword_hits = keywords::find(body, NONCOMPLIANCE);
        let negated_requirement = !keywords::find(body, NEGATIONS).is_empty()
            && !keywords::find(body, REQUIREMENTS).is_empty();
        if keyword_hits.is_empty() && !negated_requirement {
            return Ok(Vec::new());
        }

        let words = body.split_whitespace().count();
        let keyword = keyword_hits.first().map(|h| h.keyword);
        tracing::debug!(words, listed, negated_requirement, ?keyword, "finding candidate");

        let candidate = Proposal {
            value: body.to_string(),
            span: (0, segment.text.len()),
            keyword,
            signals: signals(&[
                (KEYWORD_MATCH, indicator(!keyword_hits.is_empty())),
                (NEGATION_REQUIREMENT, indicator(negated_requirement)),
                (LIST_MARKER, indicator(listed)),
                (LENGTH_NORM, length_norm(words)),
            ]),
        }
        .into_candidate(FieldKind::Finding, segment);
        Ok(vec![candidate])
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// 1.0 inside the expected word range, falling linearly outside it.
fn length_norm(words: usize) -> f64 {
    if words < MIN_WORDS {
        words as f64 / MIN_WORDS as f64
    } else if words <= MAX_WORDS {
        1.0
    } else {
        (1.0 - (words - MAX_WORDS) as f64 / MAX_WORDS as f64).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring;
    use crate::strategy::test_util::seg;

    fn propose(text: &str) -> Vec<RawCandidate> {
        FindingStrategy.propose(&seg(text)).unwrap()
    }

    #[test]
    fn test_listed_negated_requirement() {
        let found = propose("1. No fire drill records were maintained.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "No fire drill records were maintained.");
        assert_eq!(found[0].signals[LIST_MARKER], 1.0);
        assert_eq!(found[0].signals[NEGATION_REQUIREMENT], 1.0);
        assert_eq!(found[0].signals[KEYWORD_MATCH], 0.0);
        assert!(scoring::score(FieldKind::Finding, &found[0].signals) >= 0.6);
    }

    #[test]
    fn test_keyword_sentence() {
        let found = propose("Non-compliance: emergency exits were locked during working hours.");
        assert_eq!(found[0].keyword.as_deref(), Some("non-compliance"));
        assert_eq!(found[0].signals[LIST_MARKER], 0.0);
    }

    #[test]
    fn test_prose_finding_clears_default_floor() {
        for text in [
            "Non-compliance: emergency exits were locked during working hours.",
            "The factory did not provide overtime records.",
        ] {
            let found = propose(text);
            assert_eq!(found.len(), 1, "{text}");
            let confidence = scoring::score(FieldKind::Finding, &found[0].signals);
            assert!(confidence >= 0.6, "{text}: {confidence}");
        }
    }

    #[test]
    fn test_section_heading_stays_below_floor() {
        let found = propose("Findings:");
        assert_eq!(found.len(), 1);
        assert!(scoring::score(FieldKind::Finding, &found[0].signals) < 0.6);
    }

    #[test]
    fn test_plain_sentence_is_not_a_finding() {
        assert!(propose("The factory employs 450 workers across two shifts.").is_empty());
        assert!(propose("Notice boards were posted in the canteen.").is_empty());
    }

    #[test]
    fn test_length_norm() {
        assert_eq!(length_norm(1), 0.2);
        assert_eq!(length_norm(5), 1.0);
        assert_eq!(length_norm(60), 1.0);
        assert_eq!(length_norm(90), 0.5);
        assert_eq!(length_norm(500), 0.0);
    }
}
