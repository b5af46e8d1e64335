use super::keywords;
use super::names::{self, NAME_RUN};
use super::{signals, FieldStrategy, Proposal};
use crate::error::StrategyFault;
use crate::model::{FieldKind, RawCandidate, Segment};
use crate::scoring::signal::{ENTITY_TYPE, KEYWORD_PROXIMITY, PATTERN_MATCH};

const KEYWORDS: &[&str] = &[
    "auditor",
    "lead auditor",
    "audited by",
    "inspected by",
    "inspection conducted by",
    "conducted by",
    "compliance manager",
    "monitor",
    "assessor",
    "evaluation by",
];

/// Leading words stripped from a name run before it is considered.
const LABELS: &[&str] = &[
    "lead", "auditor", "auditors", "audited", "by", "inspected", "inspector", "inspection",
    "conducted", "compliance", "manager", "monitor", "assessor", "evaluation", "name", "the",
    "mr", "mrs", "ms", "dr", "team", "senior", "external", "independent", "audit", "report",
];

/// Keyword proximity is full within this many characters.
const NEAR: usize = 50;
/// ...and zero beyond this many.
const FAR: usize = 500;

/// Proposes person and organisation names near auditor keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditorStrategy;

impl FieldStrategy for AuditorStrategy {
    fn field(&self) -> FieldKind {
        FieldKind::Auditor
    }

    fn propose(&self, segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault> {
        let text = segment.text.as_str();
        let hits = keywords::find(text, KEYWORDS);
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for m in NAME_RUN.find_iter(text) {
            let Some(span) = names::trim_span(text, m.start(), m.end(), LABELS) else {
                continue;
            };
            if keywords::overlaps_any(&hits, span) {
                continue;
            }

            let value = &text[span.0..span.1];
            let shape = names::classify(value);
            let (proximity, keyword) = keywords::nearest_proximity(&hits, span, NEAR, FAR);

            tracing::debug!(value, ?shape, proximity, "auditor candidate");
            out.push(
                Proposal {
                    value: value.to_string(),
                    span,
                    keyword,
                    signals: signals(&[
                        (KEYWORD_PROXIMITY, proximity),
                        (PATTERN_MATCH, shape.pattern_match()),
                        (ENTITY_TYPE, shape.entity_type()),
                    ]),
                }
                .into_candidate(FieldKind::Auditor, segment),
            );
        }
        Ok(out)
    }
}
