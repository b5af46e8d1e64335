use super::keywords;
use super::names::{self, COMPANY, NAME_RUN};
use super::{signals, FieldStrategy, Proposal};
use crate::error::StrategyFault;
use crate::model::{FieldKind, RawCandidate, Segment};
use crate::scoring::signal::{ENTITY_TYPE, KEYWORD_PROXIMITY, PATTERN_MATCH};
use regex::Regex;
use std::sync::LazyLock;

const KEYWORDS: &[&str] = &[
    "factory",
    "factories",
    "facility",
    "facilities",
    "supplier",
    "suppliers",
    "plant",
    "plants",
    "mill",
    "mills",
    "manufacturer",
    "manufacturers",
    "contract factory",
    "production site",
    "monitoring firm",
];

const LABELS: &[&str] = &[
    "factory", "factories", "facility", "supplier", "plant", "mill", "manufacturer",
    "contract", "production", "site", "monitoring", "firm", "name", "the", "audited", "at",
];

/// "Factory name:" style labels; the capitalized run after one is a name.
static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:factory|supplier|facility|plant|mill|manufacturer|site)\s+name\s*:\s*")
        .expect("valid name label regex")
});

const NEAR: usize = 100;
const FAR: usize = 700;

/// Proposes factory and supplier names near supplier keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryStrategy;

impl FieldStrategy for FactoryStrategy {
    fn field(&self) -> FieldKind {
        FieldKind::Factory
    }

    fn propose(&self, segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault> {
        let text = segment.text.as_str();
        let hits = keywords::find(text, KEYWORDS);
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let mut found: Vec<((usize, usize), names::NameShape)> = Vec::new();

        for m in COMPANY.find_iter(text) {
            if let Some(span) = names::trim_span(text, m.start(), m.end(), LABELS) {
                found.push((span, names::classify(&text[span.0..span.1])));
            }
        }

        for label in NAME_LABEL.find_iter(text) {
            let rest = &text[label.end()..];
            let Some(run) = NAME_RUN.find(rest).filter(|r| r.start() == 0) else {
                continue;
            };
            let (start, end) = (label.end(), label.end() + run.end());
            let Some(span) = names::trim_span(text, start, end, LABELS) else {
                continue;
            };
            if found.iter().any(|(s, _)| keywords::distance(*s, span) < 0) {
                continue;
            }
            // The label asserts the run is a facility name.
            let mut shape = names::classify(&text[span.0..span.1]);
            shape.organisation = true;
            found.push((span, shape));
        }

        found.sort_by_key(|(span, _)| *span);

        let out = found
            .into_iter()
            .map(|(span, shape)| {
                let value = &text[span.0..span.1];
                let (proximity, keyword) = keywords::nearest_proximity(&hits, span, NEAR, FAR);
                tracing::debug!(value, proximity, ?keyword, "factory candidate");
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
                .into_candidate(FieldKind::Factory, segment)
            })
            .collect();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring;
    use crate::strategy::test_util::seg;

    #[test]
    fn test_company_after_keyword() {
        let found = FactoryStrategy
            .propose(&seg("Supplier: ABC Garments Co., Ltd. was audited."))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "ABC Garments Co., Ltd");
        assert_eq!(found[0].keyword.as_deref(), Some("supplier"));
        assert!((scoring::score(FieldKind::Factory, &found[0].signals) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_name_label_capture() {
        let found = FactoryStrategy
            .propose(&seg("Factory name: SRK Knitwear, Dhaka"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "SRK Knitwear");
        assert_eq!(found[0].signals[PATTERN_MATCH], 0.5);
        assert_eq!(found[0].signals[ENTITY_TYPE], 1.0);
    }

    #[test]
    fn test_several_suppliers_in_one_segment() {
        let found = FactoryStrategy
            .propose(&seg("Suppliers visited: North Mill Ltd and Delta Dyeing Inc."))
            .unwrap();
        let values: Vec<&str> = found.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["North Mill Ltd", "Delta Dyeing Inc"]);
    }

    #[test]
    fn test_requires_supplier_keyword() {
        assert!(FactoryStrategy
            .propose(&seg("Audited by Beta Audit Co"))
            .unwrap()
            .is_empty());
    }
}
