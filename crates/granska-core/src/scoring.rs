//! Confidence scoring.
//!
//! Each field has a fixed table of weighted terms. A term is one signal or
//! the product of several, so agreeing evidence earns an extra boost. The
//! score is the weighted sum of the terms, clipped to `[0, 1]`.

use crate::model::{FieldKind, Signals};
use serde::Serialize;

/// Signal names emitted by the strategies.
pub mod signal {
    pub const KEYWORD_PROXIMITY: &str = "keyword_proximity";
    pub const PATTERN_MATCH: &str = "pattern_match";
    pub const ENTITY_TYPE: &str = "entity_type";
    pub const FORMAT_CONFIDENCE: &str = "format_confidence";
    pub const KEYWORD_MATCH: &str = "keyword_match";
    pub const NEGATION_REQUIREMENT: &str = "negation_requirement";
    pub const LIST_MARKER: &str = "list_marker";
    pub const LENGTH_NORM: &str = "length_norm";
}

use signal::*;

/// One weighted term of a field's scoring table.
#[derive(Debug, Clone, Copy)]
pub struct Term {
    pub weight: f64,
    /// Signals multiplied together to form the term.
    pub signals: &'static [&'static str],
}

impl Term {
    const fn new(weight: f64, signals: &'static [&'static str]) -> Self {
        Term { weight, signals }
    }

    pub fn label(&self) -> String {
        self.signals.join(" × ")
    }

    fn value(&self, signals: &Signals) -> f64 {
        self.signals
            .iter()
            .map(|name| clamp_signal(signals.get(*name).copied()))
            .product()
    }
}

const AUDITOR: &[Term] = &[
    Term::new(0.40, &[KEYWORD_PROXIMITY]),
    Term::new(0.20, &[PATTERN_MATCH]),
    Term::new(0.20, &[ENTITY_TYPE]),
    Term::new(0.05, &[KEYWORD_PROXIMITY, PATTERN_MATCH]),
    Term::new(0.05, &[KEYWORD_PROXIMITY, ENTITY_TYPE]),
    Term::new(0.05, &[PATTERN_MATCH, ENTITY_TYPE]),
    Term::new(0.05, &[KEYWORD_PROXIMITY, PATTERN_MATCH, ENTITY_TYPE]),
];

const AUDIT_DATE: &[Term] = &[
    Term::new(0.45, &[FORMAT_CONFIDENCE]),
    Term::new(0.45, &[KEYWORD_PROXIMITY]),
    Term::new(0.10, &[FORMAT_CONFIDENCE, KEYWORD_PROXIMITY]),
];

const FACTORY: &[Term] = &[
    Term::new(0.40, &[KEYWORD_PROXIMITY]),
    Term::new(0.25, &[PATTERN_MATCH]),
    Term::new(0.15, &[ENTITY_TYPE]),
    Term::new(0.10, &[KEYWORD_PROXIMITY, PATTERN_MATCH]),
    Term::new(0.10, &[KEYWORD_PROXIMITY, ENTITY_TYPE]),
];

/// One pattern plus a sentence-sized body clears the default floor; a bare
/// "Findings:" heading does not.
const FINDING: &[Term] = &[
    Term::new(0.28, &[KEYWORD_MATCH]),
    Term::new(0.28, &[NEGATION_REQUIREMENT]),
    Term::new(0.04, &[LIST_MARKER]),
    Term::new(0.34, &[LENGTH_NORM]),
    Term::new(0.02, &[KEYWORD_MATCH, LIST_MARKER]),
    Term::new(0.02, &[NEGATION_REQUIREMENT, LIST_MARKER]),
    Term::new(0.02, &[KEYWORD_MATCH, NEGATION_REQUIREMENT]),
];

/// The weight table for a field.
pub fn weights(field: FieldKind) -> &'static [Term] {
    match field {
        FieldKind::Auditor => AUDITOR,
        FieldKind::AuditDate => AUDIT_DATE,
        FieldKind::Factory => FACTORY,
        FieldKind::Finding => FINDING,
    }
}

/// Combine a candidate's signals into a confidence in `[0, 1]`.
///
/// Pure and deterministic. Unknown signal names are ignored, missing ones
/// count as 0, and out-of-range or NaN values are clamped before use.
pub fn score(field: FieldKind, signals: &Signals) -> f64 {
    let total: f64 = weights(field)
        .iter()
        .map(|term| term.weight * term.value(signals))
        .sum();
    total.clamp(0.0, 1.0)
}

/// Per-term contribution to a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub term: String,
    pub weight: f64,
    pub value: f64,
    pub contribution: f64,
}

/// Break a score down into its terms, in table order.
pub fn explain(field: FieldKind, signals: &Signals) -> Vec<Contribution> {
    weights(field)
        .iter()
        .map(|term| {
            let value = term.value(signals);
            Contribution {
                term: term.label(),
                weight: term.weight,
                value,
                contribution: term.weight * value,
            }
        })
        .collect()
}

fn clamp_signal(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_nan() => 0.0,
        Some(v) => v.clamp(0.0, 1.0),
        None => 0.0,
    }
}
