//! Report building: per-field selection over candidate records.

use crate::model::{CandidateRecord, FieldKind, Report, ReportField, SelectedValue};
use crate::strategy::names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Default confidence floor for report inclusion.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub min_confidence: f64,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        AggregationOptions {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Whether the candidate set a report is built from is the full result of
/// a run, or was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    #[default]
    Complete,
    Partial,
}

/// Build the report for `document_id` from a candidate set.
///
/// Records of other documents are ignored. Every field is present in the
/// result, empty when nothing qualifies. The report is partial when
/// `completeness` says so or when any of the document's records came from
/// a run that was cut short.
pub fn build_report(
    document_id: &str,
    records: &[CandidateRecord],
    options: &AggregationOptions,
    completeness: Completeness,
    generated_at: DateTime<Utc>,
) -> Report {
    let partial = completeness == Completeness::Partial
        || log_completeness(document_id, records) == Completeness::Partial;

    let mut by_field: BTreeMap<FieldKind, Vec<&CandidateRecord>> = BTreeMap::new();
    for record in records {
        if record.document_id == document_id && record.confidence >= options.min_confidence {
            by_field.entry(record.field).or_default().push(record);
        }
    }

    let fields = FieldKind::ALL
        .into_iter()
        .map(|field| {
            let candidates = by_field.remove(&field).unwrap_or_default();
            let selected_values = match field {
                FieldKind::Auditor => select_auditor(candidates),
                _ if field.is_multi_valued() => {
                    select_distinct(candidates).into_iter().map(selected_value).collect()
                }
                _ => select_best(candidates).into_iter().map(selected_value).collect(),
            };
            let report_field = ReportField {
                field,
                selected_values,
                partial,
            };
            (field, report_field)
        })
        .collect();

    Report {
        document_id: document_id.to_string(),
        generated_at,
        partial,
        fields,
    }
}

/// Confidence descending, then document order, then value.
fn rank(a: &CandidateRecord, b: &CandidateRecord) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.provenance.cmp(&b.provenance))
        .then_with(|| a.value.cmp(&b.value))
}

fn select_best(mut candidates: Vec<&CandidateRecord>) -> Vec<&CandidateRecord> {
    candidates.sort_by(|a, b| rank(a, b));
    candidates.into_iter().take(1).collect()
}

/// The best auditor. When that is a person, the best organisation-shaped
/// auditor candidate is attached as their organisation.
fn select_auditor(mut candidates: Vec<&CandidateRecord>) -> Vec<SelectedValue> {
    candidates.sort_by(|a, b| rank(a, b));
    let Some((best, rest)) = candidates.split_first() else {
        return Vec::new();
    };
    let mut value = selected_value(best);
    if !names::classify(&best.value).organisation {
        value.organisation = rest
            .iter()
            .find(|r| names::classify(&r.value).organisation)
            .map(|r| r.value.clone());
    }
    vec![value]
}

fn select_distinct(candidates: Vec<&CandidateRecord>) -> Vec<&CandidateRecord> {
    let mut best: BTreeMap<String, &CandidateRecord> = BTreeMap::new();
    for record in candidates {
        best.entry(dedup_key(&record.value))
            .and_modify(|kept| {
                if rank(record, *kept) == Ordering::Less {
                    *kept = record;
                }
            })
            .or_insert(record);
    }
    let mut survivors: Vec<&CandidateRecord> = best.into_values().collect();
    survivors.sort_by(|a, b| rank(a, b));
    survivors
}

fn selected_value(record: &CandidateRecord) -> SelectedValue {
    SelectedValue {
        value: record.value.clone(),
        confidence: record.confidence,
        context: record.context.clone(),
        provenance: record.provenance,
        organisation: None,
    }
}

/// Key under which two values of a multi-valued field count as the same:
/// case-folded, whitespace collapsed, trailing `.`, `,` and `/` dropped.
pub fn dedup_key(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(['.', ',', '/', ' '])
        .to_lowercase()
}

/// Completeness of `document_id`'s records as read back from a log.
pub fn log_completeness(document_id: &str, records: &[CandidateRecord]) -> Completeness {
    if records
        .iter()
        .any(|r| r.document_id == document_id && r.partial)
    {
        Completeness::Partial
    } else {
        Completeness::Complete
    }
}

/// Keep only the records of each document's most recent run.
pub fn latest_run(records: &[CandidateRecord]) -> Vec<CandidateRecord> {
    let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for record in records {
        latest
            .entry(record.document_id.as_str())
            .and_modify(|at| *at = (*at).max(record.extracted_at))
            .or_insert(record.extracted_at);
    }
    records
        .iter()
        .filter(|r| latest.get(r.document_id.as_str()) == Some(&r.extracted_at))
        .cloned()
        .collect()
}

/// Document ids in the order they first appear.
pub fn document_ids(records: &[CandidateRecord]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for record in records {
        if !ids.contains(&record.document_id) {
            ids.push(record.document_id.clone());
        }
    }
    ids
}
