use crate::model::{CandidateRecord, RawCandidate};
use chrono::{DateTime, Utc};

/// Longest context kept on a record, in characters.
pub const MAX_CONTEXT_CHARS: usize = 240;

/// Turns scored raw candidates into immutable candidate records.
///
/// One builder per extraction run: every record it builds carries the
/// same document id and run timestamp.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    document_id: String,
    extracted_at: DateTime<Utc>,
}

impl RecordBuilder {
    pub fn new(document_id: impl Into<String>, extracted_at: DateTime<Utc>) -> Self {
        RecordBuilder {
            document_id: document_id.into(),
            extracted_at,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }

    pub fn build(&self, raw: RawCandidate, confidence: f64) -> CandidateRecord {
        let context = context_window(&raw.segment.text, raw.span);
        CandidateRecord {
            document_id: self.document_id.clone(),
            field: raw.field,
            provenance: raw.segment.provenance(),
            value: raw.value,
            confidence,
            context,
            keyword: raw.keyword,
            signals: raw.signals,
            extracted_at: self.extracted_at,
            partial: false,
        }
    }
}

/// The segment text, cut to at most `MAX_CONTEXT_CHARS` characters centred
/// on the byte range `span` when the segment is longer.
///
/// A span that is out of range or off a char boundary centres on the start.
pub fn context_window(text: &str, span: (usize, usize)) -> String {
    let total = text.chars().count();
    if total <= MAX_CONTEXT_CHARS {
        return text.to_string();
    }

    let (match_start, match_len) = match (text.get(..span.0), text.get(span.0..span.1)) {
        (Some(before), Some(matched)) => (before.chars().count(), matched.chars().count()),
        _ => (0, 0),
    };

    let centre = match_start + match_len / 2;
    let start = centre
        .saturating_sub(MAX_CONTEXT_CHARS / 2)
        .min(total - MAX_CONTEXT_CHARS);
    text.chars().skip(start).take(MAX_CONTEXT_CHARS).collect()
}
