use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named scoring inputs produced by a strategy, keyed by signal name.
pub type Signals = BTreeMap<String, f64>;

/// The semantic fields extracted from an audit report.
///
/// Variant order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Auditor,
    AuditDate,
    Factory,
    Finding,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Auditor,
        FieldKind::AuditDate,
        FieldKind::Factory,
        FieldKind::Finding,
    ];

    /// Multi-valued fields keep every distinct qualifying candidate;
    /// single-valued fields keep only the best one.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, FieldKind::Factory | FieldKind::Finding)
    }

    /// Snake-case key, as used in JSON output and candidate logs.
    pub fn key(self) -> &'static str {
        match self {
            FieldKind::Auditor => "auditor",
            FieldKind::AuditDate => "audit_date",
            FieldKind::Factory => "factory",
            FieldKind::Finding => "finding",
        }
    }

    /// Parse a field name leniently, accepting the CLI aliases.
    pub fn from_str_loose(s: &str) -> Option<FieldKind> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auditor" | "auditors" => Some(FieldKind::Auditor),
            "date" | "audit_date" | "auditdate" => Some(FieldKind::AuditDate),
            "factory" | "factories" | "supplier" | "suppliers" => Some(FieldKind::Factory),
            "finding" | "findings" => Some(FieldKind::Finding),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Auditor => write!(f, "Auditor"),
            FieldKind::AuditDate => write!(f, "Audit date"),
            FieldKind::Factory => write!(f, "Factory"),
            FieldKind::Finding => write!(f, "Finding"),
        }
    }
}

/// Inclusive, 1-based range of lines within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        LineSpan {
            start,
            end: end.max(start),
        }
    }

    pub fn single(line: usize) -> Self {
        LineSpan::new(line, line)
    }
}

impl fmt::Display for LineSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Where a value came from in the source document.
///
/// Orders by page, then line span, which is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub page: u32,
    pub line_span: LineSpan,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}:{}", self.page, self.line_span)
    }
}

/// A contiguous unit of normalized text with page/line provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// 0-based position of the segment in the document.
    pub ordinal: usize,
    /// 1-based page number.
    pub page: u32,
    pub line_span: LineSpan,
    pub text: String,
}

impl Segment {
    pub fn provenance(&self) -> Provenance {
        Provenance {
            page: self.page,
            line_span: self.line_span,
        }
    }
}

/// An unscored extraction proposal for one field from one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub field: FieldKind,
    /// Normalized value (e.g. ISO date).
    pub value: String,
    /// The text as matched in the segment.
    pub raw: String,
    /// Byte range of `raw` within `segment.text`.
    pub span: (usize, usize),
    /// Field keyword the value was found near, if any.
    pub keyword: Option<String>,
    pub segment: Segment,
    pub signals: Signals,
}

/// An immutable, scored extraction result, as appended to the candidate log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub document_id: String,
    pub field: FieldKind,
    pub value: String,
    pub confidence: f64,
    pub context: String,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default)]
    pub signals: Signals,
    pub extracted_at: DateTime<Utc>,
    /// Set on every record of a run that was cut short, so that reports
    /// rebuilt from the log stay marked partial.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

/// One value chosen for a report field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedValue {
    pub value: String,
    pub confidence: f64,
    pub context: String,
    pub provenance: Provenance,
    /// Auditor only: the organisation named alongside a person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportField {
    pub field: FieldKind,
    pub selected_values: Vec<SelectedValue>,
    /// True when built from a truncated (aborted) candidate set.
    #[serde(default)]
    pub partial: bool,
}

impl ReportField {
    pub fn empty(field: FieldKind) -> Self {
        ReportField {
            field,
            selected_values: Vec::new(),
            partial: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_values.is_empty()
    }

    /// The best value, i.e. the first selected one.
    pub fn best(&self) -> Option<&SelectedValue> {
        self.selected_values.first()
    }
}

/// A derived view over the candidate log for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub document_id: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub partial: bool,
    pub fields: BTreeMap<FieldKind, ReportField>,
}

impl Report {
    pub fn field(&self, field: FieldKind) -> Option<&ReportField> {
        self.fields.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(ReportField::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_aliases() {
        assert_eq!(FieldKind::from_str_loose("date"), Some(FieldKind::AuditDate));
        assert_eq!(FieldKind::from_str_loose("Supplier"), Some(FieldKind::Factory));
        assert_eq!(FieldKind::from_str_loose("findings"), Some(FieldKind::Finding));
        assert_eq!(FieldKind::from_str_loose("audit-date"), Some(FieldKind::AuditDate));
        assert_eq!(FieldKind::from_str_loose("signature"), None);
    }

    #[test]
    fn test_multi_valued_fields() {
        assert!(!FieldKind::Auditor.is_multi_valued());
        assert!(!FieldKind::AuditDate.is_multi_valued());
        assert!(FieldKind::Factory.is_multi_valued());
        assert!(FieldKind::Finding.is_multi_valued());
    }

    #[test]
    fn test_provenance_orders_by_page_then_line() {
        let a = Provenance {
            page: 1,
            line_span: LineSpan::new(9, 9),
        };
        let b = Provenance {
            page: 2,
            line_span: LineSpan::new(1, 1),
        };
        let c = Provenance {
            page: 2,
            line_span: LineSpan::new(3, 4),
        };
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_field_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FieldKind::AuditDate).unwrap();
        assert_eq!(json, "\"audit_date\"");
    }
}
