use super::keywords;
use super::{signals, FieldStrategy, Proposal};
use crate::error::StrategyFault;
use crate::model::{FieldKind, RawCandidate, Segment};
use crate::scoring::signal::{FORMAT_CONFIDENCE, KEYWORD_PROXIMITY};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::sync::LazyLock;

const KEYWORDS: &[&str] = &[
    "audit date",
    "date of audit",
    "inspection date",
    "date of inspection",
    "audit period",
    "review date",
    "visit date",
    "assessment date",
    "audited on",
    "inspected on",
    "audit conducted",
];

/// Full date, month precision, ambiguous day/month order.
const FULL: f64 = 1.0;
const MONTH_ONLY: f64 = 0.8;
const AMBIGUOUS: f64 = 0.5;

/// Proximity falls from 1.0 when adjacent to 0.0 at this distance.
const FAR: usize = 200;

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

#[derive(Debug, Clone, Copy)]
enum Format {
    Iso,
    DayMonthYear,
    MonthDayYear,
    NumericSlash,
    NumericDot,
    MonthYear,
}

/// Date patterns, most specific first. Later patterns never claim text an
/// earlier one already matched.
static PATTERNS: LazyLock<Vec<(Format, Regex)>> = LazyLock::new(|| {
    let build = |p: &str| Regex::new(p).expect("valid date regex");
    vec![
        (Format::Iso, build(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b")),
        (
            Format::DayMonthYear,
            build(&format!(r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+{MONTH}\.?,?\s+(\d{{4}})\b")),
        ),
        (
            Format::MonthDayYear,
            build(&format!(r"(?i)\b{MONTH}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b")),
        ),
        (Format::NumericSlash, build(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")),
        (Format::NumericDot, build(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b")),
        (Format::MonthYear, build(&format!(r"(?i)\b{MONTH}\.?,?\s+(\d{{4}})\b"))),
    ]
});

/// Proposes dates, normalized to ISO, scored by format and by nearness to
/// audit-date keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditDateStrategy;

impl FieldStrategy for AuditDateStrategy {
    fn field(&self) -> FieldKind {
        FieldKind::AuditDate
    }

    fn propose(&self, segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault> {
        let text = segment.text.as_str();
        let hits = keywords::find(text, KEYWORDS);

        let mut found: Vec<((usize, usize), String, f64)> = Vec::new();
        for (format, regex) in PATTERNS.iter() {
            for caps in regex.captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                let span = (m.start(), m.end());
                if found.iter().any(|(s, _, _)| keywords::distance(*s, span) < 0) {
                    continue;
                }
                let (value, format_confidence) = normalize(*format, &caps)?;
                found.push((span, value, format_confidence));
            }
        }
        found.sort_by_key(|(span, _, _)| *span);

        let out = found
            .into_iter()
            .map(|(span, value, format_confidence)| {
                let (proximity, keyword) = keywords::nearest_proximity(&hits, span, 0, FAR);
                tracing::debug!(%value, format_confidence, proximity, "date candidate");
                Proposal {
                    value,
                    span,
                    keyword,
                    signals: signals(&[
                        (FORMAT_CONFIDENCE, format_confidence),
                        (KEYWORD_PROXIMITY, proximity),
                    ]),
                }
                .into_candidate(FieldKind::AuditDate, segment)
            })
            .collect();
        Ok(out)
    }
}

/// Normalize a matched date to `YYYY-MM-DD` (or `YYYY-MM`) and rate the
/// certainty of its reading.
fn normalize(format: Format, caps: &Captures) -> Result<(String, f64), StrategyFault> {
    let token = caps.get(0).map_or("", |m| m.as_str());
    let num = |i: usize| -> u32 { caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0) };
    let year = |i: usize| -> i32 { caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0) };
    let month = |i: usize| -> u32 { caps.get(i).map_or(0, |m| month_number(m.as_str())) };

    let (y, m, d, confidence) = match format {
        Format::Iso => (year(1), num(2), num(3), FULL),
        Format::DayMonthYear => (year(3), month(2), num(1), FULL),
        Format::MonthDayYear => (year(3), month(1), num(2), FULL),
        Format::NumericDot => (year(3), num(2), num(1), FULL),
        Format::NumericSlash => {
            let (a, b) = (num(1), num(2));
            match (a > 12, b > 12) {
                (true, false) => (year(3), b, a, FULL),
                (false, true) => (year(3), a, b, FULL),
                // Day-first unless the two readings coincide.
                (false, false) if a == b => (year(3), b, a, FULL),
                (false, false) => (year(3), b, a, AMBIGUOUS),
                (true, true) => {
                    return Err(StrategyFault::InvalidDate {
                        token: token.to_string(),
                    })
                }
            }
        }
        Format::MonthYear => {
            let (y, m) = (year(2), month(1));
            return match NaiveDate::from_ymd_opt(y, m, 1) {
                Some(date) => Ok((date.format("%Y-%m").to_string(), MONTH_ONLY)),
                None => Err(StrategyFault::InvalidDate {
                    token: token.to_string(),
                }),
            };
        }
    };

    NaiveDate::from_ymd_opt(y, m, d)
        .map(|date| (date.format("%Y-%m-%d").to_string(), confidence))
        .ok_or_else(|| StrategyFault::InvalidDate {
            token: token.to_string(),
        })
}

fn month_number(name: &str) -> u32 {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 0,
    }
}
