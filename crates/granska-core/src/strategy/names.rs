//! Proper-noun spans: capitalized runs, company names and their shapes.

use regex::Regex;
use std::sync::LazyLock;

/// A run of capitalized tokens, e.g. "Mr. J. Smith" or "Smith & Jones LLP".
pub static NAME_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z'&-]*\.?(?:[ \t]+(?:[A-Z][A-Za-z'&-]*\.?|&))*")
        .expect("valid name run regex")
});

/// Capitalized words followed by one or more corporate suffixes,
/// e.g. "ABC Garments Co., Ltd".
pub static COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][A-Za-z0-9&'-]*\.?(?:\s+(?:[A-Z][A-Za-z0-9&'-]*\.?|&|and|of))*?\s+(?:(?i:co|ltd|limited|inc|incorporated|corporation|corp|company|llc|llp|gmbh|plc|pvt)\b\.?,?\s*)+",
    )
    .expect("valid company regex")
});

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid token regex"));

static PERSON_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Z][a-z]+(?:-[A-Z][a-z]+)?|[A-Z]\.?)$").expect("valid person token regex")
});

const COMPANY_SUFFIXES: &[&str] = &[
    "co", "ltd", "limited", "inc", "incorporated", "corporation", "corp", "company", "llc",
    "llp", "gmbh", "plc", "pvt",
];

/// Words that mark a capitalized run as an organisation name.
const ORG_WORDS: &[&str] = &[
    "audit", "auditing", "services", "service", "group", "consulting", "consultants",
    "certification", "international", "associates", "solutions", "partners", "bureau",
    "agency", "inspection", "inspections", "assurance", "institute", "laboratories",
    "labs", "textiles", "textile", "garments", "garment", "apparel", "manufacturing",
    "industries", "industrial", "enterprises", "trading", "holdings", "factory", "mills",
];

/// The shape of a proper-noun span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameShape {
    /// `Firstname [M.] Lastname`.
    pub person: bool,
    /// Ends in (or contains) a corporate suffix.
    pub corporate: bool,
    /// Corporate, organisation vocabulary, or an acronym.
    pub organisation: bool,
}

impl NameShape {
    /// 1.0 for a full person or company pattern, 0.5 for a bare run.
    pub fn pattern_match(&self) -> f64 {
        if self.person || self.corporate {
            1.0
        } else {
            0.5
        }
    }

    /// 1.0 when the span looks like a person or an organisation.
    pub fn entity_type(&self) -> f64 {
        if self.person || self.organisation {
            1.0
        } else {
            0.0
        }
    }
}

fn bare_word(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

pub fn classify(value: &str) -> NameShape {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let words: Vec<String> = tokens.iter().map(|t| bare_word(t)).collect();

    let corporate = words
        .iter()
        .skip(1)
        .any(|w| COMPANY_SUFFIXES.contains(&w.as_str()));
    let org_vocabulary = words.iter().any(|w| ORG_WORDS.contains(&w.as_str()));
    let acronym = tokens.len() == 1
        && tokens[0].chars().filter(|c| c.is_alphabetic()).count() >= 2
        && tokens[0].chars().all(|c| !c.is_lowercase());

    let person = !corporate
        && !org_vocabulary
        && (2..=4).contains(&tokens.len())
        && tokens.iter().all(|t| PERSON_TOKEN.is_match(t))
        && tokens.last().is_some_and(|t| t.len() > 2 && !t.ends_with('.'));

    NameShape {
        person,
        corporate,
        organisation: corporate || org_vocabulary || acronym,
    }
}

/// Narrow `text[start..end]` by dropping leading label words (matched
/// case-insensitively against `labels`), stray ampersands and trailing
/// punctuation. `None` when nothing is left.
pub fn trim_span(text: &str, start: usize, end: usize, labels: &[&str]) -> Option<(usize, usize)> {
    let tokens: Vec<(usize, &str)> = TOKEN
        .find_iter(&text[start..end])
        .map(|m| (m.start(), m.as_str()))
        .collect();

    let first = tokens
        .iter()
        .position(|(_, t)| *t != "&" && !labels.contains(&bare_word(t).as_str()))?;
    let last = tokens.iter().rposition(|(_, t)| *t != "&")?;
    if last < first {
        return None;
    }

    let (first_off, _) = tokens[first];
    let (last_off, last_tok) = tokens[last];
    let new_start = start + first_off;
    let trimmed_last = last_tok.trim_end_matches(['.', ',', ':', ';']);
    let new_end = start + last_off + trimmed_last.len();
    if new_end <= new_start || !text[new_start..new_end].chars().any(char::is_alphabetic) {
        return None;
    }
    Some((new_start, new_end))
}
