use crate::model::{LineSpan, Segment};
use regex::Regex;
use std::collections::VecDeque;
use std::sync::LazyLock;

/// Enumeration marker at the start of a line: `-`, `*`, `•`, `1.`, `2)`, `(a)`, `b.`
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•▪‣◦]|\(?\d{1,3}[.)]|\(?[a-z][.)])\s+").expect("valid list marker regex")
});

/// A lone enumeration marker, e.g. the "1." of "1. Fire exits blocked".
static MARKER_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?(?:\d{1,3}|[a-z])[.)]$").expect("valid marker regex"));

/// Words ending in a period that do not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "co", "ltd", "inc", "corp", "mr", "mrs", "ms", "dr", "st", "jr", "sr", "vs", "etc", "e.g",
    "i.e", "messrs", "dept", "approx", "fig", "no", "nos", "art", "sec", "pvt", "jan", "feb",
    "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Split paginated text into segments, lazily, one page at a time.
///
/// The returned iterator is `Clone`; cloning it (or calling `segments`
/// again) restarts segmentation from the same position.
pub fn segments(pages: &[String]) -> Segments<'_> {
    Segments {
        pages,
        next_page: 0,
        buffer: VecDeque::new(),
        ordinal: 0,
    }
}

#[derive(Debug, Clone)]
pub struct Segments<'a> {
    pages: &'a [String],
    next_page: usize,
    buffer: VecDeque<Segment>,
    ordinal: usize,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        loop {
            if let Some(mut segment) = self.buffer.pop_front() {
                segment.ordinal = self.ordinal;
                self.ordinal += 1;
                return Some(segment);
            }
            let text = self.pages.get(self.next_page)?;
            let page_number = (self.next_page + 1) as u32;
            self.buffer.extend(segment_page(page_number, text));
            self.next_page += 1;
        }
    }
}

/// Returns true (and the text after it) when `line` starts with an
/// enumeration marker.
pub fn strip_list_marker(line: &str) -> (bool, &str) {
    match LIST_MARKER.find(line) {
        Some(m) => (true, line[m.end()..].trim_start()),
        None => (false, line),
    }
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A run of lines that reads as one unit, with the byte offset each line
/// starts at in the joined text.
struct Block {
    text: String,
    line_offsets: Vec<(usize, usize)>,
}

impl Block {
    fn new() -> Self {
        Block {
            text: String::new(),
            line_offsets: Vec::new(),
        }
    }

    fn push(&mut self, line_number: usize, line: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.line_offsets.push((self.text.len(), line_number));
        self.text.push_str(line);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn line_at(&self, pos: usize) -> usize {
        self.line_offsets
            .iter()
            .rev()
            .find(|(offset, _)| *offset <= pos)
            .or(self.line_offsets.first())
            .map(|(_, line)| *line)
            .unwrap_or(1)
    }
}

/// Segment a single page. Ordinals are assigned by the iterator.
fn segment_page(page: u32, text: &str) -> Vec<Segment> {
    let mut blocks = Vec::new();
    let mut current = Block::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = normalize_ws(&strip_control(raw));
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::replace(&mut current, Block::new()));
            }
            continue;
        }

        if !current.is_empty() && !continues_block(&current.text, &line) {
            blocks.push(std::mem::replace(&mut current, Block::new()));
        }
        current.push(idx + 1, &line);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let mut out = Vec::new();
    for block in &blocks {
        for (start, end) in split_sentences(&block.text) {
            let sentence = &block.text[start..end];
            let trimmed_start = start + (sentence.len() - sentence.trim_start().len());
            let trimmed_end = start + sentence.trim_end().len();
            if trimmed_start >= trimmed_end {
                continue;
            }
            out.push(Segment {
                ordinal: 0,
                page,
                line_span: LineSpan::new(
                    block.line_at(trimmed_start),
                    block.line_at(trimmed_end - 1),
                ),
                text: block.text[trimmed_start..trimmed_end].to_string(),
            });
        }
    }
    out
}

fn strip_control(line: &str) -> String {
    line.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Whether `line` continues the block whose text so far is `block`.
fn continues_block(block: &str, line: &str) -> bool {
    if LIST_MARKER.is_match(line) {
        return false;
    }
    if block.ends_with(':') || block.ends_with(',') {
        return true;
    }
    line.chars().next().is_some_and(|c| c.is_lowercase())
}

/// Byte ranges of the sentences in `text`.
fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0;

    for (k, &(i, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if !chars.get(k + 1).is_some_and(|(_, next)| next.is_whitespace()) {
            continue;
        }
        let Some(&(_, after)) = chars[k + 1..].iter().find(|(_, ch)| !ch.is_whitespace()) else {
            continue;
        };
        if !(after.is_uppercase() || after.is_ascii_digit() || matches!(after, '-' | '*' | '•' | '(')) {
            continue;
        }
        let end = i + c.len_utf8();
        if c == '.' && !ends_sentence(&text[start..end]) {
            continue;
        }
        out.push((start, end));
        start = end;
    }

    if start < text.len() {
        out.push((start, text.len()));
    }
    out
}

/// Whether a piece ending in '.' is a full sentence rather than an
/// abbreviation, an initial, or a bare list marker.
fn ends_sentence(piece: &str) -> bool {
    let body = piece.trim();
    if MARKER_ONLY.is_match(body) {
        return false;
    }
    let before = body.trim_end_matches('.');
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        if first.is_uppercase() {
            return false;
        }
    }
    !ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(pages: &[&str]) -> Vec<Segment> {
        let pages: Vec<String> = pages.iter().map(|s| s.to_string()).collect();
        segments(&pages).collect()
    }

    #[test]
    fn test_empty_document_has_no_segments() {
        assert!(collect(&[]).is_empty());
        assert!(collect(&["", "   \n\t\n"]).is_empty());
    }

    #[test]
    fn test_pages_are_numbered_from_one() {
        let segs = collect(&["First page line", "", "Third page line"]);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].page, 1);
        assert_eq!(segs[1].page, 3);
        assert_eq!(segs[1].ordinal, 1);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let segs = collect(&["  Factory   name:\tABC  Garments Ltd  "]);
        assert_eq!(segs[0].text, "Factory name: ABC Garments Ltd");
    }

    #[test]
    fn test_label_line_joins_value_line() {
        let segs = collect(&["Lead Auditor:\nJohn Smith\nAudit date: 2024-03-01"]);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "Lead Auditor: John Smith");
        assert_eq!(segs[0].line_span, LineSpan::new(1, 2));
        assert_eq!(segs[1].line_span, LineSpan::single(3));
    }

    #[test]
    fn test_lowercase_line_continues_sentence() {
        let segs = collect(&["Fire extinguishers were not\ninspected in the last year."]);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].line_span, LineSpan::new(1, 2));
    }

    #[test]
    fn test_list_items_are_separate_segments() {
        let segs = collect(&["Findings:\n1. No fire drill records.\n2. Exits blocked."]);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].text, "1. No fire drill records.");
        assert_eq!(segs[2].text, "2. Exits blocked.");
    }

    #[test]
    fn test_sentences_split_within_line() {
        let segs = collect(&["The audit took two days. The factory was clean."]);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].text, "The factory was clean.");
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let segs = collect(&["Supplier: ABC Co. Ltd. Shenzhen was visited by Mr. J. Smith today."]);
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_abbreviated_months_do_not_split() {
        for text in [
            "Audit date: Sept. 14, 2023",
            "Audit date: Jan. 5, 2024",
            "Audit period: Mar. 2024",
            "Audit date: 14 Sept. 2023",
        ] {
            let segs = collect(&[text]);
            assert_eq!(segs.len(), 1, "{text}");
            assert_eq!(segs[0].text, text);
        }
    }

    #[test]
    fn test_segments_are_restartable() {
        let pages = vec!["One. Two.\nThree".to_string(), "Four".to_string()];
        let iter = segments(&pages);
        let first: Vec<Segment> = iter.clone().collect();
        let second: Vec<Segment> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("- Missing PPE"), (true, "Missing PPE"));
        assert_eq!(strip_list_marker("• Missing PPE"), (true, "Missing PPE"));
        assert_eq!(strip_list_marker("3) Missing PPE"), (true, "Missing PPE"));
        assert_eq!(strip_list_marker("Missing PPE"), (false, "Missing PPE"));
    }
}
