//! Keyword search and distance helpers shared by the strategies.

/// One occurrence of a keyword in a text, as a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordHit {
    pub keyword: &'static str,
    pub start: usize,
    pub end: usize,
}

/// Find every whole-word, case-insensitive occurrence of `keywords` in
/// `text`, ordered by position.
pub fn find(text: &str, keywords: &[&'static str]) -> Vec<KeywordHit> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut hits = Vec::new();

    for &keyword in keywords {
        for (start, matched) in lower.match_indices(keyword) {
            let end = start + matched.len();
            let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
            let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
            if before_ok && after_ok {
                hits.push(KeywordHit { keyword, start, end });
            }
        }
    }

    hits.sort_by_key(|h| (h.start, std::cmp::Reverse(h.end)));
    hits
}

/// Character distance between two spans: `max(starts) - min(ends)`.
///
/// Zero for adjacent spans, negative when they overlap.
pub fn distance(a: (usize, usize), b: (usize, usize)) -> isize {
    a.0.max(b.0) as isize - a.1.min(b.1) as isize
}

/// The keyword hit closest to `span`, with its distance. Ties go to the
/// earlier hit.
pub fn nearest(hits: &[KeywordHit], span: (usize, usize)) -> Option<(KeywordHit, isize)> {
    hits.iter()
        .map(|hit| (*hit, distance((hit.start, hit.end), span)))
        .min_by_key(|(_, d)| (*d).max(0))
}

/// Whether `span` overlaps any keyword hit.
pub fn overlaps_any(hits: &[KeywordHit], span: (usize, usize)) -> bool {
    hits.iter().any(|hit| distance((hit.start, hit.end), span) < 0)
}

/// 1.0 up to `full_until` characters away, falling linearly to 0.0 at
/// `zero_at`.
pub fn proximity(distance: isize, full_until: usize, zero_at: usize) -> f64 {
    let d = distance.max(0) as f64;
    let full = full_until as f64;
    let zero = zero_at as f64;
    if d <= full {
        1.0
    } else if d >= zero {
        0.0
    } else {
        1.0 - (d - full) / (zero - full)
    }
}

/// Keyword proximity of `span` to the nearest hit, with the keyword.
pub fn nearest_proximity(
    hits: &[KeywordHit],
    span: (usize, usize),
    full_until: usize,
    zero_at: usize,
) -> (f64, Option<&'static str>) {
    match nearest(hits, span) {
        Some((hit, d)) => (proximity(d, full_until, zero_at), Some(hit.keyword)),
        None => (0.0, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive_and_whole_word() {
        let hits = find("Lead AUDITOR: J. Doe, auditors office", &["auditor"]);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].start, hits[0].end), (5, 12));
    }

    #[test]
    fn test_find_multi_word_keywords() {
        let hits = find("The audit was conducted by SGS", &["conducted by", "audit"]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].keyword, "audit");
        assert_eq!(hits[1].keyword, "conducted by");
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance((0, 7), (9, 19)), 2);
        assert_eq!(distance((9, 19), (0, 7)), 2);
        assert_eq!(distance((0, 7), (7, 10)), 0);
        assert!(distance((0, 7), (5, 10)) < 0);
    }

    #[test]
    fn test_proximity_falls_off_linearly() {
        assert_eq!(proximity(-4, 50, 500), 1.0);
        assert_eq!(proximity(50, 50, 500), 1.0);
        assert!((proximity(275, 50, 500) - 0.5).abs() < 1e-12);
        assert_eq!(proximity(600, 50, 500), 0.0);
        assert!((proximity(50, 0, 200) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_prefers_closest_then_earliest() {
        let hits = find("factory ABC Ltd supplier", &["factory", "supplier"]);
        let (hit, d) = nearest(&hits, (8, 15)).unwrap();
        assert_eq!(hit.keyword, "factory");
        assert_eq!(d, 1);
    }
}
