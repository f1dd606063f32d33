//! Location/content filtering primitives shared by the relevance engine.
//!
//! Two independent vocabularies are at play here: the built-in region
//! vocabulary used for structural pattern detection (always active,
//! regardless of what a caller passes in) and the caller-supplied keyword
//! lists from [`FilterConfig`](config::FilterConfig), tested separately as
//! whole-word or substring matches.

pub mod config;

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::logging::JobLogger;

/// Characters escaped before a keyword is dropped into a regex alternation.
const REGEX_METACHARS: &str = "-/\\^$*+?.()|[]{}";

fn escape_keyword(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if REGEX_METACHARS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn whole_word_alternation(keywords: &[String]) -> Option<Regex> {
    let escaped: Vec<String> = keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| escape_keyword(k))
        .collect();
    if escaped.is_empty() {
        return None;
    }
    let pattern = format!(r"\b(?:{})\b", escaped.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Built-in region vocabulary used by [`detect_restrictive_pattern`],
/// independent of any caller-supplied keyword list.
const REGION_TERMS: &[&str] = &[
    "US",
    "USA",
    "United States",
    "America",
    "Canada",
    "UK",
    "EU",
    "Europe",
    "EMEA",
    "APAC",
    "Asia",
    "Australia",
    "New Zealand",
    "North America",
];

static REGION_ALTERNATION: LazyLock<String> =
    LazyLock::new(|| REGION_TERMS.iter().map(|t| escape_keyword(t)).collect::<Vec<_>>().join("|"));

/// `(Region Only)` / `[Region Only]` / `Region only`
static PAREN_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)[\[(]?\b(?:{})\b\s*only[\])]?", *REGION_ALTERNATION);
    RegexBuilder::new(&pattern).case_insensitive(true).build().unwrap()
});

/// `based|located|must be|reside in Region`
static RESIDENCY_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)\b(?:based|located|must be|reside)\s+in\s+(?:the\s+)?(?:{})\b",
        *REGION_ALTERNATION
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build().unwrap()
});

/// `Region resident(s)`
static RESIDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)\b(?:{})\s+residents?\b", *REGION_ALTERNATION);
    RegexBuilder::new(&pattern).case_insensitive(true).build().unwrap()
});

/// `eligible|authorized to work in Region`
static WORK_AUTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)\b(?:eligible|authorized)\s+to\s+work\s+in\s+(?:the\s+)?(?:{})\b",
        *REGION_ALTERNATION
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build().unwrap()
});

/// `Region based` / `Region-based`
static REGION_BASED_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)\b(?:{})[\s-]based\b", *REGION_ALTERNATION);
    RegexBuilder::new(&pattern).case_insensitive(true).build().unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictiveMatch {
    pub is_restrictive: bool,
    pub matched_keyword: Option<String>,
}

/// Detect a restrictive location/content pattern: whole-word hits against
/// `keywords`, plus the five structural patterns against the built-in region
/// vocabulary (always active, independent of `keywords`).
pub fn detect_restrictive_pattern(
    text: &str,
    keywords: &[String],
    logger: Option<&JobLogger>,
) -> RestrictiveMatch {
    if let Some(re) = whole_word_alternation(keywords)
        && let Some(m) = re.find(text)
    {
        let matched = m.as_str().to_string();
        if let Some(l) = logger {
            l.debug_match(&matched, "restrictive keyword match");
        }
        return RestrictiveMatch {
            is_restrictive: true,
            matched_keyword: Some(matched),
        };
    }

    for re in [
        &*PAREN_ONLY_RE,
        &*RESIDENCY_VERB_RE,
        &*RESIDENT_RE,
        &*WORK_AUTH_RE,
        &*REGION_BASED_RE,
    ] {
        if let Some(m) = re.find(text) {
            let matched = m.as_str().to_string();
            if let Some(l) = logger {
                l.debug_match(&matched, "structural restrictive pattern");
            }
            return RestrictiveMatch {
                is_restrictive: true,
                matched_keyword: Some(matched),
            };
        }
    }

    RestrictiveMatch {
        is_restrictive: false,
        matched_keyword: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusiveMatch {
    pub is_inclusive: bool,
    pub matched_keyword: Option<String>,
}

/// Case-insensitive substring match against `keywords`, preserving the
/// caller's list order — the first-listed keyword that matches wins.
pub fn contains_inclusive_signal(
    text: &str,
    keywords: &[String],
    logger: Option<&JobLogger>,
) -> InclusiveMatch {
    let lower = text.to_lowercase();
    for keyword in keywords {
        if keyword.is_empty() {
            continue;
        }
        if lower.contains(&keyword.to_lowercase()) {
            if let Some(l) = logger {
                l.debug_match(keyword, "inclusive keyword match");
            }
            return InclusiveMatch {
                is_inclusive: true,
                matched_keyword: Some(keyword.clone()),
            };
        }
    }
    InclusiveMatch {
        is_inclusive: false,
        matched_keyword: None,
    }
}

/// All byte-offset occurrences of `needle` in `haystack` (case-insensitive).
pub fn find_all_occurrences(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    let lower_haystack = haystack.to_lowercase();
    let lower_needle = needle.to_lowercase();
    let mut out = Vec::new();
    let mut start = 0;
    while let Some(pos) = lower_haystack[start..].find(&lower_needle) {
        let abs_start = start + pos;
        let abs_end = abs_start + lower_needle.len();
        out.push((abs_start, abs_end));
        start = abs_end;
        if start >= lower_haystack.len() {
            break;
        }
    }
    out
}

/// The ±30-character window around a match, clamped to the text bounds.
/// Operates on byte offsets but snaps inward to a char boundary so the
/// returned slice never panics on multi-byte input.
pub fn context_window(text: &str, match_start: usize, match_end: usize) -> &str {
    let mut lo = match_start.saturating_sub(30);
    let mut hi = (match_end + 30).min(text.len());
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}

/// True if any occurrence of `needle` in `text` has one of `negatives` within
/// a ±30-character window.
pub fn has_negative_in_context(text: &str, needle: &str, negatives: &[String]) -> bool {
    for (start, end) in find_all_occurrences(text, needle) {
        let window = context_window(text, start, end);
        if whole_word_alternation(negatives)
            .map(|re| re.is_match(window))
            .unwrap_or(false)
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_regex_metacharacters_and_matches_literally() {
        let keywords = vec!["c++ developer".to_string(), "$100k".to_string()];
        let m = detect_restrictive_pattern("we need a c++ developer", &keywords, None);
        assert!(m.is_restrictive);
        assert_eq!(m.matched_keyword.as_deref(), Some("c++ developer"));
    }

    #[test]
    fn never_panics_on_heavy_metacharacter_keywords() {
        let keywords = vec!["[US only]".to_string(), "(?i)".to_string(), "a.*b".to_string()];
        let _ = detect_restrictive_pattern("nothing matches here", &keywords, None);
        let _ = contains_inclusive_signal("nothing matches here", &keywords, None);
    }

    #[test]
    fn detects_structural_paren_only_pattern() {
        let m = detect_restrictive_pattern("Remote (US Only)", &[], None);
        assert!(m.is_restrictive);
    }

    #[test]
    fn detects_structural_residency_verb_pattern() {
        let m = detect_restrictive_pattern("Applicants must be based in Canada", &[], None);
        assert!(m.is_restrictive);
    }

    #[test]
    fn detects_structural_resident_pattern() {
        let m = detect_restrictive_pattern("Open only to UK residents", &[], None);
        assert!(m.is_restrictive);
    }

    #[test]
    fn detects_structural_work_auth_pattern() {
        let m = detect_restrictive_pattern("Must be authorized to work in the US", &[], None);
        assert!(m.is_restrictive);
    }

    #[test]
    fn detects_structural_region_based_pattern() {
        let m = detect_restrictive_pattern("This is a US-based role", &[], None);
        assert!(m.is_restrictive);
    }

    #[test]
    fn structural_patterns_independent_of_caller_keywords() {
        // Empty keyword list still finds the built-in region vocabulary hit.
        let m = detect_restrictive_pattern("EMEA only", &[], None);
        assert!(m.is_restrictive);
    }

    #[test]
    fn inclusive_signal_preserves_list_order_first_match_wins() {
        let keywords = vec!["latam".to_string(), "brazil".to_string()];
        let m = contains_inclusive_signal("remote - brazil, latam ok", &keywords, None);
        assert_eq!(m.matched_keyword.as_deref(), Some("latam"));
    }

    #[test]
    fn context_window_clamped_to_bounds() {
        let text = "remote";
        let window = context_window(text, 0, text.len());
        assert_eq!(window, "remote");
    }

    #[test]
    fn negative_in_context_detects_nearby_negative() {
        let text = "Fully remote, but requires PST hours for this role.";
        let negatives = vec!["pst".to_string()];
        assert!(has_negative_in_context(text, "fully remote", &negatives));
    }

    #[test]
    fn negative_in_context_false_when_far_away() {
        let text = format!(
            "Fully remote position. {}. Must work PST hours.",
            "x".repeat(100)
        );
        let negatives = vec!["pst".to_string()];
        assert!(!has_negative_in_context(&text, "fully remote", &negatives));
    }
}
