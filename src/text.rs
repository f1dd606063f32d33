//! Text cleanup helpers shared by the relevance engine and the canonical mapper.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</\1>").unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Sentinel used to protect paragraph breaks while whitespace is collapsed.
const PARAGRAPH_SENTINEL: &str = "\u{0}PARA\u{0}";

/// Strip `<script>`/`<style>` blocks and all remaining tags, decode entities,
/// and collapse whitespace while preserving paragraph breaks.
///
/// Returns an empty string for `None`/empty input rather than failing.
pub fn strip_html(html: Option<&str>) -> String {
    let Some(html) = html else {
        return String::new();
    };
    if html.is_empty() {
        return String::new();
    }

    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, "");
    let with_sentinel = PARAGRAPH_BREAK_RE.replace_all(&without_scripts, PARAGRAPH_SENTINEL);
    let untagged = TAG_RE.replace_all(&with_sentinel, " ");
    let decoded = decode_entities(&untagged);
    let collapsed = WHITESPACE_RE.replace_all(&decoded, " ");
    collapsed.replace(PARAGRAPH_SENTINEL, "\n\n").trim().to_string()
}

/// Decode the small set of HTML entities that show up in ATS job bodies.
fn decode_entities(s: &str) -> String {
    let mut out = s
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rdquo;", "\u{201d}")
        .replace("&ldquo;", "\u{201c}")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}");
    // `&amp;` must be decoded before any other entity, or double-encoded
    // sequences like `&amp;lt;` would survive as literal text instead of
    // collapsing to `<`; one more pass catches entities that were
    // themselves produced by the first `&amp;` replacement above.
    if out.contains("&amp;") {
        out = out.replace("&amp;", "&");
    }
    out
}

/// Lenient ISO-ish timestamp parse. Returns `None` on any failure instead of
/// propagating an error — the caller treats an unparseable date as absent.
pub fn parse_date(s: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(
            naive
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_local_timezone(Utc)
                .single()?,
        );
    }
    None
}

const DEDUP_PUNCTUATION: &str = ".,/#!$%^&*;:{}=-_`~()[]?+";

/// Lower-case, strip the punctuation class used for dedup fingerprints, and
/// collapse whitespace. Used to build `normalized_fingerprint`.
pub fn normalize_for_deduplication(s: &str) -> String {
    let lowered = s.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if DEDUP_PUNCTUATION.contains(c) { ' ' } else { c })
        .collect();
    WHITESPACE_RE.replace_all(stripped.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_script_and_style() {
        let html = "<style>.a{color:red}</style><p>Hello <b>World</b></p><script>evil()</script>";
        assert_eq!(strip_html(Some(html)), "Hello World");
    }

    #[test]
    fn strip_html_preserves_paragraph_breaks() {
        let html = "<p>First paragraph.</p>\n\n<p>Second paragraph.</p>";
        let out = strip_html(Some(html));
        assert!(out.contains("First paragraph.\n\nSecond paragraph."));
    }

    #[test]
    fn strip_html_decodes_entities() {
        assert_eq!(strip_html(Some("Tom &amp; Jerry&rsquo;s")), "Tom & Jerry\u{2019}s");
    }

    #[test]
    fn strip_html_empty_for_none() {
        assert_eq!(strip_html(None), "");
        assert_eq!(strip_html(Some("")), "");
    }

    #[test]
    fn parse_date_accepts_rfc3339() {
        assert!(parse_date(Some("2026-01-15T10:00:00Z")).is_some());
    }

    #[test]
    fn parse_date_returns_none_on_garbage() {
        assert_eq!(parse_date(Some("not a date")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn normalize_for_deduplication_strips_punctuation_and_case() {
        assert_eq!(
            normalize_for_deduplication("Senior Backend Engineer - Acme-Corp!"),
            "senior backend engineer acme corp"
        );
    }

    #[test]
    fn normalize_for_deduplication_collapses_whitespace() {
        assert_eq!(normalize_for_deduplication("  a   b\tc  "), "a b c");
    }
}
