//! The relevance engine (C4): decides whether one raw posting is
//! `IRRELEVANT`, `RELEVANT`, or `NEEDS_REVIEW`, and — when relevant — which
//! hiring region it belongs to.
//!
//! `assess` is a pure function: all of its inputs are values, all of its
//! outputs are values, and it never touches the filesystem or network.

use chrono::{DateTime, Utc};

use crate::filters::config::{FilterConfig, RemoteMetadataField};
use crate::filters::{contains_inclusive_signal, detect_restrictive_pattern, has_negative_in_context};
use crate::logging::JobLogger;
use crate::text::strip_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Irrelevant,
    Relevant,
    NeedsReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiringRegion {
    Global,
    Latam,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub decision: Decision,
    pub region: Option<HiringRegion>,
    pub reason: String,
}

/// Provider-agnostic view of a raw posting that the relevance engine reads.
/// Built by each fetcher's `normalize()` from its own wire format.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRaw {
    pub provider_posting_id: String,
    pub title: String,
    /// Primary location name, secondary locations, and any address
    /// locality/region/country the provider supplies — not yet joined.
    pub locations: Vec<String>,
    pub body_html: Option<String>,
    pub is_listed: Option<bool>,
    pub is_remote: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Greenhouse-style `{name, value}` metadata. Empty for providers that
    /// don't expose structured metadata (Ashby, Lever).
    pub metadata: Vec<(String, serde_json::Value)>,
    /// Lever-style workplace type enum (`"remote"|"hybrid"|"onsite"|...`).
    pub workplace_type: Option<String>,
    /// Structured compensation range, when the provider supplies one
    /// (currently only Ashby's `compensation.summaryComponents`).
    pub compensation: Option<CompensationRange>,
}

/// A structured salary range lifted from a provider's own compensation
/// field, as opposed to scraped out of free-text body content.
#[derive(Debug, Clone, Default)]
pub struct CompensationRange {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubVerdict {
    Reject,
    AcceptGlobal,
    AcceptLatam,
    Unknown,
}

fn combine(a: SubVerdict, b: SubVerdict) -> SubVerdict {
    use SubVerdict::*;
    match (a, b) {
        (Reject, _) | (_, Reject) => Reject,
        (AcceptLatam, _) | (_, AcceptLatam) => AcceptLatam,
        (AcceptGlobal, _) | (_, AcceptGlobal) => AcceptGlobal,
        _ => Unknown,
    }
}

/// Decide relevance for one posting against one (possibly absent) config.
pub fn assess(raw: &NormalizedRaw, config: Option<&FilterConfig>, logger: Option<&JobLogger>) -> Assessment {
    if raw.is_listed == Some(false) {
        return Assessment {
            decision: Decision::Irrelevant,
            region: None,
            reason: "provider marked posting as unlisted".to_string(),
        };
    }

    if let Some(cfg) = config
        && let Some(threshold_str) = &cfg.process_jobs_updated_after_date
        && let Ok(threshold) = DateTime::parse_from_rfc3339(threshold_str)
    {
        let threshold = threshold.with_timezone(&Utc);
        if let Some(updated_at) = raw.updated_at
            && updated_at < threshold
        {
            return Assessment {
                decision: Decision::Irrelevant,
                region: None,
                reason: format!("updated_at {updated_at} is before configured threshold {threshold}"),
            };
        }
    }

    let (location_verdict, location_reason) = location_check(raw, config, logger);
    let metadata_verdict = metadata_check(raw, config);
    let (content_verdict, content_reason) = content_check(raw, config, logger);

    let combined = combine(combine(location_verdict, metadata_verdict), content_verdict);

    let (decision, region, reason) = match combined {
        SubVerdict::Reject => (Decision::Irrelevant, None, pick_reason(&location_reason, &content_reason, "rejected")),
        SubVerdict::AcceptLatam => (
            Decision::Relevant,
            Some(HiringRegion::Latam),
            pick_reason(&location_reason, &content_reason, "accepted LATAM"),
        ),
        SubVerdict::AcceptGlobal => (
            Decision::Relevant,
            Some(HiringRegion::Global),
            pick_reason(&location_reason, &content_reason, "accepted GLOBAL"),
        ),
        SubVerdict::Unknown if raw.is_remote == Some(true) => (
            Decision::Relevant,
            Some(HiringRegion::Global),
            "isRemote fallback".to_string(),
        ),
        SubVerdict::Unknown => (Decision::Irrelevant, None, "no signal matched".to_string()),
    };

    if decision == Decision::Relevant
        && raw.workplace_type.as_deref() == Some("hybrid")
    {
        return Assessment {
            decision: Decision::NeedsReview,
            region,
            reason: format!("{reason}; workplace_type=hybrid needs human review"),
        };
    }

    Assessment { decision, region, reason }
}

fn pick_reason(location_reason: &str, content_reason: &str, fallback: &str) -> String {
    if !location_reason.is_empty() {
        location_reason.to_string()
    } else if !content_reason.is_empty() {
        content_reason.to_string()
    } else {
        fallback.to_string()
    }
}

fn location_check(raw: &NormalizedRaw, config: Option<&FilterConfig>, logger: Option<&JobLogger>) -> (SubVerdict, String) {
    let Some(cfg) = config else {
        return (SubVerdict::Unknown, String::new());
    };
    let lk = &cfg.location_keywords;
    let text = raw.locations.join(";").to_lowercase();
    if text.is_empty() {
        return (SubVerdict::Unknown, String::new());
    }

    let restrictive = detect_restrictive_pattern(&text, &lk.strong_negative_restriction, logger);
    if restrictive.is_restrictive {
        return (
            SubVerdict::Reject,
            format!("location matched restrictive pattern {:?}", restrictive.matched_keyword),
        );
    }

    let latam = contains_inclusive_signal(&text, &lk.strong_positive_latam, logger);
    if latam.is_inclusive {
        return (SubVerdict::AcceptLatam, format!("location matched LATAM keyword {:?}", latam.matched_keyword));
    }

    let global = contains_inclusive_signal(&text, &lk.strong_positive_global, logger);
    if global.is_inclusive {
        return (SubVerdict::AcceptGlobal, format!("location matched GLOBAL keyword {:?}", global.matched_keyword));
    }

    let brazil = contains_inclusive_signal(&text, &lk.accept_exact_brazil_terms, logger);
    if brazil.is_inclusive {
        return (SubVerdict::AcceptLatam, format!("location matched Brazil term {:?}", brazil.matched_keyword));
    }

    let latam_country = contains_inclusive_signal(&text, &lk.accept_exact_latam_countries, logger);
    if latam_country.is_inclusive {
        return (
            SubVerdict::AcceptLatam,
            format!("location matched LATAM country {:?}", latam_country.matched_keyword),
        );
    }

    let ambiguous = contains_inclusive_signal(&text, &lk.ambiguous, logger);
    if ambiguous.is_inclusive && raw.is_remote != Some(true) {
        let term = ambiguous.matched_keyword.as_deref().unwrap_or_default();
        if has_negative_in_context(&text, term, &lk.strong_negative_restriction) {
            return (SubVerdict::Reject, format!("ambiguous term {term:?} near a restrictive keyword"));
        }
        return (SubVerdict::AcceptGlobal, format!("ambiguous term {term:?} accepted with no nearby restriction"));
    }

    (SubVerdict::Unknown, String::new())
}

fn metadata_check(raw: &NormalizedRaw, config: Option<&FilterConfig>) -> SubVerdict {
    let Some(cfg) = config else {
        return SubVerdict::Unknown;
    };
    let mut result = SubVerdict::Unknown;
    for (name, value) in &raw.metadata {
        let Some(spec) = cfg.remote_metadata_fields.get(&name.to_lowercase()) else {
            continue;
        };
        let field_verdict = metadata_field_verdict(&name.to_lowercase(), value, spec);
        result = combine(result, field_verdict);
        if result == SubVerdict::Reject {
            return SubVerdict::Reject;
        }
    }
    result
}

fn metadata_field_verdict(field_name: &str, value: &serde_json::Value, spec: &RemoteMetadataField) -> SubVerdict {
    let values: Vec<serde_json::Value> = match value.as_array() {
        Some(arr) => arr.clone(),
        None => vec![value.clone()],
    };

    let mut result = SubVerdict::Unknown;
    for v in &values {
        let verdict = match spec {
            RemoteMetadataField::Boolean { positive_value, negative_value } => {
                if v == positive_value {
                    SubVerdict::AcceptGlobal
                } else if negative_value.as_ref().is_some_and(|nv| v == nv) {
                    SubVerdict::Reject
                } else if field_name == "remote eligible" {
                    SubVerdict::Reject
                } else {
                    SubVerdict::Unknown
                }
            }
            RemoteMetadataField::String { positive_values, allowed_values, disallowed_values } => {
                let token = v.as_str().map(|s| s.to_lowercase()).unwrap_or_default();
                if disallowed_values.iter().any(|d| d.to_lowercase() == token) {
                    SubVerdict::Reject
                } else if allowed_values.iter().any(|a| a.to_lowercase() == token) {
                    region_token_verdict(&token)
                } else if positive_values.iter().any(|p| p.to_lowercase() == token) {
                    if is_latam_token(&token) {
                        SubVerdict::AcceptLatam
                    } else {
                        SubVerdict::AcceptGlobal
                    }
                } else {
                    SubVerdict::Unknown
                }
            }
        };
        result = combine(result, verdict);
        if result == SubVerdict::Reject {
            return SubVerdict::Reject;
        }
    }
    result
}

fn is_latam_token(token: &str) -> bool {
    matches!(token, "latam" | "americas")
}

fn is_global_token(token: &str) -> bool {
    matches!(token, "worldwide" | "global")
}

/// An allowed-list token's verdict: LATAM-ish and worldwide/global tokens
/// accept; every other allowed token (e.g. a single country like "US") is a
/// restriction in disguise and rejects.
fn region_token_verdict(token: &str) -> SubVerdict {
    if is_latam_token(token) {
        SubVerdict::AcceptLatam
    } else if is_global_token(token) {
        SubVerdict::AcceptGlobal
    } else {
        SubVerdict::Reject
    }
}

fn content_check(raw: &NormalizedRaw, config: Option<&FilterConfig>, logger: Option<&JobLogger>) -> (SubVerdict, String) {
    let Some(cfg) = config else {
        return (SubVerdict::Unknown, String::new());
    };
    let lk = &cfg.location_keywords;
    let ck = &cfg.content_keywords;
    let body = strip_html(raw.body_html.as_deref());
    let text = format!("{} {}", raw.title, body).to_lowercase();

    let combined_negatives: Vec<String> = lk
        .strong_negative_restriction
        .iter()
        .chain(ck.strong_negative_region.iter())
        .chain(ck.strong_negative_timezone.iter())
        .cloned()
        .collect();

    let restrictive = detect_restrictive_pattern(&text, &combined_negatives, logger);
    if restrictive.is_restrictive {
        return (
            SubVerdict::Reject,
            format!("content matched restrictive pattern {:?}", restrictive.matched_keyword),
        );
    }

    let latam = contains_inclusive_signal(&text, &ck.strong_positive_latam, logger);
    if latam.is_inclusive {
        let term = latam.matched_keyword.as_deref().unwrap_or_default();
        if has_negative_in_context(&text, term, &combined_negatives) {
            return (SubVerdict::Reject, format!("content term {term:?} near a negative keyword"));
        }
        return (SubVerdict::AcceptLatam, format!("content matched LATAM keyword {term:?}"));
    }

    let global = contains_inclusive_signal(&text, &ck.strong_positive_global, logger);
    if global.is_inclusive {
        let term = global.matched_keyword.as_deref().unwrap_or_default();
        if has_negative_in_context(&text, term, &combined_negatives) {
            return (SubVerdict::Reject, format!("content term {term:?} near a negative keyword"));
        }
        return (SubVerdict::AcceptGlobal, format!("content matched GLOBAL keyword {term:?}"));
    }

    let brazil = contains_inclusive_signal(&text, &ck.accept_exact_brazil_terms, logger);
    if brazil.is_inclusive {
        return (SubVerdict::AcceptLatam, format!("content matched Brazil term {:?}", brazil.matched_keyword));
    }

    (SubVerdict::Unknown, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::config::{ContentKeywords, LocationKeywords};

    fn cfg_with_location(lk: LocationKeywords) -> FilterConfig {
        FilterConfig { location_keywords: lk, ..Default::default() }
    }

    fn raw(title: &str, location: &str, is_listed: Option<bool>, is_remote: Option<bool>) -> NormalizedRaw {
        NormalizedRaw {
            provider_posting_id: "123".to_string(),
            title: title.to_string(),
            locations: vec![location.to_string()],
            body_html: None,
            is_listed,
            is_remote,
            updated_at: None,
            metadata: Vec::new(),
            workplace_type: None,
            compensation: None,
        }
    }

    #[test]
    fn unlisted_posting_is_irrelevant() {
        let r = raw("Engineer", "Remote", Some(false), None);
        let a = assess(&r, None, None);
        assert_eq!(a.decision, Decision::Irrelevant);
    }

    #[test]
    fn straight_latam_accept() {
        let lk = LocationKeywords {
            strong_positive_latam: vec!["remote - brazil".to_string()],
            ..Default::default()
        };
        let cfg = cfg_with_location(lk);
        let r = raw("Remote LATAM Engineer", "Remote - Brazil", Some(true), None);
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.decision, Decision::Relevant);
        assert_eq!(a.region, Some(HiringRegion::Latam));
        assert!(a.reason.to_lowercase().contains("remote - brazil"));
    }

    #[test]
    fn structural_rejection_with_empty_keyword_lists() {
        let cfg = cfg_with_location(LocationKeywords::default());
        let r = raw("Engineer", "Remote (US Only)", Some(true), None);
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.decision, Decision::Irrelevant);
    }

    #[test]
    fn contextual_override_rejects_on_nearby_negative() {
        let ck = ContentKeywords {
            strong_positive_global: vec!["fully remote".to_string()],
            strong_negative_timezone: vec!["pst".to_string()],
            ..Default::default()
        };
        let cfg = FilterConfig { content_keywords: ck, ..Default::default() };
        let mut r = raw("Engineer", "", Some(true), None);
        r.body_html = Some("Fully remote, but requires PST hours.".to_string());
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.decision, Decision::Irrelevant);
    }

    #[test]
    fn absent_config_falls_back_to_is_remote_only() {
        let r = raw("Engineer", "Everywhere", Some(true), Some(true));
        let a = assess(&r, None, None);
        assert_eq!(a.decision, Decision::Relevant);
        assert_eq!(a.region, Some(HiringRegion::Global));
        assert_eq!(a.reason, "isRemote fallback");
    }

    #[test]
    fn absent_config_without_is_remote_is_irrelevant() {
        let r = raw("Engineer", "Everywhere", Some(true), None);
        let a = assess(&r, None, None);
        assert_eq!(a.decision, Decision::Irrelevant);
    }

    #[test]
    fn case_insensitivity_holds() {
        let lk = LocationKeywords {
            strong_positive_latam: vec!["remote - brazil".to_string()],
            ..Default::default()
        };
        let cfg = cfg_with_location(lk);
        let lower = raw("engineer", "remote - brazil", Some(true), None);
        let upper = raw("ENGINEER", "REMOTE - BRAZIL", Some(true), None);
        let a1 = assess(&lower, Some(&cfg), None);
        let a2 = assess(&upper, Some(&cfg), None);
        assert_eq!(a1.decision, a2.decision);
        assert_eq!(a1.region, a2.region);
    }

    #[test]
    fn metadata_remote_eligible_true_accepts_global() {
        let mut cfg = FilterConfig::default();
        cfg.remote_metadata_fields.insert(
            "remote eligible".to_string(),
            RemoteMetadataField::Boolean { positive_value: serde_json::json!(true), negative_value: None },
        );
        let mut r = raw("Engineer", "", Some(true), None);
        r.metadata.push(("Remote Eligible".to_string(), serde_json::json!(true)));
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.decision, Decision::Relevant);
        assert_eq!(a.region, Some(HiringRegion::Global));
    }

    #[test]
    fn metadata_remote_eligible_false_rejects() {
        let mut cfg = FilterConfig::default();
        cfg.remote_metadata_fields.insert(
            "remote eligible".to_string(),
            RemoteMetadataField::Boolean { positive_value: serde_json::json!(true), negative_value: None },
        );
        let mut r = raw("Engineer", "", Some(true), None);
        r.metadata.push(("Remote Eligible".to_string(), serde_json::json!(false)));
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.decision, Decision::Irrelevant);
    }

    #[test]
    fn metadata_string_field_latam_token() {
        let mut cfg = FilterConfig::default();
        cfg.remote_metadata_fields.insert(
            "work location".to_string(),
            RemoteMetadataField::String {
                positive_values: vec![],
                allowed_values: vec!["latam".to_string(), "us".to_string()],
                disallowed_values: vec![],
            },
        );
        let mut r = raw("Engineer", "", Some(true), None);
        r.metadata.push(("Work Location".to_string(), serde_json::json!("LATAM")));
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.region, Some(HiringRegion::Latam));
    }

    #[test]
    fn lever_hybrid_needs_review() {
        let lk = LocationKeywords {
            strong_positive_global: vec!["hybrid remote".to_string()],
            ..Default::default()
        };
        let cfg = cfg_with_location(lk);
        let mut r = raw("Engineer", "Hybrid Remote - NYC", Some(true), None);
        r.workplace_type = Some("hybrid".to_string());
        let a = assess(&r, Some(&cfg), None);
        assert_eq!(a.decision, Decision::NeedsReview);
    }
}
