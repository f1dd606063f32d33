//! Job processing adapter and canonical mapper (C6): turns one
//! [`RawPosting`] plus its [`Assessment`] into a [`NewJob`] row and writes
//! it through [`Job::upsert`].

use std::sync::LazyLock;

use sqlx::PgPool;

use crate::error::AppError;
use crate::fetchers::RawPosting;
use crate::logging::JobLogger;
use crate::models::company::Company;
use crate::models::job::{Job, NewJob, UpsertOutcome};
use crate::models::source::JobSource;
use crate::relevance::{Assessment, Decision, HiringRegion};
use crate::text::{normalize_for_deduplication, strip_html};

/// English + Portuguese section headings this adapter recognizes when
/// splitting a posting body into requirements/responsibilities/benefits.
/// Ordered so the scan for "where does this section end" can stop at the
/// next heading regardless of language.
const REQUIREMENTS_HEADINGS: &[&str] = &["requirements", "qualifications", "requisitos", "qualificações"];
const RESPONSIBILITIES_HEADINGS: &[&str] =
    &["responsibilities", "what you'll do", "responsabilidades", "o que você fará"];
const BENEFITS_HEADINGS: &[&str] = &["benefits", "perks", "benefícios", "vantagens"];

const JOB_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("full-time", "full_time"),
    ("full time", "full_time"),
    ("part-time", "part_time"),
    ("part time", "part_time"),
    ("contract", "contract"),
    ("internship", "internship"),
    ("temporary", "temporary"),
];

const EXPERIENCE_LEVEL_KEYWORDS: &[(&str, &str)] = &[
    ("principal", "principal"),
    ("staff", "staff"),
    ("senior", "senior"),
    ("lead", "lead"),
    ("junior", "junior"),
    ("entry-level", "entry_level"),
    ("entry level", "entry_level"),
    ("intern", "intern"),
];

static ALL_HEADINGS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    REQUIREMENTS_HEADINGS
        .iter()
        .chain(RESPONSIBILITIES_HEADINGS)
        .chain(BENEFITS_HEADINGS)
        .copied()
        .collect()
});

/// Every occurrence of a heading in `text`, lowercase-matched, with the
/// byte offset right after the heading word.
fn heading_offsets(text: &str, headings: &[&str]) -> Vec<usize> {
    let lower = text.to_lowercase();
    headings
        .iter()
        .filter_map(|h| lower.find(h).map(|pos| pos + h.len()))
        .collect()
}

/// Text between the first occurrence of any of `headings` and the next
/// heading from the full cross-language heading list (or end of text).
fn extract_section(text: &str, headings: &[&str]) -> Option<String> {
    let start = heading_offsets(text, headings).into_iter().min()?;
    let lower = text.to_lowercase();
    let next = ALL_HEADINGS
        .iter()
        .filter_map(|h| lower[start..].find(h).map(|pos| start + pos))
        .min()
        .unwrap_or(text.len());
    let section = text[start..next].trim_start_matches([':', '\n', ' ']).trim();
    if section.is_empty() { None } else { Some(section.to_string()) }
}

fn detect_job_type(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    JOB_TYPE_KEYWORDS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, tag)| tag.to_string())
}

fn detect_experience_level(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    EXPERIENCE_LEVEL_KEYWORDS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, tag)| tag.to_string())
}

/// A handful of comma/bullet-separated skill tokens pulled from a
/// "Skills"-labelled section, if the posting has one. Best-effort — absent
/// a recognizable section this returns an empty list rather than guessing.
fn extract_skills(text: &str) -> Vec<String> {
    let Some(section) = extract_section(text, &["skills", "tech stack", "habilidades"]) else {
        return Vec::new();
    };
    section
        .split(['\n', ',', '•', '-'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && s.len() < 40)
        .take(20)
        .map(|s| s.to_string())
        .collect()
}

fn hiring_region_tag(region: Option<HiringRegion>) -> Option<String> {
    match region {
        Some(HiringRegion::Global) => Some("GLOBAL".to_string()),
        Some(HiringRegion::Latam) => Some("LATAM".to_string()),
        None => None,
    }
}

/// Build the canonical row for one accepted posting and write it through
/// [`Job::upsert`]. Returns `None` when `assessment.decision` is
/// `Irrelevant` — callers should skip rather than call this at all, but
/// treating it as a no-op keeps the function total.
pub async fn process_posting(
    pool: &PgPool,
    source: &JobSource,
    raw: &RawPosting,
    assessment: &Assessment,
    company_name: &str,
    logger: &JobLogger,
) -> Result<Option<(Job, UpsertOutcome)>, AppError> {
    if assessment.decision == Decision::Irrelevant {
        return Ok(None);
    }

    let normalized = raw.normalize();
    let company = match source.company_id {
        Some(id) => Company::get(pool, id).await?,
        None => Company::find_or_create(pool, company_name).await?,
    };
    let body = strip_html(normalized.body_html.as_deref());
    let title = normalized.title.trim().to_string();
    let compensation = normalized.compensation.clone().unwrap_or_default();

    let new_job = NewJob {
        company_id: company.id,
        source: source.kind,
        source_posting_id: normalized.provider_posting_id.clone(),
        url: raw.url().map(str::to_string),
        location: if normalized.locations.is_empty() {
            None
        } else {
            Some(normalized.locations.join("; "))
        },
        hiring_region: hiring_region_tag(assessment.region),
        workplace_type: normalized.workplace_type.clone().or_else(|| {
            Some(if normalized.is_remote == Some(true) { "remote".to_string() } else { "unspecified".to_string() })
        }),
        job_type: detect_job_type(&body),
        experience_level: detect_experience_level(&body),
        skills: extract_skills(&body),
        tags: Vec::new(),
        description: if body.is_empty() { None } else { Some(body.clone()) },
        requirements: extract_section(&body, REQUIREMENTS_HEADINGS),
        responsibilities: extract_section(&body, RESPONSIBILITIES_HEADINGS),
        benefits: extract_section(&body, BENEFITS_HEADINGS),
        salary_min: compensation.min,
        salary_max: compensation.max,
        salary_currency: compensation.currency.clone(),
        normalized_fingerprint: normalize_for_deduplication(&format!("{title} {company_name}")),
        needs_review: assessment.decision == Decision::NeedsReview,
        title,
    };

    let result = Job::upsert(pool, new_job).await?;
    if assessment.decision == Decision::NeedsReview {
        logger.warn("posting accepted but flagged needs_review (hybrid workplace_type)");
    }
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_requirements_section_stopping_at_next_heading() {
        let text = "Requirements: 5 years experience, Rust.\n\nResponsibilities: Ship features.";
        let reqs = extract_section(text, REQUIREMENTS_HEADINGS).unwrap();
        assert!(reqs.contains("5 years experience"));
        assert!(!reqs.to_lowercase().contains("ship features"));
    }

    #[test]
    fn extracts_portuguese_headings() {
        let text = "Requisitos: Experiência com Rust.\n\nBenefícios: Plano de saude.";
        let reqs = extract_section(text, REQUIREMENTS_HEADINGS).unwrap();
        assert!(reqs.contains("Experiência"));
        let benefits = extract_section(text, BENEFITS_HEADINGS).unwrap();
        assert!(benefits.contains("Plano de saude"));
    }

    #[test]
    fn detects_job_type_and_experience_level() {
        let text = "This is a full-time senior role.";
        assert_eq!(detect_job_type(text).as_deref(), Some("full_time"));
        assert_eq!(detect_experience_level(text).as_deref(), Some("senior"));
    }

    #[test]
    fn no_skills_section_returns_empty_vec() {
        assert!(extract_skills("Just a plain description with no sections.").is_empty());
    }
}
