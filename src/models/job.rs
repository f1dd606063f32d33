use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::source::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum JobStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Job {
    pub id: i32,
    pub company_id: i32,
    pub source: ProviderKind,
    pub source_posting_id: String,
    pub title: String,
    pub url: Option<String>,
    pub location: Option<String>,
    pub hiring_region: Option<String>,
    pub workplace_type: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub normalized_fingerprint: String,
    pub status: JobStatus,
    pub needs_review: bool,
    pub found_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A canonical posting ready to be written, produced by the adapter.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub company_id: i32,
    pub source: ProviderKind,
    pub source_posting_id: String,
    pub title: String,
    pub url: Option<String>,
    pub location: Option<String>,
    pub hiring_region: Option<String>,
    pub workplace_type: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub normalized_fingerprint: String,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// A different source already owns a row with the same
    /// `normalized_fingerprint`; that row was kept alive instead of
    /// inserting a second row for the same job.
    DeduplicatedAgainstExisting,
}

impl Job {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Job, AppError> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    /// Insert or refresh a posting. Every successful upsert marks the row
    /// `ACTIVE`, resurrecting it if a prior run had closed it — the source
    /// listing it again this run is proof it's still open.
    ///
    /// Dedup: `(source, source_posting_id)` is the per-source unique key.
    /// When no row exists for that key but another *source* already owns an
    /// `ACTIVE` row with the same `normalized_fingerprint`, that row is kept
    /// alive instead of inserting a duplicate — the fetcher isn't told, so a
    /// single job cross-posted on two ATS boards surfaces once. A `CLOSED`
    /// fingerprint match does not suppress the insert: the old posting is
    /// gone and this is a new, independent one.
    pub async fn upsert(pool: &PgPool, input: NewJob) -> Result<(Job, UpsertOutcome), AppError> {
        let mut tx = pool.begin().await?;

        if let Some(existing) = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE normalized_fingerprint = $1 AND source != $2 AND status = 'ACTIVE'",
        )
        .bind(&input.normalized_fingerprint)
        .bind(input.source)
        .fetch_optional(&mut *tx)
        .await?
        {
            let refreshed = sqlx::query_as::<_, Job>(
                "UPDATE jobs SET status = 'ACTIVE', found_at = NOW(), updated_at = NOW()
                 WHERE id = $1 RETURNING *",
            )
            .bind(existing.id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok((refreshed, UpsertOutcome::DeduplicatedAgainstExisting));
        }

        let existing_by_key = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM jobs WHERE source = $1 AND source_posting_id = $2",
        )
        .bind(input.source)
        .bind(&input.source_posting_id)
        .fetch_optional(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (
                company_id, source, source_posting_id, title, url, location,
                hiring_region, workplace_type, job_type, experience_level,
                skills, tags, description, requirements, responsibilities, benefits,
                salary_min, salary_max, salary_currency, normalized_fingerprint,
                status, needs_review, found_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, 'ACTIVE', $21, NOW()
            )
            ON CONFLICT (source, source_posting_id) DO UPDATE SET
                company_id = excluded.company_id,
                title = excluded.title,
                url = excluded.url,
                location = excluded.location,
                hiring_region = excluded.hiring_region,
                workplace_type = excluded.workplace_type,
                job_type = excluded.job_type,
                experience_level = excluded.experience_level,
                skills = excluded.skills,
                tags = excluded.tags,
                description = excluded.description,
                requirements = excluded.requirements,
                responsibilities = excluded.responsibilities,
                benefits = excluded.benefits,
                salary_min = excluded.salary_min,
                salary_max = excluded.salary_max,
                salary_currency = excluded.salary_currency,
                normalized_fingerprint = excluded.normalized_fingerprint,
                status = 'ACTIVE',
                needs_review = excluded.needs_review,
                found_at = NOW(),
                updated_at = NOW()
            RETURNING *",
        )
        .bind(input.company_id)
        .bind(input.source)
        .bind(&input.source_posting_id)
        .bind(&input.title)
        .bind(&input.url)
        .bind(&input.location)
        .bind(&input.hiring_region)
        .bind(&input.workplace_type)
        .bind(&input.job_type)
        .bind(&input.experience_level)
        .bind(&input.skills)
        .bind(&input.tags)
        .bind(&input.description)
        .bind(&input.requirements)
        .bind(&input.responsibilities)
        .bind(&input.benefits)
        .bind(input.salary_min)
        .bind(input.salary_max)
        .bind(&input.salary_currency)
        .bind(&input.normalized_fingerprint)
        .bind(input.needs_review)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let outcome = if existing_by_key.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        Ok((job, outcome))
    }

    /// Close every `ACTIVE` job for `source` whose `source_posting_id` is
    /// not in `still_present`. Called once per provider kind, only when
    /// that kind had at least one successful fetch this run.
    pub async fn deactivate_missing(
        pool: &PgPool,
        source: ProviderKind,
        still_present: &[String],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'CLOSED', updated_at = NOW()
             WHERE source = $1 AND status = 'ACTIVE' AND NOT (source_posting_id = ANY($2))",
        )
        .bind(source)
        .bind(still_present)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
