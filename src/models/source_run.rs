use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

/// Error messages longer than this are truncated before being persisted —
/// a single pathological provider response shouldn't blow up the row size.
const ERROR_MESSAGE_MAX_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Partial,
    Failure,
}

/// Per-source counters accumulated while a fetch runs, written once at the
/// end as a `SourceRun` row.
#[derive(Debug, Clone, Default)]
pub struct SourceRunStats {
    pub jobs_found: i32,
    pub jobs_relevant: i32,
    pub jobs_processed: i32,
    pub jobs_new: i32,
    pub jobs_updated: i32,
    pub jobs_errored: i32,
    pub fetch_failed: bool,
    pub error_message: Option<String>,
}

impl SourceRunStats {
    /// SUCCESS when every posting processed cleanly, PARTIAL when some
    /// postings errored but at least one was relevant/processed, FAILURE
    /// when the fetch could not even retrieve the source's listing, or
    /// every posting that was attempted errored.
    pub fn status(&self) -> RunStatus {
        if self.fetch_failed {
            RunStatus::Failure
        } else if self.jobs_errored > 0 {
            if self.jobs_relevant > 0 {
                RunStatus::Partial
            } else {
                RunStatus::Failure
            }
        } else {
            RunStatus::Success
        }
    }

    fn truncated_error(&self) -> Option<String> {
        self.error_message.as_ref().map(|msg| {
            if msg.len() > ERROR_MESSAGE_MAX_LEN {
                msg.chars().take(ERROR_MESSAGE_MAX_LEN).collect()
            } else {
                msg.clone()
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SourceRun {
    pub id: i32,
    pub source_id: i32,
    pub status: RunStatus,
    pub jobs_found: i32,
    pub jobs_relevant: i32,
    pub jobs_processed: i32,
    pub jobs_new: i32,
    pub jobs_updated: i32,
    pub jobs_errored: i32,
    pub duration_ms: i64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl SourceRun {
    pub async fn record(
        pool: &PgPool,
        source_id: i32,
        stats: &SourceRunStats,
        started_at: DateTime<Utc>,
        duration_ms: i64,
    ) -> Result<SourceRun, AppError> {
        sqlx::query_as::<_, SourceRun>(
            "INSERT INTO source_runs (
                source_id, status, jobs_found, jobs_relevant, jobs_processed, jobs_new, jobs_updated,
                jobs_errored, duration_ms, error_message, started_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *",
        )
        .bind(source_id)
        .bind(stats.status())
        .bind(stats.jobs_found)
        .bind(stats.jobs_relevant)
        .bind(stats.jobs_processed)
        .bind(stats.jobs_new)
        .bind(stats.jobs_updated)
        .bind(stats.jobs_errored)
        .bind(duration_ms)
        .bind(stats.truncated_error())
        .bind(started_at)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_success_when_nothing_errored() {
        let stats = SourceRunStats { jobs_found: 10, jobs_relevant: 4, ..Default::default() };
        assert_eq!(stats.status(), RunStatus::Success);
    }

    #[test]
    fn status_is_partial_when_some_postings_errored() {
        let stats = SourceRunStats { jobs_found: 10, jobs_errored: 2, ..Default::default() };
        assert_eq!(stats.status(), RunStatus::Partial);
    }

    #[test]
    fn status_is_failure_when_fetch_itself_failed() {
        let stats = SourceRunStats { fetch_failed: true, jobs_errored: 0, ..Default::default() };
        assert_eq!(stats.status(), RunStatus::Failure);
    }

    #[test]
    fn status_is_failure_when_every_attempted_posting_errored() {
        let stats = SourceRunStats { jobs_found: 3, jobs_errored: 3, jobs_relevant: 0, ..Default::default() };
        assert_eq!(stats.status(), RunStatus::Failure);
    }

    #[test]
    fn error_message_truncated_to_max_len() {
        let stats = SourceRunStats {
            error_message: Some("x".repeat(2000)),
            ..Default::default()
        };
        assert_eq!(stats.truncated_error().unwrap().len(), ERROR_MESSAGE_MAX_LEN);
    }

    #[test]
    fn short_error_message_untouched() {
        let stats = SourceRunStats { error_message: Some("boom".to_string()), ..Default::default() };
        assert_eq!(stats.truncated_error().unwrap(), "boom");
    }
}
