use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ProviderKind {
    Greenhouse,
    Ashby,
    Lever,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Greenhouse => "greenhouse",
            ProviderKind::Ashby => "ashby",
            ProviderKind::Lever => "lever",
        }
    }
}

/// A configured ATS source to poll: one board/site per row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JobSource {
    pub id: i32,
    pub kind: ProviderKind,
    pub display_name: String,
    pub company_id: Option<i32>,
    pub config: serde_json::Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSource {
    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<JobSource>, AppError> {
        let sources = sqlx::query_as::<_, JobSource>(
            "SELECT * FROM job_sources WHERE enabled ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(sources)
    }

    /// The provider-specific board/site identifier this source polls
    /// (`boardToken` / `jobBoardName` / `companyIdentifier` per kind).
    pub fn provider_identifier(&self) -> Result<&str, AppError> {
        let key = match self.kind {
            ProviderKind::Greenhouse => "boardToken",
            ProviderKind::Ashby => "jobBoardName",
            ProviderKind::Lever => "companyIdentifier",
        };
        self.config
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::SourceConfigInvalid(format!(
                    "source {} ({}) is missing required config key {key}",
                    self.id,
                    self.kind.as_str()
                ))
            })
    }
}
