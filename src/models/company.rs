use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))
    }

    /// Resolve a company by name, creating it if this is the first source
    /// to mention it. Matching is case-insensitive on `name`.
    pub async fn find_or_create(pool: &PgPool, name: &str) -> Result<Company, AppError> {
        if let Some(existing) =
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE lower(name) = lower($1)")
                .bind(name)
                .fetch_optional(pool)
                .await?
        {
            return Ok(existing);
        }

        sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = excluded.name
             RETURNING *",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }
}
