//! Lever Postings API v0 client.
//!
//! Wire shapes grounded on the `nicolad-nomadically.work` ashby-crawler
//! reference (`other_examples/`).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::fetchers::RawPosting;
use crate::relevance::NormalizedRaw;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverCategories {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub all_locations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverPosting {
    pub id: String,
    /// Job title.
    pub text: String,
    #[serde(default)]
    pub categories: Option<LeverCategories>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_body: Option<String>,
    #[serde(default)]
    pub opening: Option<String>,
    #[serde(default)]
    pub hosted_url: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
    /// `onsite`, `remote`, `hybrid`, `unspecified`.
    #[serde(default)]
    pub workplace_type: Option<String>,
    /// Unix timestamp in milliseconds.
    #[serde(default)]
    pub created_at: Option<f64>,
}

const API_BASE: &str = "https://api.lever.co/v0/postings";

/// Fetch all postings from one Lever site. A 404 means the site is
/// inactive — returned as an empty list, not an error.
pub async fn fetch(site: &str) -> Result<Vec<RawPosting>, AppError> {
    fetch_from(API_BASE, site).await
}

async fn fetch_from(base: &str, site: &str) -> Result<Vec<RawPosting>, AppError> {
    let url = format!("{base}/{site}?mode=json");
    let response = crate::fetchers::http_client().get(&url).send().await?;
    if response.status().as_u16() == 404 {
        return Ok(Vec::new());
    }
    let response = response.error_for_status()?;
    let postings: Vec<LeverPosting> = response.json().await?;
    Ok(postings.into_iter().map(RawPosting::Lever).collect())
}

impl LeverPosting {
    pub fn normalize(&self) -> NormalizedRaw {
        let mut locations: Vec<String> = Vec::new();
        if let Some(categories) = &self.categories {
            if let Some(loc) = &categories.location {
                locations.push(loc.clone());
            }
            if let Some(all) = &categories.all_locations {
                locations.extend(all.iter().cloned());
            }
        }

        let body_html = self
            .description
            .clone()
            .or_else(|| self.description_body.clone())
            .or_else(|| self.opening.clone());

        let updated_at = self
            .created_at
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64));

        NormalizedRaw {
            provider_posting_id: self.id.clone(),
            title: self.text.clone(),
            locations,
            body_html,
            is_listed: None,
            is_remote: None,
            updated_at,
            metadata: Vec::new(),
            workplace_type: self.workplace_type.clone(),
            compensation: None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.hosted_url.as_deref().or(self.apply_url.as_deref())
    }
}
