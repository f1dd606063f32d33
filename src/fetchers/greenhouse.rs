//! Greenhouse Job Board API v1 client.
//!
//! Wire shapes grounded on the `nicolad-nomadically.work` ashby-crawler
//! reference (`other_examples/`); this module adds the HTTP fetch and the
//! mapping into [`NormalizedRaw`].

use serde::Deserialize;

use crate::error::AppError;
use crate::fetchers::RawPosting;
use crate::relevance::NormalizedRaw;
use crate::text::parse_date;

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseLocation {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseOffice {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseMetadataField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseJob {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub absolute_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub location: Option<GreenhouseLocation>,
    #[serde(default)]
    pub offices: Option<Vec<GreenhouseOffice>>,
    #[serde(default)]
    pub metadata: Option<Vec<GreenhouseMetadataField>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseBoardResponse {
    #[serde(default)]
    pub jobs: Vec<GreenhouseJob>,
}

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

/// Fetch all jobs from a Greenhouse board. A 404 means the board is empty
/// or inactive — returned as an empty list, not an error.
pub async fn fetch(token: &str) -> Result<Vec<RawPosting>, AppError> {
    fetch_from(API_BASE, token).await
}

async fn fetch_from(base: &str, token: &str) -> Result<Vec<RawPosting>, AppError> {
    let url = format!("{base}/{token}/jobs?content=true");
    let response = crate::fetchers::http_client().get(&url).send().await?;
    if response.status().as_u16() == 404 {
        return Ok(Vec::new());
    }
    let response = response.error_for_status()?;
    let board: GreenhouseBoardResponse = response.json().await?;
    Ok(board.jobs.into_iter().map(RawPosting::Greenhouse).collect())
}

impl GreenhouseJob {
    pub fn normalize(&self) -> NormalizedRaw {
        let mut locations: Vec<String> = Vec::new();
        if let Some(name) = self.location.as_ref().and_then(|l| l.name.clone()) {
            locations.push(name);
        }
        if let Some(offices) = &self.offices {
            locations.extend(offices.iter().filter_map(|o| o.name.clone()));
        }

        let metadata = self
            .metadata
            .as_ref()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| Some((f.name.clone()?, f.value.clone().unwrap_or(serde_json::Value::Null))))
                    .collect()
            })
            .unwrap_or_default();

        NormalizedRaw {
            provider_posting_id: self.id.to_string(),
            title: self.title.clone(),
            locations,
            body_html: self.content.clone(),
            is_listed: None,
            is_remote: None,
            updated_at: parse_date(self.updated_at.as_deref()),
            metadata,
            workplace_type: None,
            compensation: None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.absolute_url.as_deref()
    }
}
