//! Ashby Posting API client.
//!
//! Wire shapes grounded on the `nicolad-nomadically.work` ashby-crawler
//! reference (`other_examples/`).

use serde::Deserialize;

use crate::error::AppError;
use crate::fetchers::RawPosting;
use crate::relevance::{CompensationRange, NormalizedRaw};
use crate::text::parse_date;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AshbyApiSecondaryLocation {
    #[serde(default)]
    pub location: Option<String>,
}

/// One band of `compensation.summaryComponents`, requested via
/// `?includeCompensation=true`. Ashby reports a component per pay type
/// (salary, equity, ...); only the salary-shaped ones carry a currency.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AshbyCompensationComponent {
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AshbyCompensation {
    #[serde(default)]
    pub summary_components: Option<Vec<AshbyCompensationComponent>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AshbyJobPosting {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub description_plain: Option<String>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
    #[serde(default)]
    pub is_remote: Option<bool>,
    #[serde(default)]
    pub is_listed: Option<bool>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub secondary_locations: Option<Vec<AshbyApiSecondaryLocation>>,
    #[serde(default)]
    pub compensation: Option<AshbyCompensation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AshbyJobBoardResponse {
    #[serde(default)]
    pub jobs: Vec<AshbyJobPosting>,
}

const API_BASE: &str = "https://api.ashbyhq.com/posting-api/job-board";

/// Fetch all postings from one Ashby job board. A 404 means the board is
/// inactive — returned as an empty list, not an error.
pub async fn fetch(slug: &str) -> Result<Vec<RawPosting>, AppError> {
    fetch_from(API_BASE, slug).await
}

async fn fetch_from(base: &str, slug: &str) -> Result<Vec<RawPosting>, AppError> {
    let url = format!("{base}/{slug}?includeCompensation=true");
    let response = crate::fetchers::http_client().get(&url).send().await?;
    if response.status().as_u16() == 404 {
        return Ok(Vec::new());
    }
    let response = response.error_for_status()?;
    let board: AshbyJobBoardResponse = response.json().await?;
    Ok(board.jobs.into_iter().map(RawPosting::Ashby).collect())
}

impl AshbyJobPosting {
    pub fn normalize(&self) -> NormalizedRaw {
        let mut locations: Vec<String> = Vec::new();
        if let Some(name) = self.location_name.clone().or_else(|| self.location.clone()) {
            locations.push(name);
        }
        if let Some(secondary) = &self.secondary_locations {
            locations.extend(secondary.iter().filter_map(|l| l.location.clone()));
        }

        NormalizedRaw {
            provider_posting_id: self.id.clone(),
            title: self.title.clone(),
            locations,
            body_html: self.description_html.clone().or_else(|| self.description_plain.clone()),
            is_listed: self.is_listed,
            is_remote: self.is_remote,
            updated_at: parse_date(self.published_at.as_deref()),
            metadata: Vec::new(),
            workplace_type: None,
            compensation: self.compensation_range(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.job_url.as_deref().or(self.apply_url.as_deref())
    }

    /// The first `summaryComponents` entry that carries a currency code —
    /// Ashby reports one component per pay type (salary, equity, bonus...)
    /// and only the salary-shaped ones name a currency.
    fn compensation_range(&self) -> Option<CompensationRange> {
        let component = self
            .compensation
            .as_ref()?
            .summary_components
            .as_ref()?
            .iter()
            .find(|c| c.currency_code.is_some())?;
        Some(CompensationRange {
            min: component.min_value.map(|v| v as i32),
            max: component.max_value.map(|v| v as i32),
            currency: component.currency_code.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_prefers_location_name_then_secondary_locations() {
        let json = r#"{
            "id": "abc",
            "title": "Support Engineer",
            "location": "Remote",
            "locationName": "Remote - LATAM",
            "isListed": true,
            "isRemote": true,
            "secondaryLocations": [{"location": "Brazil"}, {"location": "Argentina"}]
        }"#;
        let posting: AshbyJobPosting = serde_json::from_str(json).unwrap();
        let normalized = posting.normalize();
        assert_eq!(normalized.locations, vec!["Remote - LATAM", "Brazil", "Argentina"]);
        assert_eq!(normalized.is_listed, Some(true));
        assert_eq!(normalized.is_remote, Some(true));
    }

    #[test]
    fn normalize_falls_back_to_plain_description() {
        let json = r#"{"id": "x", "title": "Engineer", "descriptionPlain": "Plain body"}"#;
        let posting: AshbyJobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(posting.normalize().body_html.as_deref(), Some("Plain body"));
    }

    #[test]
    fn normalize_extracts_compensation_from_salary_component() {
        let json = r#"{
            "id": "abc",
            "title": "Engineer",
            "compensation": {
                "summaryComponents": [
                    {"minValue": 120000.0, "maxValue": 160000.0, "currencyCode": "USD"},
                    {"minValue": 0.1, "maxValue": 0.5, "currencyCode": null}
                ]
            }
        }"#;
        let posting: AshbyJobPosting = serde_json::from_str(json).unwrap();
        let compensation = posting.normalize().compensation.unwrap();
        assert_eq!(compensation.min, Some(120000));
        assert_eq!(compensation.max, Some(160000));
        assert_eq!(compensation.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn normalize_has_no_compensation_when_not_requested() {
        let json = r#"{"id": "abc", "title": "Engineer"}"#;
        let posting: AshbyJobPosting = serde_json::from_str(json).unwrap();
        assert!(posting.normalize().compensation.is_none());
    }

    #[tokio::test]
    async fn fetch_from_parses_mocked_board_response() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jobs": [{"id": "abc", "title": "Engineer", "isListed": true}]
            })))
            .mount(&server)
            .await;

        let postings = fetch_from(&server.uri(), "acme").await.unwrap();
        assert_eq!(postings.len(), 1);
    }

    #[tokio::test]
    async fn fetch_from_treats_404_as_empty_board() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let postings = fetch_from(&server.uri(), "gone").await.unwrap();
        assert!(postings.is_empty());
    }
}
