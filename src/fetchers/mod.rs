//! Source fetchers (C5): one HTTP client per ATS provider, each returning
//! [`RawPosting`]s the relevance engine and adapter can then process
//! uniformly via [`RawPosting::normalize`].

pub mod ashby;
pub mod greenhouse;
pub mod lever;

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::AppError;
use crate::models::source::{JobSource, ProviderKind};
use crate::relevance::NormalizedRaw;

/// Provider HTTP timeout per spec.md §4.5: "HTTP GET with 30–45 s timeout".
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(40);

static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// The shared client every provider fetcher issues its GET through: a
/// 40s timeout (so a hanging provider surfaces as a `FAILURE` run instead
/// of starving its `buffer_unordered` slot forever) and an `Accept:
/// application/json` header, per spec.md §4.5/§6.
pub fn http_client() -> &'static reqwest::Client {
    HTTP_CLIENT.get_or_init(|| {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .default_headers(headers)
            .build()
            .expect("static client configuration is always valid")
    })
}

#[derive(Debug, Clone)]
pub enum RawPosting {
    Greenhouse(greenhouse::GreenhouseJob),
    Ashby(ashby::AshbyJobPosting),
    Lever(lever::LeverPosting),
}

impl RawPosting {
    pub fn normalize(&self) -> NormalizedRaw {
        match self {
            RawPosting::Greenhouse(job) => job.normalize(),
            RawPosting::Ashby(posting) => posting.normalize(),
            RawPosting::Lever(posting) => posting.normalize(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            RawPosting::Greenhouse(job) => job.url(),
            RawPosting::Ashby(posting) => posting.url(),
            RawPosting::Lever(posting) => posting.url(),
        }
    }
}

/// Fetch every posting currently listed for `source`, dispatching to the
/// provider client its `kind` names. The caller is responsible for
/// validating `source.config` beforehand via
/// [`JobSource::provider_identifier`].
pub async fn fetch_for_source(source: &JobSource) -> Result<Vec<RawPosting>, AppError> {
    let identifier = source.provider_identifier()?;
    match source.kind {
        ProviderKind::Greenhouse => greenhouse::fetch(identifier).await,
        ProviderKind::Ashby => ashby::fetch(identifier).await,
        ProviderKind::Lever => lever::fetch(identifier).await,
    }
}
