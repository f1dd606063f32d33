//! Per-provider filter configuration: JSON documents at
//! `config/<provider>-filter-config.json` describing the keyword lists and
//! metadata-field rules the relevance engine consults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::logging::SourceLogger;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LocationKeywords {
    #[serde(rename = "STRONG_POSITIVE_GLOBAL", default)]
    pub strong_positive_global: Vec<String>,
    #[serde(rename = "STRONG_POSITIVE_LATAM", default)]
    pub strong_positive_latam: Vec<String>,
    #[serde(rename = "STRONG_NEGATIVE_RESTRICTION", default)]
    pub strong_negative_restriction: Vec<String>,
    #[serde(rename = "AMBIGUOUS", default)]
    pub ambiguous: Vec<String>,
    #[serde(rename = "ACCEPT_EXACT_LATAM_COUNTRIES", default)]
    pub accept_exact_latam_countries: Vec<String>,
    #[serde(rename = "ACCEPT_EXACT_BRAZIL_TERMS", default)]
    pub accept_exact_brazil_terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ContentKeywords {
    #[serde(rename = "STRONG_POSITIVE_GLOBAL", default)]
    pub strong_positive_global: Vec<String>,
    #[serde(rename = "STRONG_POSITIVE_LATAM", default)]
    pub strong_positive_latam: Vec<String>,
    #[serde(rename = "STRONG_NEGATIVE_REGION", default)]
    pub strong_negative_region: Vec<String>,
    #[serde(rename = "STRONG_NEGATIVE_TIMEZONE", default)]
    pub strong_negative_timezone: Vec<String>,
    #[serde(rename = "ACCEPT_EXACT_BRAZIL_TERMS", default)]
    pub accept_exact_brazil_terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteMetadataField {
    Boolean {
        #[serde(rename = "positiveValue")]
        positive_value: serde_json::Value,
        #[serde(rename = "negativeValue", default)]
        negative_value: Option<serde_json::Value>,
    },
    String {
        #[serde(rename = "positiveValues", default)]
        positive_values: Vec<String>,
        #[serde(rename = "allowedValues", default)]
        allowed_values: Vec<String>,
        #[serde(rename = "disallowedValues", default)]
        disallowed_values: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilterConfig {
    #[serde(rename = "LOCATION_KEYWORDS", default)]
    pub location_keywords: LocationKeywords,
    #[serde(rename = "CONTENT_KEYWORDS", default)]
    pub content_keywords: ContentKeywords,
    #[serde(rename = "REMOTE_METADATA_FIELDS", default)]
    pub remote_metadata_fields: HashMap<String, RemoteMetadataField>,
    #[serde(rename = "PROCESS_JOBS_UPDATED_AFTER_DATE", default)]
    pub process_jobs_updated_after_date: Option<String>,
}

/// Loads and caches a single provider's [`FilterConfig`] for the lifetime of
/// a fetcher instance. First use parses the file; a parse or read failure is
/// logged once and cached as "absent" so relevance checks fall back to the
/// provider's own remote hint without retrying the read on every posting.
#[derive(Debug, Default)]
pub struct FilterConfigLoader {
    base_dir: PathBuf,
    cache: OnceLock<Option<FilterConfig>>,
}

impl FilterConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            cache: OnceLock::new(),
        }
    }

    /// Returns the cached config, loading it on first call. `None` means
    /// "skip that class of check" — never an error to the caller.
    pub fn get(&self, provider: &str, logger: &SourceLogger) -> Option<&FilterConfig> {
        self.cache
            .get_or_init(|| self.load(provider, logger))
            .as_ref()
    }

    fn load(&self, provider: &str, logger: &SourceLogger) -> Option<FilterConfig> {
        let path = self.base_dir.join(format!("{provider}-filter-config.json"));
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                logger.warn(&format!("filter config unavailable at {}: {e}", path.display()));
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                logger.error(&format!("filter config at {} failed to parse: {e}", path.display()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config_document() {
        let json = r#"{
            "LOCATION_KEYWORDS": {
                "STRONG_POSITIVE_LATAM": ["remote - brazil"],
                "STRONG_NEGATIVE_RESTRICTION": ["us only"]
            },
            "CONTENT_KEYWORDS": {
                "STRONG_POSITIVE_GLOBAL": ["fully remote"]
            },
            "REMOTE_METADATA_FIELDS": {
                "remote eligible": {"type": "boolean", "positiveValue": true}
            },
            "PROCESS_JOBS_UPDATED_AFTER_DATE": "2026-01-01T00:00:00Z"
        }"#;
        let cfg: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.location_keywords.strong_positive_latam, vec!["remote - brazil"]);
        assert_eq!(cfg.content_keywords.strong_positive_global, vec!["fully remote"]);
        assert!(cfg.remote_metadata_fields.contains_key("remote eligible"));
        assert!(cfg.process_jobs_updated_after_date.is_some());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let cfg: FilterConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.location_keywords.strong_positive_latam.is_empty());
        assert!(cfg.remote_metadata_fields.is_empty());
        assert!(cfg.process_jobs_updated_after_date.is_none());
    }

    #[test]
    fn loader_caches_absent_on_missing_file() {
        let loader = FilterConfigLoader::new("/nonexistent/path/for/test");
        let logger = SourceLogger::new("test", "test-source", 1);
        assert!(loader.get("greenhouse", &logger).is_none());
        // Second call hits the cache, not the filesystem again.
        assert!(loader.get("greenhouse", &logger).is_none());
    }

    #[test]
    fn loader_caches_absent_on_malformed_json() {
        let dir = tempdir();
        std::fs::write(dir.join("lever-filter-config.json"), "{not json").unwrap();
        let loader = FilterConfigLoader::new(&dir);
        let logger = SourceLogger::new("test", "test-source", 1);
        assert!(loader.get("lever", &logger).is_none());
    }

    #[test]
    fn loader_parses_real_file() {
        let dir = tempdir();
        std::fs::write(
            dir.join("ashby-filter-config.json"),
            r#"{"LOCATION_KEYWORDS": {"STRONG_POSITIVE_GLOBAL": ["worldwide"]}}"#,
        )
        .unwrap();
        let loader = FilterConfigLoader::new(&dir);
        let logger = SourceLogger::new("test", "test-source", 1);
        let cfg = loader.get("ashby", &logger).expect("config should load");
        assert_eq!(cfg.location_keywords.strong_positive_global, vec!["worldwide"]);
    }

    fn tempdir() -> PathBuf {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut dir = std::env::temp_dir();
        dir.push(format!("jobsync-test-{}-{n}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
