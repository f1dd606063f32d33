//! Structured logging context threaded through fetchers, the relevance
//! engine, and the adapter, instead of a single shared file-scoped logger.
//!
//! Every log line carries `{fetcher, source_name, source_id, job_id?,
//! job_title?, reason?, matched_keyword?}` so operators can filter a run's
//! logs down to one posting.

#[derive(Clone, Debug)]
pub struct SourceLogger {
    pub fetcher: &'static str,
    pub source_name: String,
    pub source_id: i32,
}

impl SourceLogger {
    pub fn new(fetcher: &'static str, source_name: impl Into<String>, source_id: i32) -> Self {
        Self {
            fetcher,
            source_name: source_name.into(),
            source_id,
        }
    }

    pub fn for_job(&self, job_id: impl Into<String>, job_title: impl Into<String>) -> JobLogger {
        JobLogger {
            source: self.clone(),
            job_id: job_id.into(),
            job_title: job_title.into(),
        }
    }

    pub fn warn(&self, reason: &str) {
        tracing::warn!(
            fetcher = self.fetcher,
            source_name = %self.source_name,
            source_id = self.source_id,
            reason,
        );
    }

    pub fn error(&self, reason: &str) {
        tracing::error!(
            fetcher = self.fetcher,
            source_name = %self.source_name,
            source_id = self.source_id,
            reason,
        );
    }

    pub fn info(&self, reason: &str) {
        tracing::info!(
            fetcher = self.fetcher,
            source_name = %self.source_name,
            source_id = self.source_id,
            reason,
        );
    }
}

#[derive(Clone, Debug)]
pub struct JobLogger {
    pub source: SourceLogger,
    pub job_id: String,
    pub job_title: String,
}

impl JobLogger {
    pub fn debug_match(&self, matched_keyword: &str, reason: &str) {
        tracing::debug!(
            fetcher = self.source.fetcher,
            source_name = %self.source.source_name,
            source_id = self.source.source_id,
            job_id = %self.job_id,
            job_title = %self.job_title,
            matched_keyword,
            reason,
        );
    }

    pub fn warn(&self, reason: &str) {
        tracing::warn!(
            fetcher = self.source.fetcher,
            source_name = %self.source.source_name,
            source_id = self.source.source_id,
            job_id = %self.job_id,
            job_title = %self.job_title,
            reason,
        );
    }
}
