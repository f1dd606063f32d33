use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "fetch-job-sources", about = "Harvests ATS job postings, filters for relevance, and reconciles closures")]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// Upper bound on sources fetched concurrently
    #[arg(long, env = "FETCH_CONCURRENCY", default_value = "5")]
    pub fetch_concurrency: usize,

    /// Directory holding `<provider>-filter-config.json` documents
    #[arg(long, env = "FILTER_CONFIG_DIR", default_value = "config")]
    pub filter_config_dir: String,
}

impl Config {
    /// `fetch_concurrency` clamped to a minimum of 1 — a misconfigured `0`
    /// must not stall the orchestrator entirely.
    pub fn fetch_concurrency(&self) -> usize {
        self.fetch_concurrency.max(1)
    }
}
