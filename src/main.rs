use clap::Parser;
use jobsync::config::Config;
use jobsync::orchestrator::{self, NullCacheInvalidator};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobsync=info")))
        .json()
        .init();

    let config = Config::parse();

    tracing::info!("connecting to database");
    let pool = jobsync::db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("running database migrations");
        jobsync::db::run_migrations(&pool).await?;
    }

    let cancellation = CancellationToken::new();
    let shutdown = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("shutdown signal received, finishing in-flight postings");
            shutdown.cancel();
        }
    });

    let summary = orchestrator::run_once(
        &pool,
        config.fetch_concurrency(),
        &config.filter_config_dir,
        &NullCacheInvalidator,
        cancellation,
    )
    .await?;

    tracing::info!(
        sources_processed = summary.sources_processed,
        jobs_found = summary.jobs_found,
        jobs_relevant = summary.jobs_relevant,
        jobs_processed = summary.jobs_processed,
        jobs_new = summary.jobs_new,
        jobs_updated = summary.jobs_updated,
        jobs_deduplicated = summary.jobs_deduplicated,
        jobs_errored = summary.jobs_errored,
        jobs_closed = summary.jobs_closed,
        "run summary",
    );

    // Per-source failures are surfaced in telemetry, not the exit code: the
    // orchestrator itself completed, so we exit 0 regardless of how many
    // individual sources or postings failed.
    Ok(())
}
