//! Blooters Ingestion Service
//!
//! Polls r/soccer for goal clips:
//! 1. Fetches the newest posts and keeps the "Media" ones
//! 2. Parses each title into a goal
//! 3. Looks up the mirrors comment
//! 4. Groups goals into games and stores them
//! 5. Periodically retries missing mirrors links and deletes old games
//!
//! Pass `--dry-run` to keep everything in memory instead of Postgres.

mod aggregator;
mod enrichment;
mod errors;
mod filter;
mod maintenance;
mod pipeline;
mod reddit;
mod scheduler;
mod title;
mod upsert;

use anyhow::Context;
use blooters_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    metrics, MatchStore, MemoryStore, Repository, VERSION,
};
use enrichment::{build_throttle, AuxLinkFetcher};
use filter::PostFilter;
use metrics_exporter_prometheus::PrometheusBuilder;
use pipeline::IngestionPipeline;
use reddit::{FeedSource, RedditClient};
use scheduler::{Ingestor, Schedule};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("loading configuration")?);

    init_tracing(&config.observability);
    info!("Starting Blooters Ingestion Service v{}", VERSION);

    // Metrics exporter
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .with_http_listener(addr)
            .install()
            .context("installing metrics exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }

    // Store
    let dry_run = std::env::args().any(|arg| arg == "--dry-run");
    let store: Arc<dyn MatchStore> = if dry_run {
        info!("Dry run: goals are kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        let db = DbPool::new(&config.database).await.context("connecting to database")?;
        db.ensure_schema().await.context("applying schema")?;
        Arc::new(Repository::new(db))
    };

    let ingestor = Arc::new(build_ingestor(&config, store)?);

    // One cycle right away, then on the timer
    ingestor
        .run(
            Schedule {
                poll: config.poll_interval(),
                backfill: config.backfill_interval(),
                sweep: config.retention_interval(),
            },
            shutdown_signal(),
        )
        .await;

    info!("Ingestion service shutdown complete");
    Ok(())
}

fn build_ingestor(config: &AppConfig, store: Arc<dyn MatchStore>) -> Result<Ingestor, errors::IngestionError> {
    let source: Arc<dyn FeedSource> = Arc::new(RedditClient::new(&config.reddit)?);

    // Feed and thread fetches share one throttle
    let throttle = build_throttle(config.enrichment.requests_per_second)?;

    let fetcher = config.enrichment.enabled.then(|| {
        Arc::new(AuxLinkFetcher::new(
            source.clone(),
            throttle.clone(),
            &config.enrichment,
            config.reddit.base_url.clone(),
        ))
    });

    let pipeline = IngestionPipeline::new(
        source,
        PostFilter::new(config.reddit.media_flair.clone()),
        fetcher.clone(),
        throttle,
        config.reddit.feed_limit,
        config.reddit.base_url.clone(),
    );

    Ok(Ingestor::new(
        pipeline,
        store,
        fetcher,
        config.ingestion.backfill_limit,
        config.retention_window(),
    ))
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(observability.log_level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
