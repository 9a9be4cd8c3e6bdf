//! Poll loop
//!
//! Drives fetch and store on the poll timer, the mirrors backfill on a slower
//! one and the retention sweep on a third. Cycles and backfill passes never
//! overlap.

use crate::aggregator::group;
use crate::enrichment::AuxLinkFetcher;
use crate::errors::IngestionError;
use crate::maintenance::{backfill_aux_links, sweep_old_matches};
use crate::pipeline::IngestionPipeline;
use crate::upsert::{upsert_matches, UpsertReport};
use blooters_common::MatchStore;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// Summary of one completed cycle
#[derive(Debug, Default)]
pub struct CycleSummary {
    pub parsed: usize,
    pub skipped: usize,
    pub upsert: UpsertReport,
}

/// Timer periods for `Ingestor::run`
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub poll: Duration,
    pub backfill: Duration,
    pub sweep: Duration,
}

pub struct Ingestor {
    pipeline: IngestionPipeline,
    store: Arc<dyn MatchStore>,
    fetcher: Option<Arc<AuxLinkFetcher>>,
    backfill_limit: u64,
    retention: Option<chrono::Duration>,
    cycle_lock: Mutex<()>,
}

impl Ingestor {
    pub fn new(
        pipeline: IngestionPipeline,
        store: Arc<dyn MatchStore>,
        fetcher: Option<Arc<AuxLinkFetcher>>,
        backfill_limit: u64,
        retention: Option<chrono::Duration>,
    ) -> Self {
        Self {
            pipeline,
            store,
            fetcher,
            backfill_limit,
            retention,
            cycle_lock: Mutex::new(()),
        }
    }

    /// One fetch and store pass.
    ///
    /// Fails with `CycleInProgress` while another cycle holds the lock.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleSummary, IngestionError> {
        let _guard = self
            .cycle_lock
            .try_lock()
            .map_err(|_| IngestionError::CycleInProgress)?;

        let report = self.pipeline.run().await?;
        let matches = group(report.goals, Utc::now());
        let upsert = upsert_matches(self.store.as_ref(), &matches).await;

        Ok(CycleSummary {
            parsed: matches.iter().map(|m| m.goals.len()).sum(),
            skipped: report.skipped.len(),
            upsert,
        })
    }

    /// Re-check stored goals without a mirrors link. Waits for an in-flight
    /// cycle so the two never share the throttle at once.
    pub async fn run_backfill(&self) -> usize {
        let Some(fetcher) = &self.fetcher else {
            return 0;
        };
        if self.backfill_limit == 0 {
            return 0;
        }

        let _guard = self.cycle_lock.lock().await;
        backfill_aux_links(self.store.as_ref(), fetcher, self.backfill_limit).await
    }

    /// Delete games past the retention window. No-op when retention is off.
    pub async fn run_retention(&self) -> Result<u64, IngestionError> {
        let Some(max_age) = self.retention else {
            return Ok(0);
        };
        Ok(sweep_old_matches(self.store.as_ref(), max_age, Utc::now()).await?)
    }

    /// Run all timers until `shutdown` resolves. An in-flight cycle is
    /// allowed to finish first.
    pub async fn run<F>(self: Arc<Self>, schedule: Schedule, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut poll = tokio::time::interval(schedule.poll);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Backfill and sweep first fire one full period after start
        let mut backfill = delayed_interval(schedule.backfill);
        let mut sweep = delayed_interval(schedule.sweep);

        tokio::pin!(shutdown);

        info!(
            poll_secs = schedule.poll.as_secs(),
            backfill_secs = schedule.backfill.as_secs(),
            sweep_secs = schedule.sweep.as_secs(),
            "Ingestion loop started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping ingestion loop");
                    break;
                }
                _ = poll.tick() => {
                    let start = Instant::now();
                    match self.run_cycle().await {
                        Ok(summary) => debug!(
                            parsed = summary.parsed,
                            skipped = summary.skipped,
                            inserted = summary.upsert.goals_inserted,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Cycle finished"
                        ),
                        Err(IngestionError::CycleInProgress) => {
                            warn!("Previous cycle still running, tick skipped")
                        }
                        Err(e) => error!(error = %e, "Ingestion cycle failed"),
                    }
                }
                _ = backfill.tick() => {
                    let updated = self.run_backfill().await;
                    debug!(updated, "Backfill pass finished");
                }
                _ = sweep.tick() => {
                    if let Err(e) = self.run_retention().await {
                        error!(error = %e, "Retention sweep failed");
                    }
                }
            }
        }
    }
}

fn delayed_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
