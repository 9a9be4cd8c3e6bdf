//! Ingestion pipeline
//!
//! One pass over the feed: filter, parse, then look up mirrors links.

use crate::enrichment::{AuxLinkFetcher, Throttle};
use crate::errors::{IngestionError, ParseError};
use crate::filter::{Candidate, PostFilter};
use crate::reddit::{absolute_url, FeedItem, FeedSource};
use crate::title::parse_goal_title;
use blooters_common::metrics::record_fetch;
use blooters_common::GoalRecord;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Outcome of one pipeline pass
#[derive(Debug, Default)]
pub struct IngestionReport {
    /// Parsed goals in feed order
    pub goals: Vec<GoalRecord>,
    /// Posts that passed the filter
    pub candidates: usize,
    pub skipped: Vec<(String, ParseError)>,
    /// Goals kept without a mirrors link
    pub enrichment_misses: usize,
}

pub struct IngestionPipeline {
    source: Arc<dyn FeedSource>,
    filter: PostFilter,
    fetcher: Option<Arc<AuxLinkFetcher>>,
    throttle: Throttle,
    feed_limit: u32,
    base_url: String,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn FeedSource>,
        filter: PostFilter,
        fetcher: Option<Arc<AuxLinkFetcher>>,
        throttle: Throttle,
        feed_limit: u32,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            filter,
            fetcher,
            throttle,
            feed_limit,
            base_url: base_url.into(),
        }
    }

    /// Fetch the feed and process it.
    ///
    /// A feed failure fails the pass; item failures never do.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<IngestionReport, IngestionError> {
        let start = Instant::now();
        self.throttle.until_ready().await;

        let items = match self.source.list_recent_items(self.feed_limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Feed fetch failed");
                record_fetch(false, 0, 0, 0.0);
                return Err(e);
            }
        };

        let report = self.process(items).await;
        record_fetch(
            true,
            report.goals.len(),
            report.skipped.len(),
            start.elapsed().as_secs_f64(),
        );

        info!(
            candidates = report.candidates,
            goals = report.goals.len(),
            skipped = report.skipped.len(),
            enrichment_misses = report.enrichment_misses,
            "Feed processed"
        );

        Ok(report)
    }

    /// Filter, parse and enrich already fetched items.
    pub async fn process(&self, items: Vec<FeedItem>) -> IngestionReport {
        let total = items.len();
        let candidates = self.filter.select(items);
        debug!(dropped = total - candidates.len(), "Non-media posts dropped");

        let mut report = IngestionReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        let mut thread_refs = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.parse_candidate(&candidate) {
                Ok(goal) => {
                    report.goals.push(goal);
                    thread_refs.push(candidate.thread_ref);
                }
                Err(e) => {
                    debug!(title = %candidate.title, error = %e, "Title skipped");
                    report.skipped.push((candidate.title, e));
                }
            }
        }

        let Some(fetcher) = &self.fetcher else {
            return report;
        };

        let links = fetcher.fetch_many(&thread_refs).await;
        for (goal, link) in report.goals.iter_mut().zip(links) {
            if link.is_none() {
                report.enrichment_misses += 1;
            }
            goal.mirrors = link;
        }

        report
    }

    fn parse_candidate(&self, candidate: &Candidate) -> Result<GoalRecord, ParseError> {
        let mut goal = parse_goal_title(&candidate.title, &candidate.url)?;
        if !candidate.thread_ref.is_empty() {
            goal.reddit_url = absolute_url(&self.base_url, &candidate.thread_ref);
        }
        Ok(goal)
    }
}
