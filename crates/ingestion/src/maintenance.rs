//! Background upkeep: late mirrors links and retention

use crate::enrichment::AuxLinkFetcher;
use blooters_common::metrics::{record_aux_links, record_retention};
use blooters_common::{MatchStore, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

/// Retry the mirrors lookup for stored goals that still lack a link.
///
/// Returns the number of goals updated.
#[instrument(skip(store, fetcher))]
pub async fn backfill_aux_links(store: &dyn MatchStore, fetcher: &AuxLinkFetcher, limit: u64) -> usize {
    let pending = match store.goals_missing_aux_link(limit).await {
        Ok(goals) => goals,
        Err(e) => {
            warn!(error = %e, "Could not list goals without mirrors");
            record_aux_links(0, 0);
            return 0;
        }
    };

    if pending.is_empty() {
        return 0;
    }

    let thread_refs: Vec<String> = pending.iter().map(|g| g.reddit_url.clone()).collect();
    let links = fetcher.fetch_many(&thread_refs).await;

    let mut updated = 0;
    for (goal, link) in pending.iter().zip(links) {
        let Some(link) = link else { continue };
        match store.set_goal_aux_link(goal.id, &link).await {
            Ok(()) => updated += 1,
            Err(e) => warn!(goal_id = goal.id, error = %e, "Could not save mirrors link"),
        }
    }

    record_aux_links(pending.len(), updated);
    debug!(pending = pending.len(), updated, "Mirrors backfill done");
    updated
}

/// Delete games created before `now - max_age`; their goals go with them.
#[instrument(skip(store))]
pub async fn sweep_old_matches(store: &dyn MatchStore, max_age: Duration, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = now - max_age;

    match store.delete_matches_older_than(cutoff).await {
        Ok(removed) => {
            record_retention(true, removed);
            info!(removed, cutoff = %cutoff, "Old games removed");
            Ok(removed)
        }
        Err(e) => {
            record_retention(false, 0);
            warn!(error = %e, "Retention sweep failed");
            Err(e)
        }
    }
}
