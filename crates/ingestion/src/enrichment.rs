//! Mirrors link lookup
//!
//! Reddit's moderator bot posts a "Mirrors / Alternative Angles" comment
//! under every clip. The link to that comment is stored with the goal.
//! A lookup that fails for any reason leaves the goal without a link.

use crate::errors::IngestionError;
use crate::reddit::{absolute_url, FeedSource, ReplyTree};
use blooters_common::config::EnrichmentConfig;
use futures::stream::{self, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared throttle for every call made to the feed host
pub type Throttle = Arc<DefaultDirectRateLimiter>;

/// Build a throttle that spaces calls evenly, one at a time.
pub fn build_throttle(requests_per_second: u32) -> Result<Throttle, IngestionError> {
    if requests_per_second == 0 {
        return Err(IngestionError::ConfigError(
            "enrichment.requests_per_second must be positive".to_string(),
        ));
    }

    let period = Duration::from_secs(1) / requests_per_second;
    let quota = Quota::with_period(period).ok_or_else(|| {
        IngestionError::ConfigError(format!("invalid request period {:?}", period))
    })?;

    Ok(Arc::new(RateLimiter::direct(quota)))
}

/// Permalink of the first top-level comment by `author` whose body
/// mentions `marker`. Nested replies are not searched.
pub fn find_aux_link<'a>(tree: &'a ReplyTree, author: &str, marker: &str) -> Option<&'a str> {
    tree.top_level()
        .find(|comment| {
            comment.author.as_deref() == Some(author)
                && comment.body.as_deref().is_some_and(|body| body.contains(marker))
        })
        .and_then(|comment| comment.permalink.as_deref())
        .filter(|permalink| !permalink.is_empty())
}

pub struct AuxLinkFetcher {
    source: Arc<dyn FeedSource>,
    throttle: Throttle,
    bot_author: String,
    marker: String,
    base_url: String,
    timeout: Duration,
    concurrency: usize,
}

impl AuxLinkFetcher {
    pub fn new(
        source: Arc<dyn FeedSource>,
        throttle: Throttle,
        config: &EnrichmentConfig,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            throttle,
            bot_author: config.bot_author.clone(),
            marker: config.marker.clone(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(config.timeout_secs),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Absolute URL of the thread's mirrors comment.
    ///
    /// Every failure comes back as `AuxLinkNotFound`.
    pub async fn fetch_aux_link(&self, thread_ref: &str) -> Result<String, IngestionError> {
        match self.lookup(thread_ref).await {
            Ok(link) => Ok(link),
            Err(IngestionError::AuxLinkNotFound { thread }) => {
                debug!(thread = %thread, "No mirrors comment yet");
                Err(IngestionError::AuxLinkNotFound { thread })
            }
            Err(e) => {
                if e.is_enrichment_miss() {
                    debug!(thread = %thread_ref, error = %e, "Mirrors lookup failed");
                } else {
                    warn!(thread = %thread_ref, error = %e, "Mirrors lookup failed");
                }
                Err(IngestionError::AuxLinkNotFound {
                    thread: thread_ref.to_string(),
                })
            }
        }
    }

    async fn lookup(&self, thread_ref: &str) -> Result<String, IngestionError> {
        if thread_ref.trim().is_empty() {
            return Err(IngestionError::AuxLinkNotFound {
                thread: thread_ref.to_string(),
            });
        }

        self.throttle.until_ready().await;

        let tree = tokio::time::timeout(self.timeout, self.source.fetch_thread(thread_ref))
            .await
            .map_err(|_| IngestionError::Timeout {
                thread: thread_ref.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        find_aux_link(&tree, &self.bot_author, &self.marker)
            .map(|permalink| absolute_url(&self.base_url, permalink))
            .ok_or_else(|| IngestionError::AuxLinkNotFound {
                thread: thread_ref.to_string(),
            })
    }

    /// Look up several threads with bounded concurrency.
    ///
    /// Output is index-aligned with the input.
    pub async fn fetch_many(&self, thread_refs: &[String]) -> Vec<Option<String>> {
        // Owned items and a boxed stream keep the future Send for spawned callers
        stream::iter(thread_refs.to_vec())
            .map(|thread_ref| async move { self.fetch_aux_link(&thread_ref).await.ok() })
            .buffered(self.concurrency)
            .boxed()
            .collect()
            .await
    }
}
