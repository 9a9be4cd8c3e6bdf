//! Reddit feed and thread client
//!
//! Listings are decoded once into typed structs. The reply tree is
//! recursive: a comment's `replies` is either an empty string or another
//! listing.

use crate::errors::IngestionError;
use async_trait::async_trait;
use blooters_common::config::RedditConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Kind marker of a link post
pub const LINK_KIND: &str = "t3";

/// Kind marker of a comment
pub const COMMENT_KIND: &str = "t1";

/// Generic `{"kind": "Listing", "data": {"children": [...]}}` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<Thing<T>>,
}

/// One child of a listing
#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

/// Fields of a post used by the pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Relative thread path, e.g. `/r/soccer/comments/abc123/slug/`
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub link_flair_text: Option<String>,
}

/// A feed entry
pub type FeedItem = Thing<PostData>;

/// Comment fields; "more" stubs leave all of them empty
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub replies: Option<Replies>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Tree(Box<Listing<CommentData>>),
    Empty(String),
}

/// Comment listing of a thread
pub type ReplyTree = Listing<CommentData>;

impl ReplyTree {
    /// Top-level comments only, skipping "more" stubs
    pub fn top_level(&self) -> impl Iterator<Item = &CommentData> {
        self.data
            .children
            .iter()
            .filter(|child| child.kind == COMMENT_KIND)
            .map(|child| &child.data)
    }
}

/// Read side of the post source
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Newest posts, newest first
    async fn list_recent_items(&self, limit: u32) -> Result<Vec<FeedItem>, IngestionError>;

    /// Comment tree of a post, addressed by its permalink
    async fn fetch_thread(&self, thread_ref: &str) -> Result<ReplyTree, IngestionError>;
}

/// Resolve a permalink against the site root; absolute URLs pass through
pub fn absolute_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// HTTP client for reddit's public JSON endpoints
pub struct RedditClient {
    client: reqwest::Client,
    feed_url: String,
    base_url: String,
}

impl RedditClient {
    pub fn new(config: &RedditConfig) -> Result<Self, IngestionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            feed_url: config.feed_url.clone(),
            base_url: config.base_url.clone(),
        })
    }

    async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T, IngestionError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestionError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| IngestionError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl FeedSource for RedditClient {
    #[instrument(skip(self))]
    async fn list_recent_items(&self, limit: u32) -> Result<Vec<FeedItem>, IngestionError> {
        let listing: Listing<PostData> = self
            .get_json(&self.feed_url, &[("limit", limit.to_string()), ("raw_json", "1".to_string())])
            .await?;

        debug!(items = listing.data.children.len(), "Feed fetched");
        Ok(listing.data.children)
    }

    #[instrument(skip(self))]
    async fn fetch_thread(&self, thread_ref: &str) -> Result<ReplyTree, IngestionError> {
        let url = format!("{}.json", absolute_url(&self.base_url, thread_ref.trim_end_matches('/')));

        // [post listing, comment listing]
        let (_post, comments): (Listing<PostData>, ReplyTree) = self
            .get_json(&url, &[("raw_json", "1".to_string())])
            .await?;

        Ok(comments)
    }
}
