//! Candidate post selection

use crate::reddit::{FeedItem, LINK_KIND};

/// A feed post that looks like a goal clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    /// Media link the post points at
    pub url: String,
    /// Relative permalink of the post's comment thread
    pub thread_ref: String,
}

impl From<FeedItem> for Candidate {
    fn from(item: FeedItem) -> Self {
        Self {
            title: item.data.title,
            url: item.data.url,
            thread_ref: item.data.permalink,
        }
    }
}

/// Keeps link posts carrying the media flair
#[derive(Debug, Clone)]
pub struct PostFilter {
    media_flair: String,
}

impl PostFilter {
    pub fn new(media_flair: impl Into<String>) -> Self {
        Self {
            media_flair: media_flair.into(),
        }
    }

    /// Exact, case-sensitive flair match on link posts only
    pub fn is_candidate(&self, item: &FeedItem) -> bool {
        item.kind == LINK_KIND && item.data.link_flair_text.as_deref() == Some(self.media_flair.as_str())
    }

    /// Candidates in feed order
    pub fn select(&self, items: Vec<FeedItem>) -> Vec<Candidate> {
        items
            .into_iter()
            .filter(|item| self.is_candidate(item))
            .map(Candidate::from)
            .collect()
    }
}
