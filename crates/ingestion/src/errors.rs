//! Ingestion service error types

use blooters_common::errors::AppError;
use thiserror::Error;

/// Why a post title was not turned into a goal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("not a goal title: {title}")]
    NotAGoalTitle { title: String },

    #[error("score out of range in: {title}")]
    ScoreOutOfRange { title: String },
}

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Thread fetch timed out after {timeout_ms}ms: {thread}")]
    Timeout { thread: String, timeout_ms: u64 },

    #[error("No mirrors comment in thread {thread}")]
    AuxLinkNotFound { thread: String },

    #[error("Previous ingestion cycle still running")]
    CycleInProgress,

    #[error("Store error: {0}")]
    Store(#[from] AppError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IngestionError {
    /// Failures that only cost the current item its enrichment
    pub fn is_enrichment_miss(&self) -> bool {
        !matches!(
            self,
            IngestionError::Store(_) | IngestionError::ConfigError(_) | IngestionError::CycleInProgress
        )
    }
}
