//! Blooters Common Library
//!
//! Shared code for the Blooters services including:
//! - Goal and game domain types
//! - Database models, repository and in-memory store
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod goals;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{MatchStore, MemoryStore, Repository};
pub use goals::{GoalRecord, MatchRecord, TeamPair};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Flair label r/soccer puts on goal clips
pub const DEFAULT_MEDIA_FLAIR: &str = "Media";

/// Account that posts the mirrors comment under each clip
pub const DEFAULT_MIRROR_BOT: &str = "AutoModerator";
