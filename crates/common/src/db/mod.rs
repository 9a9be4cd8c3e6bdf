//! Database layer for Blooters
//!
//! Provides:
//! - SeaORM entity models
//! - The `MatchStore` seam used by ingestion and the read API
//! - Postgres repository and in-memory store implementations
//! - Connection pool management

mod memory;
pub mod models;
mod repository;

pub use memory::MemoryStore;
pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use crate::goals::{GoalRecord, MatchRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Schema for the games and goals tables
pub const SCHEMA_SQL: &str = include_str!("../../../../migrations/0001_games_and_goals.sql");

/// Persistence operations the ingestion pipeline and read API rely on.
///
/// Handles are passed in explicitly so tests can run against isolated
/// stores in parallel.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Id of the game stored for this exact (home, away) pair
    async fn find_match_by_teams(&self, home: &str, away: &str) -> Result<Option<i32>>;

    /// Insert a game row (goals are not written) and return its id
    async fn insert_match(&self, record: &MatchRecord) -> Result<i32>;

    /// Insert one goal under `game_id`.
    ///
    /// Fails with `AppError::DuplicateGoal` when the goal's natural key is
    /// already stored.
    async fn insert_goal(&self, game_id: i32, goal: &GoalRecord) -> Result<i32>;

    /// All games ordered by id, each with its goals ordered by id
    async fn list_matches(&self) -> Result<Vec<MatchRecord>>;

    /// Newest goals that have a thread link but no mirrors link yet
    async fn goals_missing_aux_link(&self, limit: u64) -> Result<Vec<GoalRecord>>;

    /// Attach a mirrors link to a stored goal
    async fn set_goal_aux_link(&self, goal_id: i32, url: &str) -> Result<()>;

    /// Delete games first stored before `cutoff`, with their goals
    async fn delete_matches_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    pub conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        let pool = Self { conn };
        pool.ping().await?;

        info!("Database connection established");
        Ok(pool)
    }

    /// Create the tables if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_unprepared(SCHEMA_SQL).await?;
        info!("Database schema ready");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }
}
