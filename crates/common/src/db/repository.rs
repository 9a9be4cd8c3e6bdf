//! Postgres-backed store
//!
//! Implements `MatchStore` on top of SeaORM entities.

use crate::db::models::*;
use crate::db::{DbPool, MatchStore};
use crate::errors::{AppError, Result};
use crate::goals::{GoalRecord, MatchRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use std::collections::HashMap;
use tracing::debug;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        &self.pool.conn
    }
}

#[async_trait]
impl MatchStore for Repository {
    // ========================================================================
    // Game Operations
    // ========================================================================

    async fn find_match_by_teams(&self, home: &str, away: &str) -> Result<Option<i32>> {
        let game = GameEntity::find()
            .filter(GameColumn::HomeTeam.eq(home))
            .filter(GameColumn::AwayTeam.eq(away))
            .order_by_asc(GameColumn::Id)
            .one(self.conn())
            .await?;

        Ok(game.map(|g| g.id))
    }

    async fn insert_match(&self, record: &MatchRecord) -> Result<i32> {
        let game = GameActiveModel {
            id: NotSet,
            home_team: Set(record.home_team.clone()),
            away_team: Set(record.away_team.clone()),
            home_score: Set(record.home_score),
            away_score: Set(record.away_score),
            timestamp: Set(record.timestamp.into()),
        };

        let game = game.insert(self.conn()).await?;
        Ok(game.id)
    }

    async fn list_matches(&self) -> Result<Vec<MatchRecord>> {
        let games = GameEntity::find()
            .order_by_asc(GameColumn::Id)
            .all(self.conn())
            .await?;

        let mut goals_by_game: HashMap<i32, Vec<Goal>> = HashMap::new();
        for goal in GoalEntity::find()
            .order_by_asc(GoalColumn::Id)
            .all(self.conn())
            .await?
        {
            goals_by_game.entry(goal.game_id).or_default().push(goal);
        }

        let records = games
            .into_iter()
            .map(|game| {
                let goals = goals_by_game
                    .remove(&game.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|goal| goal.into_record(&game.home_team, &game.away_team))
                    .collect();

                MatchRecord {
                    id: game.id,
                    home_team: game.home_team,
                    away_team: game.away_team,
                    home_score: game.home_score,
                    away_score: game.away_score,
                    goals,
                    timestamp: game.timestamp.with_timezone(&Utc),
                }
            })
            .collect();

        Ok(records)
    }

    async fn delete_matches_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        // Goals go with their game through ON DELETE CASCADE
        let result = GameEntity::delete_many()
            .filter(GameColumn::Timestamp.lt(cutoff))
            .exec(self.conn())
            .await?;

        Ok(result.rows_affected)
    }

    // ========================================================================
    // Goal Operations
    // ========================================================================

    async fn insert_goal(&self, game_id: i32, goal: &GoalRecord) -> Result<i32> {
        let dedup_key = goal.dedup_key(game_id);

        let row = GoalActiveModel {
            id: NotSet,
            game_id: Set(game_id),
            description: Set(goal.description.clone()),
            goalscorer: Set(goal.goalscorer.clone()),
            minute: Set(goal.minute.clone()),
            url: Set(goal.url.clone()),
            reddit_url: Set(goal.reddit_url.clone()),
            mirrors: Set(goal.mirrors.clone()),
            away: Set(goal.away),
            home_score: Set(goal.home_score),
            away_score: Set(goal.away_score),
            dedup_key: Set(dedup_key.clone()),
        };

        match row.insert(self.conn()).await {
            Ok(model) => Ok(model.id),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail)) => {
                    debug!(game_id, detail = %detail, "Goal row already present");
                    Err(AppError::DuplicateGoal { game_id, dedup_key })
                }
                _ => Err(err.into()),
            },
        }
    }

    async fn goals_missing_aux_link(&self, limit: u64) -> Result<Vec<GoalRecord>> {
        let rows = GoalEntity::find()
            .filter(GoalColumn::Mirrors.is_null())
            .filter(GoalColumn::RedditUrl.ne(""))
            .order_by_desc(GoalColumn::Id)
            .limit(limit)
            .find_also_related(GameEntity)
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(goal, game)| {
                let game = game?;
                Some(goal.into_record(&game.home_team, &game.away_team))
            })
            .collect())
    }

    async fn set_goal_aux_link(&self, goal_id: i32, url: &str) -> Result<()> {
        let result = GoalEntity::update_many()
            .col_expr(GoalColumn::Mirrors, Expr::value(url))
            .filter(GoalColumn::Id.eq(goal_id))
            .exec(self.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::GoalNotFound { id: goal_id });
        }
        Ok(())
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}
