//! In-process store
//!
//! Same contract as the Postgres repository, including the goal natural
//! key. Used by tests and dry runs.

use crate::db::MatchStore;
use crate::errors::{AppError, Result};
use crate::goals::{GoalRecord, MatchRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    games: Vec<MatchRecord>,
    dedup_keys: HashSet<String>,
    next_game_id: i32,
    next_goal_id: i32,
}

/// Store that keeps games and goals in memory
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games
    pub async fn match_count(&self) -> usize {
        self.state.read().await.games.len()
    }

    /// Number of stored goals across all games
    pub async fn goal_count(&self) -> usize {
        self.state.read().await.games.iter().map(|g| g.goals.len()).sum()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn find_match_by_teams(&self, home: &str, away: &str) -> Result<Option<i32>> {
        let state = self.state.read().await;
        Ok(state
            .games
            .iter()
            .find(|g| g.home_team == home && g.away_team == away)
            .map(|g| g.id))
    }

    async fn insert_match(&self, record: &MatchRecord) -> Result<i32> {
        let mut state = self.state.write().await;
        state.next_game_id += 1;
        let id = state.next_game_id;

        state.games.push(MatchRecord {
            id,
            goals: Vec::new(),
            ..record.clone()
        });
        Ok(id)
    }

    async fn insert_goal(&self, game_id: i32, goal: &GoalRecord) -> Result<i32> {
        let mut state = self.state.write().await;
        let dedup_key = goal.dedup_key(game_id);

        if state.dedup_keys.contains(&dedup_key) {
            return Err(AppError::DuplicateGoal { game_id, dedup_key });
        }

        let id = state.next_goal_id + 1;
        let game = state
            .games
            .iter_mut()
            .find(|g| g.id == game_id)
            .ok_or(AppError::GameNotFound { id: game_id })?;

        game.goals.push(GoalRecord {
            id,
            game_id,
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            ..goal.clone()
        });

        state.next_goal_id = id;
        state.dedup_keys.insert(dedup_key);
        Ok(id)
    }

    async fn list_matches(&self) -> Result<Vec<MatchRecord>> {
        Ok(self.state.read().await.games.clone())
    }

    async fn goals_missing_aux_link(&self, limit: u64) -> Result<Vec<GoalRecord>> {
        let state = self.state.read().await;
        let mut goals: Vec<GoalRecord> = state
            .games
            .iter()
            .flat_map(|g| g.goals.iter())
            .filter(|goal| goal.mirrors.is_none() && !goal.reddit_url.is_empty())
            .cloned()
            .collect();

        goals.sort_by(|a, b| b.id.cmp(&a.id));
        goals.truncate(limit as usize);
        Ok(goals)
    }

    async fn set_goal_aux_link(&self, goal_id: i32, url: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let goal = state
            .games
            .iter_mut()
            .flat_map(|g| g.goals.iter_mut())
            .find(|goal| goal.id == goal_id)
            .ok_or(AppError::GoalNotFound { id: goal_id })?;

        goal.mirrors = Some(url.to_string());
        Ok(())
    }

    async fn delete_matches_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let MemoryState { games, dedup_keys, .. } = &mut *state;

        let before = games.len();
        games.retain(|game| {
            if game.timestamp >= cutoff {
                return true;
            }
            for goal in &game.goals {
                dedup_keys.remove(&goal.dedup_key(game.id));
            }
            false
        });

        Ok((before - games.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn goal(title: &str, scorer: &str) -> GoalRecord {
        GoalRecord {
            description: title.into(),
            home_team: "Arsenal".into(),
            away_team: "Leeds United".into(),
            goalscorer: scorer.into(),
            minute: "78".into(),
            url: "https://streamable.com/abc".into(),
            reddit_url: "https://www.reddit.com/r/soccer/comments/abc/".into(),
            home_score: 1,
            ..Default::default()
        }
    }

    fn game(timestamp: DateTime<Utc>) -> MatchRecord {
        MatchRecord::from_first_goal(goal("Arsenal [1]-0 Leeds United - Thierry Henry 78'", "Thierry Henry"), timestamp)
    }

    #[tokio::test]
    async fn test_find_after_insert() {
        let store = MemoryStore::new();
        let id = store.insert_match(&game(Utc::now())).await.unwrap();

        assert_eq!(store.find_match_by_teams("Arsenal", "Leeds United").await.unwrap(), Some(id));
        assert_eq!(store.find_match_by_teams("Leeds United", "Arsenal").await.unwrap(), None);
        assert_eq!(store.find_match_by_teams("arsenal", "Leeds United").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_goal_rejected() {
        let store = MemoryStore::new();
        let id = store.insert_match(&game(Utc::now())).await.unwrap();
        let g = goal("Arsenal [1]-0 Leeds United - Thierry Henry 78'", "Thierry Henry");

        store.insert_goal(id, &g).await.unwrap();
        let err = store.insert_goal(id, &g).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.goal_count().await, 1);
    }

    #[tokio::test]
    async fn test_goal_for_unknown_game() {
        let store = MemoryStore::new();
        let err = store.insert_goal(42, &goal("t", "s")).await.unwrap_err();
        assert!(matches!(err, AppError::GameNotFound { id: 42 }));
    }

    #[tokio::test]
    async fn test_missing_aux_links_newest_first() {
        let store = MemoryStore::new();
        let id = store.insert_match(&game(Utc::now())).await.unwrap();
        let first = store.insert_goal(id, &goal("one", "A")).await.unwrap();
        let second = store.insert_goal(id, &goal("two", "B")).await.unwrap();
        store.set_goal_aux_link(first, "https://www.reddit.com/m").await.unwrap();

        let missing = store.goals_missing_aux_link(10).await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, second);
        assert_eq!(missing[0].home_team, "Arsenal");
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let old = store.insert_match(&game(now - Duration::hours(30))).await.unwrap();
        store.insert_goal(old, &goal("old", "A")).await.unwrap();

        let mut fresh = game(now);
        fresh.away_team = "Chelsea".into();
        store.insert_match(&fresh).await.unwrap();

        let deleted = store.delete_matches_older_than(now - Duration::hours(24)).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.match_count().await, 1);
        assert_eq!(store.goal_count().await, 0);
    }
}
