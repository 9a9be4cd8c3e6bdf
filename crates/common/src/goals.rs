//! Goal and game records shared by ingestion and the read API
//!
//! Field names follow the JSON contract the front-end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A single goal as parsed from a post title.
///
/// `id` and `game_id` stay zero until the goal has been persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub game_id: i32,
    /// Raw post title
    pub description: String,
    pub home_team: String,
    pub away_team: String,
    pub goalscorer: String,
    /// Minute as written, e.g. "11" or "90+7"
    pub minute: String,
    /// Clip URL the post links to
    pub url: String,
    /// Absolute permalink of the post's comment thread
    #[serde(default)]
    pub reddit_url: String,
    /// Mirrors / alternative angles comment, when found
    #[serde(default)]
    pub mirrors: Option<String>,
    pub home_score: i32,
    pub away_score: i32,
    /// `away_score > home_score` at parse time. This tracks the leading
    /// side, which is not always the side that scored.
    pub away: bool,
}

impl GoalRecord {
    pub fn team_pair(&self) -> TeamPair {
        TeamPair::new(&self.home_team, &self.away_team)
    }

    /// Natural key of a goal row within its game.
    ///
    /// Two polls over the same post produce the same key, so the store can
    /// reject the second insert.
    pub fn dedup_key(&self, game_id: i32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(game_id.to_be_bytes());
        for part in [&self.goalscorer, &self.minute, &self.description] {
            hasher.update([0x1f]);
            hasher.update(part.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Ordered (home, away) pair identifying a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamPair {
    pub home: String,
    pub away: String,
}

impl TeamPair {
    pub fn new(home: &str, away: &str) -> Self {
        Self {
            home: home.trim().to_string(),
            away: away.trim().to_string(),
        }
    }
}

impl fmt::Display for TeamPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.home, self.away)
    }
}

/// A game with its goals in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub id: i32,
    pub home_team: String,
    pub away_team: String,
    /// Score snapshot taken from the first goal seen for this game
    pub home_score: i32,
    pub away_score: i32,
    pub goals: Vec<GoalRecord>,
    /// Set once, when the game is first stored
    pub timestamp: DateTime<Utc>,
}

impl MatchRecord {
    /// Start a game from its first goal.
    pub fn from_first_goal(goal: GoalRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            home_team: goal.home_team.clone(),
            away_team: goal.away_team.clone(),
            home_score: goal.home_score,
            away_score: goal.away_score,
            goals: vec![goal],
            timestamp,
        }
    }

    pub fn team_pair(&self) -> TeamPair {
        TeamPair::new(&self.home_team, &self.away_team)
    }
}

/// Body of `GET /api/games`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesResponse {
    pub games: Vec<MatchRecord>,
    pub status: u16,
}
