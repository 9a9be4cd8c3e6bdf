//! Goal entity

use crate::goals::GoalRecord;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub game_id: i32,

    /// Raw post title
    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub goalscorer: String,

    #[sea_orm(column_type = "Text")]
    pub minute: String,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_type = "Text")]
    pub reddit_url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub mirrors: Option<String>,

    pub away: bool,

    pub home_score: i32,

    pub away_score: i32,

    /// Unique per game; see `GoalRecord::dedup_key`
    #[sea_orm(column_type = "Text", unique)]
    pub dedup_key: String,
}

impl Model {
    /// Rebuild the API record; team names live on the parent game row.
    pub fn into_record(self, home_team: &str, away_team: &str) -> GoalRecord {
        GoalRecord {
            id: self.id,
            game_id: self.game_id,
            description: self.description,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            goalscorer: self.goalscorer,
            minute: self.minute,
            url: self.url,
            reddit_url: self.reddit_url,
            mirrors: self.mirrors,
            home_score: self.home_score,
            away_score: self.away_score,
            away: self.away,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::game::Entity",
        from = "Column::GameId",
        to = "super::game::Column::Id",
        on_delete = "Cascade"
    )]
    Game,
}

impl Related<super::game::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
