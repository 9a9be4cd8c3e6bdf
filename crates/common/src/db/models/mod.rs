//! SeaORM entity models
//!
//! Database entities for games and their goals

mod game;
mod goal;

pub use game::{
    Entity as GameEntity,
    Model as Game,
    ActiveModel as GameActiveModel,
    Column as GameColumn,
};

pub use goal::{
    Entity as GoalEntity,
    Model as Goal,
    ActiveModel as GoalActiveModel,
    Column as GoalColumn,
};
