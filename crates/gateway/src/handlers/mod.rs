//! API handlers module

pub mod games;
pub mod health;
