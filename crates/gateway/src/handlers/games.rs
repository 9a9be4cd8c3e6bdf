//! Games read API

use crate::AppState;
use axum::{extract::State, Json};
use blooters_common::errors::Result;
use blooters_common::goals::GamesResponse;
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
pub struct PingResponse {
    pub message: String,
    pub status: u16,
}

/// All stored games with their goals, ordered by id
pub async fn list_games(State(state): State<AppState>) -> Result<Json<GamesResponse>> {
    let games = state.store.list_matches().await?;
    debug!(games = games.len(), "Games loaded");

    Ok(Json(GamesResponse { games, status: 200 }))
}

/// Keep-alive endpoint
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
        status: 200,
    })
}
