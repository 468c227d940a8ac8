//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::domain::RoomName;
use crate::ui::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
pub struct OnlineRosterDto {
    pub room: String,
    pub online: Vec<String>,
}

/// Online roster for a room.
pub async fn get_online_users(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<OnlineRosterDto>, StatusCode> {
    let room = RoomName::new(room).map_err(|_| StatusCode::BAD_REQUEST)?;

    let online = state.list_online_usecase.execute(&room).await;
    Ok(Json(OnlineRosterDto {
        room: room.as_str().to_string(),
        online: online.into_iter().map(|u| u.as_str().to_string()).collect(),
    }))
}
