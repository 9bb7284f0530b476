//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use rakugaki_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    infrastructure::dto::http::{HealthDto, RoomListDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Get the status of every shared room
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListDto> {
    let rooms = state.list_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(RoomListDto {
        rooms: rooms.into_iter().map(Into::into).collect(),
        generated_at: timestamp_to_jst_rfc3339(state.clock.now_millis()),
    })
}
