//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::RoomStatusDto;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

/// `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListDto {
    pub rooms: Vec<RoomStatusDto>,
    /// Server time in JST, RFC 3339.
    pub generated_at: Option<String>,
}
