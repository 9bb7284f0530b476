//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged by `"type"` in snake_case.

use serde::{Deserialize, Serialize};

use crate::domain::RoomKind;

/// Messages sent by the browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// `room` may be omitted: shared joins pick the first open room, private
    /// joins always use the caller's own room.
    Join {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        kind: RoomKind,
        #[serde(default)]
        name: String,
        #[serde(default)]
        icon: String,
    },
    UpdateIdentity {
        room: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        icon: String,
    },
    ProposeTopic {
        room: String,
        #[serde(default)]
        topic: Option<String>,
    },
    SubmitPrediction {
        room: String,
        results: Vec<RankedLabelDto>,
        target_topic: String,
        #[serde(default)]
        display_name: String,
    },
    RequestRematch {
        room: String,
    },
    FinishDrawing {
        room: String,
    },
    Draw {
        room: String,
        data: serde_json::Value,
    },
    Leave {
        room: String,
    },
    LeaveConfirmed,
    ListRooms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabelDto {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupantDto {
    pub participant_id: String,
    pub name: String,
    pub icon: String,
    pub leaving: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStatusDto {
    pub room: String,
    pub occupants: usize,
    pub departing: bool,
    pub in_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedEntryDto {
    pub participant_id: String,
    pub display_name: String,
    pub score: f64,
    pub top_labels: Vec<RankedLabelDto>,
}

/// Messages pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        participant_id: String,
    },
    RoomJoined {
        room: String,
        kind: RoomKind,
        occupants: Vec<OccupantDto>,
    },
    JoinRoomFailed {
        room: String,
        reason: String,
    },
    RoomStatus {
        rooms: Vec<RoomStatusDto>,
        timestamp: i64,
    },
    RoomReady {
        room: String,
        host: String,
        peer: OccupantDto,
        started_at: i64,
    },
    TopicChosen {
        room: String,
        topic: String,
        chosen_by: String,
    },
    PeerFinished {
        room: String,
        participant_id: String,
    },
    PeerDraw {
        room: String,
        participant_id: String,
        data: serde_json::Value,
    },
    /// `outcome` is `winner`, `draw` or `solo`; `winner` is set only for `winner`.
    JudgmentResult {
        room: String,
        topic: String,
        outcome: String,
        winner: Option<String>,
        entries: Vec<JudgedEntryDto>,
    },
    PeerDeparting {
        room: String,
        participant_id: String,
    },
    PeerDisconnected {
        room: String,
        participant_id: String,
    },
    RoomClosed {
        room: String,
    },
    RematchRequested {
        room: String,
        participant_id: String,
    },
    LeaveAcknowledged {
        room: String,
        grace_secs: u64,
    },
}
