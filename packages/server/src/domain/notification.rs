//! Outbound events produced by the use cases.
//!
//! A `Notification` is protocol independent. The infrastructure layer turns it
//! into the wire DTO before handing it to a socket.

use super::{
    entity::{Occupant, RoomStatus},
    error::JoinRejection,
    judgment::JudgmentResult,
    value_object::{ParticipantId, RoomKind, RoomName, Timestamp, Topic},
};

/// 参加者へ送る通知
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// 接続直後に割り当てた ID を伝える
    Connected { participant: ParticipantId },
    RoomJoined {
        room: RoomName,
        kind: RoomKind,
        occupants: Vec<Occupant>,
    },
    JoinRoomFailed {
        room: RoomName,
        reason: JoinRejection,
    },
    RoomStatus {
        rooms: Vec<RoomStatus>,
        timestamp: Timestamp,
    },
    /// マッチング成立。`peer` は受信者から見た相手。
    RoomReady {
        room: RoomName,
        host: ParticipantId,
        peer: Occupant,
        started_at: Timestamp,
    },
    TopicChosen {
        room: RoomName,
        topic: Topic,
        chosen_by: ParticipantId,
    },
    PeerFinished {
        room: RoomName,
        participant: ParticipantId,
    },
    /// 描画データの中継（中身は解釈しない）
    PeerDraw {
        room: RoomName,
        participant: ParticipantId,
        data: serde_json::Value,
    },
    JudgmentResult(JudgmentResult),
    PeerDeparting {
        room: RoomName,
        participant: ParticipantId,
    },
    PeerDisconnected {
        room: RoomName,
        participant: ParticipantId,
    },
    RoomClosed { room: RoomName },
    RematchRequested {
        room: RoomName,
        participant: ParticipantId,
    },
    LeaveAcknowledged { room: RoomName, grace_secs: u64 },
}
