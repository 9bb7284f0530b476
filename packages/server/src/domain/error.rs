//! Domain error types.

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("participant id must not be empty")]
    EmptyParticipantId,

    #[error("participant id must be at most {0} bytes")]
    ParticipantIdTooLong(usize),

    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("room name must be at most {0} bytes")]
    RoomNameTooLong(usize),

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("topic must be at most {0} bytes")]
    TopicTooLong(usize),

    #[error("topic catalog must contain at least one topic")]
    EmptyTopicCatalog,
}

/// 入室拒否の理由
///
/// 要求した本人にだけ通知され、ルームの状態は変化しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinRejection {
    #[error("room is full")]
    RoomFull,

    #[error("a game is in progress in this room")]
    GameInProgress,

    #[error("an occupant of this room is leaving")]
    LeavingInProgress,

    #[error("participant is already in this room")]
    AlreadyJoined,

    #[error("no such room")]
    UnknownRoom,

    #[error("private room belongs to another connection")]
    PrivateRoomDenied,

    #[error("private room is already occupied")]
    PrivateRoomOccupied,
}

impl JoinRejection {
    /// Reason code sent back to the client.
    pub fn reason(&self) -> &'static str {
        match self {
            JoinRejection::RoomFull => "room_full",
            JoinRejection::GameInProgress => "game_in_progress",
            JoinRejection::LeavingInProgress => "leaving_in_progress",
            JoinRejection::AlreadyJoined => "already_joined",
            JoinRejection::UnknownRoom => "unknown_room",
            JoinRejection::PrivateRoomDenied => "private_room_denied",
            JoinRejection::PrivateRoomOccupied => "private_room_occupied",
        }
    }
}

/// Repository 操作のエラー
///
/// いずれも「もう有効でないルーム/参加者の組み合わせ」を表し、
/// UseCase 層では古い要求として静かに破棄される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("participant '{participant}' is not in room '{room}'")]
    NotAnOccupant { room: String, participant: String },

    #[error("room '{0}' has no open round")]
    RoundNotOpen(String),

    #[error("participant '{0}' is already leaving")]
    AlreadyLeaving(String),

    #[error("operation not supported for room '{0}'")]
    UnsupportedRoomKind(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    EncodeFailed(String),
}
