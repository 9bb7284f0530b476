//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{JoinRejection, RepositoryError, RoomName};

/// 入室のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    /// 要求者には `join_room_failed` が送られている
    #[error("join to room '{room}' rejected: {reason}")]
    Rejected {
        room: RoomName,
        reason: JoinRejection,
    },

    #[error("no shared room is configured")]
    NoSharedRoom,
}

/// ルーム内操作のエラー
///
/// 既に無効になったルーム/参加者の組み合わせからの要求。通知はせず破棄する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomActionError {
    #[error("stale request: {0}")]
    StaleParticipant(#[from] RepositoryError),
}
