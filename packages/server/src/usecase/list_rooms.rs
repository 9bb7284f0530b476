//! UseCase: ルーム状態の取得と配信
//!
//! 共有ルームの人数・退出中フラグ・対戦中フラグを返す。参加者の ID や名前は含めない。
//! 入退室や退出状態の変化のたびに、接続中の全員へ `room_status` を配信する。

use std::sync::Arc;

use rakugaki_shared::time::Clock;

use crate::domain::{
    MessagePusher, Notification, ParticipantId, RoomRepository, RoomStatus, Timestamp,
};

/// ルーム状態取得のユースケース
pub struct ListRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ListRoomsUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// 共有ルームの状態一覧（設定順）
    pub async fn execute(&self) -> Vec<RoomStatus> {
        self.repository.room_status().await
    }

    /// 要求者にだけ `room_status` を送る
    pub async fn send_to(&self, participant: &ParticipantId) {
        let notification =
            room_status_notification(self.repository.as_ref(), self.clock.as_ref()).await;
        if let Err(e) = self
            .message_pusher
            .push_to(participant, &notification)
            .await
        {
            tracing::warn!("Failed to push room status to '{}': {}", participant, e);
        }
    }
}

pub(crate) async fn room_status_notification(
    repository: &dyn RoomRepository,
    clock: &dyn Clock,
) -> Notification {
    Notification::RoomStatus {
        rooms: repository.room_status().await,
        timestamp: Timestamp::new(clock.now_millis()),
    }
}

/// 接続中の全員に `room_status` を配信する
pub(crate) async fn broadcast_room_status(
    repository: &dyn RoomRepository,
    message_pusher: &dyn MessagePusher,
    clock: &dyn Clock,
) {
    let notification = room_status_notification(repository, clock).await;
    if let Err(e) = message_pusher.broadcast_all(&notification).await {
        tracing::warn!("Failed to broadcast room status: {}", e);
    }
}
