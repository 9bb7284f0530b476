//! UseCase: 描き終わりの通知

use std::sync::Arc;

use crate::domain::{MessagePusher, Notification, ParticipantId, RoomName, RoomRepository};

use super::error::RoomActionError;

/// 描き終わり通知のユースケース
pub struct FinishDrawingUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl FinishDrawingUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 相手に `peer_finished` を送る
    pub async fn execute(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
    ) -> Result<(), RoomActionError> {
        let peers = self.repository.record_finish(room, participant).await?;
        let notification = Notification::PeerFinished {
            room: room.clone(),
            participant: participant.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(peers, &notification).await {
            tracing::warn!("Failed to broadcast peer_finished: {}", e);
        }
        Ok(())
    }
}
