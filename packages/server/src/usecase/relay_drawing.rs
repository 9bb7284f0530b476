//! UseCase: 描画データの中継
//!
//! ストロークのデータは解釈せず、そのまま同じルームの相手へ転送する。

use std::sync::Arc;

use crate::domain::{MessagePusher, Notification, ParticipantId, RoomName, RoomRepository};

use super::error::RoomActionError;

/// 描画中継のユースケース
pub struct RelayDrawingUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayDrawingUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
        data: serde_json::Value,
    ) -> Result<(), RoomActionError> {
        let peers = self.repository.peers_of(room, participant).await?;
        if peers.is_empty() {
            return Ok(());
        }
        let notification = Notification::PeerDraw {
            room: room.clone(),
            participant: participant.clone(),
            data,
        };
        if let Err(e) = self.message_pusher.broadcast(peers, &notification).await {
            tracing::warn!("Failed to relay drawing: {}", e);
        }
        Ok(())
    }
}
