//! UseCase: 再戦の希望
//!
//! 相手に `rematch_requested` を送る。両者がそろうとラウンドを閉じ、
//! 再びマッチングを試みる（新しい `room_ready` が両者に届く）。

use std::sync::Arc;

use crate::domain::{MessagePusher, Notification, ParticipantId, RoomName, RoomRepository};

use super::{error::RoomActionError, matchmaking::MatchmakingCoordinator};

/// 再戦希望のユースケース
pub struct RequestRematchUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    matchmaking: Arc<MatchmakingCoordinator>,
}

impl RequestRematchUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        matchmaking: Arc<MatchmakingCoordinator>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            matchmaking,
        }
    }

    /// # Returns
    ///
    /// * `Ok(true)` - 両者の希望がそろい、再マッチングを行った
    /// * `Ok(false)` - 相手の希望待ち
    pub async fn execute(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
    ) -> Result<bool, RoomActionError> {
        let outcome = self
            .repository
            .record_rematch_request(room, participant)
            .await?;

        let notification = Notification::RematchRequested {
            room: room.clone(),
            participant: participant.clone(),
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(outcome.peers, &notification)
            .await
        {
            tracing::warn!("Failed to broadcast rematch_requested: {}", e);
        }

        if outcome.agreed {
            tracing::info!("Rematch agreed in room '{}'", room);
            self.matchmaking.try_advance(room).await;
        }
        Ok(outcome.agreed)
    }
}
