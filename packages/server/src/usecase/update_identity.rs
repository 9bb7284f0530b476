//! UseCase: 名前・アイコンの更新
//!
//! 入室時に名前・アイコンが届かなかった場合の後追いメッセージ。
//! 更新後はマッチングを再度試みる。

use std::sync::Arc;

use crate::domain::{Identity, ParticipantId, RoomName, RoomRepository};

use super::{error::RoomActionError, matchmaking::MatchmakingCoordinator};

/// 名前・アイコン更新のユースケース
pub struct UpdateIdentityUseCase {
    repository: Arc<dyn RoomRepository>,
    matchmaking: Arc<MatchmakingCoordinator>,
}

impl UpdateIdentityUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        matchmaking: Arc<MatchmakingCoordinator>,
    ) -> Self {
        Self {
            repository,
            matchmaking,
        }
    }

    pub async fn execute(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
        identity: Identity,
    ) -> Result<(), RoomActionError> {
        self.repository
            .update_identity(room, participant, identity)
            .await?;
        tracing::debug!("Participant '{}' updated identity in '{}'", participant, room);

        let is_shared = self
            .repository
            .get_room(room)
            .await
            .is_some_and(|snapshot| !snapshot.kind().is_private());
        if is_shared {
            self.matchmaking.try_advance(room).await;
        }
        Ok(())
    }
}
