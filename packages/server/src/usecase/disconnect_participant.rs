//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断した参加者のルームの後始末（共有ルームはクリア、専用ルームは削除）
//!
//! ### なぜこのテストが必要か
//! - 対戦中の切断で、残った相手に `peer_disconnected` がちょうど 1 回届くことを保証
//! - ルームが即座に空き状態へ戻ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：対戦中の切断
//! - エッジケース：退出中の切断、どのルームにもいない参加者の切断

use std::sync::Arc;

use rakugaki_shared::time::Clock;

use crate::domain::{Eviction, MessagePusher, Notification, ParticipantId, RoomRepository};

use super::list_rooms::broadcast_room_status;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
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

    /// 参加者切断を実行
    ///
    /// 参加中の全ルームから退室させ、接続を MessagePusher から登録解除する。
    ///
    /// # Returns
    ///
    /// 後始末したルームの一覧
    pub async fn execute(&self, participant: &ParticipantId) -> Vec<Eviction> {
        self.message_pusher.unregister_client(participant).await;

        let evictions = self.repository.evict_participant(participant).await;
        announce_evictions(self.message_pusher.as_ref(), participant, &evictions).await;
        if evictions.iter().any(|e| !e.kind.is_private()) {
            broadcast_room_status(
                self.repository.as_ref(),
                self.message_pusher.as_ref(),
                self.clock.as_ref(),
            )
            .await;
        }

        tracing::info!(
            "Participant '{}' disconnected ({} room(s) released)",
            participant,
            evictions.len()
        );
        evictions
    }
}

/// 追い出されたルームに残った相手へ通知する
///
/// 退出中だった場合は退出の完了として `room_closed`、それ以外は `peer_disconnected`。
pub(crate) async fn announce_evictions(
    message_pusher: &dyn MessagePusher,
    participant: &ParticipantId,
    evictions: &[Eviction],
) {
    for eviction in evictions {
        if eviction.remaining.is_empty() {
            continue;
        }
        let notification = if eviction.was_leaving {
            Notification::RoomClosed {
                room: eviction.room.clone(),
            }
        } else {
            Notification::PeerDisconnected {
                room: eviction.room.clone(),
                participant: participant.clone(),
            }
        };
        if let Err(e) = message_pusher
            .broadcast(eviction.remaining.clone(), &notification)
            .await
        {
            tracing::warn!("Failed to notify peers of room '{}': {}", eviction.room, e);
        }
    }
}
