//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続ごとの ID 発行、MessagePusher への登録、初期メッセージの送信
//!
//! ### なぜこのテストが必要か
//! - 参加者の識別はクライアントの申告ではなくサーバーが発行した ID で行う
//! - 接続直後に `connected` と `room_status` が届くことを保証

use std::sync::Arc;

use rakugaki_shared::time::Clock;

use crate::domain::{MessagePusher, Notification, ParticipantId, PusherChannel, RoomRepository};

use super::list_rooms::room_status_notification;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
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

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// 発行した参加者 ID
    pub async fn execute(&self, sender: PusherChannel) -> ParticipantId {
        let participant = ParticipantId::generate();
        self.message_pusher
            .register_client(participant.clone(), sender)
            .await;

        let connected = Notification::Connected {
            participant: participant.clone(),
        };
        let status =
            room_status_notification(self.repository.as_ref(), self.clock.as_ref()).await;
        for notification in [connected, status] {
            if let Err(e) = self.message_pusher.push_to(&participant, &notification).await {
                tracing::warn!("Failed to greet '{}': {}", participant, e);
            }
        }

        tracing::info!("Participant '{}' connected", participant);
        participant
    }
}
