//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を管理
//! - `Notification` を JSON にシリアライズしてクライアントへ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{MessagePushError, MessagePusher, Notification, ParticipantId, PusherChannel},
    infrastructure::dto::websocket::ServerMessage,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    ///
    /// Key: participant_id (String)
    /// Value: PusherChannel
    clients: Arc<Mutex<HashMap<String, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<String, PusherChannel>>>) -> Self {
        Self { clients }
    }

    /// 接続中のクライアント数
    pub async fn count_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}

fn encode(notification: &Notification) -> Result<String, MessagePushError> {
    serde_json::to_string(&ServerMessage::from(notification.clone()))
        .map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, participant: ParticipantId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", participant);
        clients.insert(participant.into_string(), sender);
    }

    async fn unregister_client(&self, participant: &ParticipantId) {
        let mut clients = self.clients.lock().await;
        clients.remove(participant.as_str());
        tracing::debug!("Client '{}' unregistered from MessagePusher", participant);
    }

    async fn push_to(
        &self,
        participant: &ParticipantId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let content = encode(notification)?;
        let clients = self.clients.lock().await;

        if let Some(sender) = clients.get(participant.as_str()) {
            sender
                .send(content)
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed message to client '{}'", participant);
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(participant.to_string()))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ParticipantId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let content = encode(notification)?;
        let clients = self.clients.lock().await;

        for target in targets {
            if let Some(sender) = clients.get(target.as_str()) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.clone()) {
                    tracing::warn!("Failed to push message to client '{}': {}", target, e);
                } else {
                    tracing::debug!("Broadcasted message to client '{}'", target);
                }
            } else {
                tracing::warn!("Client '{}' not found during broadcast, skipping", target);
            }
        }

        Ok(())
    }

    async fn broadcast_all(&self, notification: &Notification) -> Result<(), MessagePushError> {
        let content = encode(notification)?;
        let clients = self.clients.lock().await;

        for (participant, sender) in clients.iter() {
            if let Err(e) = sender.send(content.clone()) {
                tracing::warn!("Failed to push message to '{}': {}", participant, e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomName, Timestamp};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - WebSocketMessagePusher の通知送信機能
    // - push_to / broadcast / broadcast_all
    // - 通知が type タグ付きの JSON として届くこと
    //
    // 【どのようなシナリオをテストするか】
    // 1. push_to の成功ケースと失敗ケース（クライアントが存在しない）
    // 2. broadcast の部分失敗ケース（一部のクライアントが存在しない）
    // 3. broadcast_all で登録済みの全員に届く
    // 4. 登録解除後は届かない
    // ========================================

    fn pid(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn create_test_pusher() -> WebSocketMessagePusher {
        WebSocketMessagePusher::new(Arc::new(Mutex::new(HashMap::new())))
    }

    fn room_closed() -> Notification {
        Notification::RoomClosed {
            room: RoomName::new("room1".to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定のクライアントに JSON で通知を送信できる
        // given (前提条件):
        let pusher = create_test_pusher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(pid("alice"), tx).await;

        // when (操作):
        let result = pusher.push_to(&pid("alice"), &room_closed()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let received: serde_json::Value =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(received["type"], "room_closed");
        assert_eq!(received["room"], "room1");
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 存在しないクライアントへの送信はエラーを返す
        // given (前提条件):
        let pusher = create_test_pusher();

        // when (操作):
        let result = pusher.push_to(&pid("nobody"), &room_closed()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: ブロードキャスト時、一部のクライアントが存在しなくても成功する
        // given (前提条件):
        let pusher = create_test_pusher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(pid("alice"), tx).await;

        // when (操作):
        let result = pusher
            .broadcast(vec![pid("alice"), pid("ghost")], &room_closed())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_broadcast_all_reaches_everyone() {
        // テスト項目: 接続中の全員に通知が届く
        // given (前提条件):
        let pusher = create_test_pusher();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher.register_client(pid("alice"), tx1).await;
        pusher.register_client(pid("bob"), tx2).await;
        let status = Notification::RoomStatus {
            rooms: Vec::new(),
            timestamp: Timestamp::new(42),
        };

        // when (操作):
        pusher.broadcast_all(&status).await.unwrap();

        // then (期待する結果):
        for rx in [&mut rx1, &mut rx2] {
            let received: serde_json::Value =
                serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(received["type"], "room_status");
            assert_eq!(received["timestamp"], 42);
        }
    }

    #[tokio::test]
    async fn test_unregister_client() {
        // テスト項目: 登録解除したクライアントには送信できない
        // given (前提条件):
        let pusher = create_test_pusher();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher.register_client(pid("alice"), tx).await;

        // when (操作):
        pusher.unregister_client(&pid("alice")).await;

        // then (期待する結果):
        assert_eq!(pusher.count_clients().await, 0);
        assert!(pusher.push_to(&pid("alice"), &room_closed()).await.is_err());
    }
}
