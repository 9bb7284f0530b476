//! MessagePusher trait 定義
//!
//! UseCase 層から参加者への通知を送るためのインターフェース。
//! 具体的な送信手段（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, notification::Notification, value_object::ParticipantId};

/// 接続ごとの送信チャネル（シリアライズ済みの JSON を流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 参加者への通知を送るインターフェース
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, participant: ParticipantId, sender: PusherChannel);

    /// 接続を登録解除
    async fn unregister_client(&self, participant: &ParticipantId);

    /// 特定の参加者に送信
    async fn push_to(
        &self,
        participant: &ParticipantId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 複数の参加者に送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ParticipantId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 接続中の全員に送信
    async fn broadcast_all(&self, notification: &Notification) -> Result<(), MessagePushError>;
}
