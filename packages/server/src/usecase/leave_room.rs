//! UseCase: 退出（2 段階）
//!
//! 1. `leave`：相手がいる共有ルームでは退出中（Leaving）になる。ルームは人数に
//!    数えられたまま新規入室を拒否し、相手には `peer_departing` が届く。
//!    猶予時間のタイマーを起動する。
//! 2. `leave_confirmed`：退出中のルームをクリアし、相手に `room_closed` を送る。
//!    確認が来ないまま猶予時間が過ぎた場合も同じ後始末を行う。
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：申し出 → 確認でルームが空く
//! - 猶予切れ：確認が来なくてもルームが空く
//! - 打ち切り：確認後の猶予切れは何もしない
//! - エッジケース：一人きりのルーム、専用ルーム

use std::{sync::Arc, time::Duration};

use rakugaki_shared::time::Clock;

use crate::domain::{
    LeaveOutcome, MessagePusher, Notification, ParticipantId, RoomClosure, RoomName,
    RoomRepository,
};

use super::{error::RoomActionError, list_rooms::broadcast_room_status};

/// 退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        grace: Duration,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            grace,
        }
    }

    /// 退出の申し出
    pub async fn begin(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
    ) -> Result<LeaveOutcome, RoomActionError> {
        let outcome = self.repository.begin_leave(room, participant).await?;

        let grace_secs = match &outcome {
            LeaveOutcome::Departing { peers, generation } => {
                tracing::info!(
                    "Participant '{}' is leaving room '{}' ({}s grace)",
                    participant,
                    room,
                    self.grace.as_secs()
                );
                let notification = Notification::PeerDeparting {
                    room: room.clone(),
                    participant: participant.clone(),
                };
                if let Err(e) = self
                    .message_pusher
                    .broadcast(peers.clone(), &notification)
                    .await
                {
                    tracing::warn!("Failed to broadcast peer_departing: {}", e);
                }
                self.schedule_expiry(room.clone(), participant.clone(), *generation);
                self.grace.as_secs()
            }
            LeaveOutcome::Left { abandoned } => {
                tracing::info!("Participant '{}' left room '{}'", participant, room);
                if !abandoned.is_empty() {
                    // 退出中のまま残っていた側にとっては退出の完了
                    let notification = Notification::RoomClosed { room: room.clone() };
                    if let Err(e) = self
                        .message_pusher
                        .broadcast(abandoned.clone(), &notification)
                        .await
                    {
                        tracing::warn!("Failed to broadcast room_closed: {}", e);
                    }
                }
                0
            }
            LeaveOutcome::PrivateRoomClosed => {
                tracing::info!("Private room '{}' closed", room);
                0
            }
        };

        let ack = Notification::LeaveAcknowledged {
            room: room.clone(),
            grace_secs,
        };
        if let Err(e) = self.message_pusher.push_to(participant, &ack).await {
            tracing::warn!("Failed to push leave_acknowledged to '{}': {}", participant, e);
        }

        if !matches!(outcome, LeaveOutcome::PrivateRoomClosed) {
            broadcast_room_status(
                self.repository.as_ref(),
                self.message_pusher.as_ref(),
                self.clock.as_ref(),
            )
            .await;
        }
        Ok(outcome)
    }

    /// 退出の完了
    ///
    /// 退出中でなければ何もしない。
    pub async fn confirm(&self, participant: &ParticipantId) -> Option<RoomClosure> {
        let closure = self.repository.confirm_leave(participant).await?;
        tracing::info!(
            "Participant '{}' confirmed leaving room '{}'",
            participant,
            closure.room
        );
        close_room(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            self.clock.as_ref(),
            &closure,
        )
        .await;
        Some(closure)
    }

    fn schedule_expiry(&self, room: RoomName, participant: ParticipantId, generation: u64) {
        let repository = Arc::clone(&self.repository);
        let message_pusher = Arc::clone(&self.message_pusher);
        let clock = Arc::clone(&self.clock);
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let Some(closure) = repository
                .expire_leave(&room, &participant, generation)
                .await
            else {
                return;
            };
            tracing::info!(
                "Grace window for '{}' in room '{}' expired, room cleared",
                participant,
                room
            );
            close_room(
                repository.as_ref(),
                message_pusher.as_ref(),
                clock.as_ref(),
                &closure,
            )
            .await;
        });
    }
}

async fn close_room(
    repository: &dyn RoomRepository,
    message_pusher: &dyn MessagePusher,
    clock: &dyn Clock,
    closure: &RoomClosure,
) {
    let notification = Notification::RoomClosed {
        room: closure.room.clone(),
    };
    if let Err(e) = message_pusher
        .broadcast(closure.remaining.clone(), &notification)
        .await
    {
        tracing::warn!("Failed to broadcast room_closed: {}", e);
    }
    broadcast_room_status(repository, message_pusher, clock).await;
}
