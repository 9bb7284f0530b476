//! UseCase: マッチング（waiting → ready）
//!
//! 人数の変化、名前・アイコンの更新、再戦の合意のたびに `try_advance` が呼ばれる。
//! 2 人そろっていても名前・アイコンが未設定、または退出中の相手がいる場合は、
//! 一定間隔で再試行するタスクを起動する。タスクは予約時のルーム世代を保持し、
//! 世代が変わった時点で打ち切る。再試行タスクは (ルーム, 世代) ごとに 1 つだけ。
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人目の入室で即座に `room_ready`
//! - 再試行：名前が後から届いた場合に `room_ready`
//! - 冪等性：同時・重複の呼び出しでも `room_ready` は 1 回
//! - 打ち切り：ルームがクリアされたら再試行は何もしない

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use rakugaki_shared::time::Clock;

use crate::domain::{
    MessagePusher, Notification, RoomName, RoomRepository, RoundStart, StartOutcome, Timestamp,
};

use super::list_rooms::broadcast_room_status;

/// Matchmaking Coordinator
pub struct MatchmakingCoordinator {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    retry_interval: Duration,
    max_attempts: u32,
    /// 実行中の再試行タスク
    pending_retries: Mutex<HashSet<(RoomName, u64)>>,
}

impl MatchmakingCoordinator {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        retry_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            retry_interval,
            max_attempts,
            pending_retries: Mutex::new(HashSet::new()),
        }
    }

    /// マッチングを試みる
    ///
    /// 一時的に成立しない場合は再試行タスクを起動して `Waiting` を返す。
    pub async fn try_advance(self: &Arc<Self>, room: &RoomName) -> StartOutcome {
        let outcome = self.attempt(room, None).await;
        if let StartOutcome::Waiting { reason, generation } = &outcome {
            tracing::debug!(
                "Room '{}' is not ready yet ({:?}), scheduling retry",
                room,
                reason
            );
            self.schedule_retry(room.clone(), *generation);
        }
        outcome
    }

    fn schedule_retry(self: &Arc<Self>, room: RoomName, generation: u64) {
        let key = (room, generation);
        if !self.pending().insert(key.clone()) {
            tracing::debug!("Matchmaking retry for room '{}' already running", key.0);
            return;
        }

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let (room, generation) = &key;
            coordinator.retry(room, *generation).await;
            coordinator.pending().remove(&key);
        });
    }

    async fn retry(&self, room: &RoomName, generation: u64) {
        for _ in 0..self.max_attempts {
            tokio::time::sleep(self.retry_interval).await;
            match self.attempt(room, Some(generation)).await {
                StartOutcome::Waiting { .. } => continue,
                StartOutcome::Abandoned => {
                    tracing::debug!("Matchmaking retry for room '{}' abandoned", room);
                    return;
                }
                _ => return,
            }
        }
        tracing::warn!(
            "Matchmaking for room '{}' gave up after {} attempts",
            room,
            self.max_attempts
        );
    }

    fn pending(&self) -> MutexGuard<'_, HashSet<(RoomName, u64)>> {
        self.pending_retries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn pending_retry_count(&self) -> usize {
        self.pending().len()
    }

    async fn attempt(&self, room: &RoomName, expected_generation: Option<u64>) -> StartOutcome {
        let started_at = Timestamp::new(self.clock.now_millis());
        let outcome = self
            .repository
            .try_start_round(room, expected_generation, started_at)
            .await;
        if let StartOutcome::Started(start) = &outcome {
            self.announce(start).await;
        }
        outcome
    }

    /// 各占有者に、相手の情報付きで `room_ready` を送る
    async fn announce(&self, start: &RoundStart) {
        tracing::info!(
            "Room '{}' is ready, host '{}' (started at {})",
            start.room,
            start.host,
            start.started_at.value()
        );
        for seat in &start.seats {
            let Some(peer) = start.seats.iter().find(|other| other.id != seat.id) else {
                continue;
            };
            let notification = Notification::RoomReady {
                room: start.room.clone(),
                host: start.host.clone(),
                peer: peer.clone(),
                started_at: start.started_at,
            };
            if let Err(e) = self.message_pusher.push_to(&seat.id, &notification).await {
                tracing::warn!("Failed to push room_ready to '{}': {}", seat.id, e);
            }
        }
        broadcast_room_status(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            self.clock.as_ref(),
        )
        .await;
    }
}
