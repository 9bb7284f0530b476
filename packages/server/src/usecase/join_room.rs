//! UseCase: 入室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 入室前の追い出し、入室拒否の通知、マッチングの起動
//!
//! ### どのような状況を想定しているか
//! - 正常系：共有ルームへの入室、ルーム名省略時の自動割り当て、専用ルームへの入室
//! - 異常系：満室・退出中のルームへの入室
//! - エッジケース：別ルームからの移動（元のルームの相手に通知）

use std::sync::Arc;

use rakugaki_shared::time::Clock;

use crate::domain::{
    Identity, JoinRejection, MessagePusher, Notification, ParticipantId, RoomKind, RoomName,
    RoomRepository,
};

use super::{
    disconnect_participant::announce_evictions, error::JoinRoomError,
    list_rooms::broadcast_room_status, matchmaking::MatchmakingCoordinator,
};

/// 入室のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    matchmaking: Arc<MatchmakingCoordinator>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        matchmaking: Arc<MatchmakingCoordinator>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            matchmaking,
        }
    }

    /// 入室を実行
    ///
    /// # Arguments
    ///
    /// * `requested` - 入室先。省略時、共有ルームは空いている最初のルーム、
    ///   専用ルームは自分の専用ルームになる。
    ///
    /// # Returns
    ///
    /// * `Ok(RoomName)` - 入室したルーム
    /// * `Err(JoinRoomError)` - 入室失敗（要求者には `join_room_failed` を送信済み）
    pub async fn execute(
        &self,
        participant: &ParticipantId,
        requested: Option<RoomName>,
        kind: RoomKind,
        identity: Identity,
    ) -> Result<RoomName, JoinRoomError> {
        // 1. 参加中のルームから出る
        let evictions = self.repository.evict_participant(participant).await;
        announce_evictions(self.message_pusher.as_ref(), participant, &evictions).await;
        let mut status_changed = evictions.iter().any(|e| !e.kind.is_private());

        // 2. 入室（名前・アイコンが無ければ既定値）
        let identity = identity.or_defaults();
        let joined = self.join(participant, requested, kind, identity).await;

        match &joined {
            Ok(room) => {
                status_changed |= !kind.is_private();
                tracing::info!("Participant '{}' joined room '{}'", participant, room);
                self.announce_joined(participant, room, kind).await;
            }
            Err(JoinRoomError::Rejected { room, reason }) => {
                tracing::warn!(
                    "Participant '{}' was refused room '{}': {}",
                    participant,
                    room,
                    reason
                );
                let notification = Notification::JoinRoomFailed {
                    room: room.clone(),
                    reason: *reason,
                };
                if let Err(e) = self.message_pusher.push_to(participant, &notification).await {
                    tracing::warn!("Failed to push join_room_failed to '{}': {}", participant, e);
                }
            }
            Err(JoinRoomError::NoSharedRoom) => {
                tracing::warn!("No shared room available for '{}'", participant);
            }
        }

        if status_changed {
            broadcast_room_status(
                self.repository.as_ref(),
                self.message_pusher.as_ref(),
                self.clock.as_ref(),
            )
            .await;
        }

        // 3. マッチング
        if let Ok(room) = &joined
            && !kind.is_private()
        {
            self.matchmaking.try_advance(room).await;
        }

        joined
    }

    async fn join(
        &self,
        participant: &ParticipantId,
        requested: Option<RoomName>,
        kind: RoomKind,
        identity: Identity,
    ) -> Result<RoomName, JoinRoomError> {
        let candidates = match (requested, kind.is_private()) {
            (Some(room), _) => vec![room],
            (None, true) => vec![RoomName::private_for(kind, participant)],
            (None, false) => self
                .repository
                .room_status()
                .await
                .into_iter()
                .map(|status| status.room)
                .collect(),
        };

        let mut last_rejection: Option<(RoomName, JoinRejection)> = None;
        for room in candidates {
            match self
                .repository
                .add_occupant(&room, kind, participant, identity.clone())
                .await
            {
                Ok(()) => return Ok(room),
                Err(reason) => last_rejection = Some((room, reason)),
            }
        }

        match last_rejection {
            Some((room, reason)) => Err(JoinRoomError::Rejected { room, reason }),
            None => Err(JoinRoomError::NoSharedRoom),
        }
    }

    async fn announce_joined(&self, participant: &ParticipantId, room: &RoomName, kind: RoomKind) {
        let occupants = self
            .repository
            .get_room(room)
            .await
            .map(|snapshot| snapshot.occupants().to_vec())
            .unwrap_or_default();
        let notification = Notification::RoomJoined {
            room: room.clone(),
            kind,
            occupants,
        };
        if let Err(e) = self.message_pusher.push_to(participant, &notification).await {
            tracing::warn!("Failed to push room_joined to '{}': {}", participant, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{TestContext, pid, room};

    #[tokio::test]
    async fn test_join_shared_room() {
        // テスト項目: 共有ルームに入室でき、`room_joined` と `room_status` が届く
        // given (前提条件):
        let ctx = TestContext::new();
        let mut alice = ctx.connect("alice").await;
        let usecase = ctx.join_room();

        // when (操作):
        let result = usecase
            .execute(
                &pid("alice"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::new("Alice", "🐶"),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(room("room1")));
        let joined = alice.expect("room_joined");
        assert_eq!(joined["room"], "room1");
        assert_eq!(joined["kind"], "shared");
        assert_eq!(joined["occupants"][0]["name"], "Alice");
        let status = alice.expect("room_status");
        assert_eq!(status["rooms"][0]["occupants"], 1);
    }

    #[tokio::test]
    async fn test_second_join_starts_match() {
        // テスト項目: 2 人目の入室でマッチングが成立する
        // given (前提条件):
        let ctx = TestContext::new();
        let mut alice = ctx.connect("alice").await;
        let _bob = ctx.connect("bob").await;
        let usecase = ctx.join_room();
        usecase
            .execute(
                &pid("alice"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::new("Alice", "🐶"),
            )
            .await
            .unwrap();

        // when (操作):
        usecase
            .execute(
                &pid("bob"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::new("Bob", "🐸"),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let ready = alice.expect("room_ready");
        assert_eq!(ready["peer"]["participant_id"], "bob");
    }

    #[tokio::test]
    async fn test_join_full_room_is_rejected() {
        // テスト項目: 満室のルームへの入室は `join_room_failed` で拒否され、状態は変わらない
        // given (前提条件):
        let ctx = TestContext::new();
        let mut carol = ctx.connect("carol").await;
        ctx.seat("room1", "alice", Identity::default()).await;
        ctx.seat("room1", "bob", Identity::default()).await;
        let usecase = ctx.join_room();

        // when (操作):
        let result = usecase
            .execute(
                &pid("carol"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::new("Carol", "🐼"),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinRoomError::Rejected {
                room: room("room1"),
                reason: JoinRejection::RoomFull,
            })
        );
        let failed = carol.expect("join_room_failed");
        assert_eq!(failed["reason"], "room_full");
        assert_eq!(ctx.list_rooms().execute().await[0].occupants, 2);
    }

    #[tokio::test]
    async fn test_join_without_room_picks_first_open() {
        // テスト項目: ルーム名を省略すると空いている最初の共有ルームに入る
        // given (前提条件):
        let ctx = TestContext::new();
        let _carol = ctx.connect("carol").await;
        ctx.seat("room1", "alice", Identity::default()).await;
        ctx.seat("room1", "bob", Identity::default()).await;

        // when (操作):
        let result = ctx
            .join_room()
            .execute(&pid("carol"), None, RoomKind::Shared, Identity::default())
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(room("room2")));
    }

    #[tokio::test]
    async fn test_join_without_identity_uses_defaults_and_matches() {
        // テスト項目: 名前・アイコンなしで入室しても既定値が入り、マッチングが成立する
        // given (前提条件):
        let ctx = TestContext::new();
        let mut alice = ctx.connect("alice").await;
        let mut bob = ctx.connect("bob").await;
        let usecase = ctx.join_room();
        usecase
            .execute(
                &pid("alice"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::default(),
            )
            .await
            .unwrap();

        // when (操作):
        usecase
            .execute(
                &pid("bob"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::new("Bob", ""),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let ready = bob.expect("room_ready");
        assert_eq!(ready["peer"]["name"], crate::domain::DEFAULT_NAME);
        assert_eq!(ready["peer"]["icon"], crate::domain::DEFAULT_ICON);
        let ready = alice.expect("room_ready");
        assert_eq!(ready["peer"]["name"], "Bob");
    }

    #[tokio::test]
    async fn test_join_private_room() {
        // テスト項目: 専用ルームは自分専用の名前で作られ、共有ルームの状態には現れない
        // given (前提条件):
        let ctx = TestContext::new();
        let mut alice = ctx.connect("alice").await;

        // when (操作):
        let result = ctx
            .join_room()
            .execute(&pid("alice"), None, RoomKind::Training, Identity::default())
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(room("training_alice")));
        assert_eq!(alice.expect("room_joined")["kind"], "training");
        assert!(alice.types().iter().all(|t| t != "room_status"));
    }

    #[tokio::test]
    async fn test_join_moves_out_of_previous_room() {
        // テスト項目: 別のルームへ移ると、元のルームの相手に `peer_disconnected` が届く
        // given (前提条件):
        let ctx = TestContext::new();
        let _alice = ctx.connect("alice").await;
        let mut bob = ctx.connect("bob").await;
        ctx.seat("room1", "alice", Identity::default()).await;
        ctx.seat("room1", "bob", Identity::default()).await;

        // when (操作):
        ctx.join_room()
            .execute(
                &pid("alice"),
                Some(room("room2")),
                RoomKind::Shared,
                Identity::default(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let disconnected = bob.expect("peer_disconnected");
        assert_eq!(disconnected["room"], "room1");
        let rooms = ctx.list_rooms().execute().await;
        assert_eq!(rooms[0].occupants, 0);
        assert_eq!(rooms[1].occupants, 1);
    }

    #[tokio::test]
    async fn test_join_leaving_room_is_rejected() {
        // テスト項目: 退出の申し出から完了までの間、ルームは入室を受け付けない
        // given (前提条件):
        let ctx = TestContext::new();
        let mut carol = ctx.connect("carol").await;
        ctx.seat("room1", "alice", Identity::default()).await;
        ctx.seat("room1", "bob", Identity::default()).await;
        ctx.repository
            .begin_leave(&room("room1"), &pid("alice"))
            .await
            .unwrap();

        // when (操作):
        let result = ctx
            .join_room()
            .execute(
                &pid("carol"),
                Some(room("room1")),
                RoomKind::Shared,
                Identity::default(),
            )
            .await;

        // then (期待する結果):
        assert!(result.is_err());
        assert_eq!(carol.expect("join_room_failed")["reason"], "room_full");
        assert!(ctx.list_rooms().execute().await[0].departing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_respect_capacity() {
        // テスト項目: 同時に 5 人が入室しても 2 人までしか座れず、`room_ready` は各自 1 回だけ届く
        // given (前提条件):
        let ctx = TestContext::new();
        let names = ["alice", "bob", "carol", "dave", "erin"];
        let mut clients = Vec::new();
        for name in names {
            clients.push(ctx.connect(name).await);
        }
        let usecase = Arc::new(ctx.join_room());

        // when (操作):
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let usecase = usecase.clone();
                let participant = pid(name);
                tokio::spawn(async move {
                    usecase
                        .execute(
                            &participant,
                            Some(room("room1")),
                            RoomKind::Shared,
                            Identity::new(participant.as_str(), "🎨"),
                        )
                        .await
                })
            })
            .collect();
        let results: Vec<_> = futures_util::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();
        // 再試行タスクが残っていても重複通知が出ないことを確かめる
        tokio::time::sleep(ctx.config.matchmaking_retry * 5).await;

        // then (期待する結果):
        assert_eq!(ctx.list_rooms().execute().await[0].occupants, 2);
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(JoinRoomError::Rejected { .. })))
            .count();
        assert_eq!(rejected, 3);

        for (client, result) in clients.iter_mut().zip(&results) {
            let ready = client.types().iter().filter(|t| *t == "room_ready").count();
            if result.is_ok() {
                assert_eq!(ready, 1, "'{}' should get exactly one room_ready", client.id);
            } else {
                assert_eq!(ready, 0, "'{}' was not seated", client.id);
            }
        }
    }
}
