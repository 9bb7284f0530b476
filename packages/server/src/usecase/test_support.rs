//! UseCase テスト用のヘルパー
//!
//! 本物の `InMemoryRoomRepository` と `WebSocketMessagePusher` を組み立て、
//! 各参加者に届いた JSON をチャネルから読み出せるようにする。

use std::{collections::HashMap, collections::VecDeque, sync::Arc, time::Duration};

use rakugaki_shared::time::FixedClock;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};

use crate::{
    config::ServerConfig,
    domain::{
        Identity, MessagePusher, ParticipantId, RoomKind, RoomName, RoomRegistry, TopicCatalog,
        TopicResolver,
    },
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
};

use super::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, FinishDrawingUseCase,
    JoinRoomUseCase, LeaveRoomUseCase, ListRoomsUseCase, MatchmakingCoordinator,
    ProposeTopicUseCase, RelayDrawingUseCase, RequestRematchUseCase, SubmitPredictionUseCase,
    UpdateIdentityUseCase,
};

pub fn pid(value: &str) -> ParticipantId {
    ParticipantId::new(value.to_string()).unwrap()
}

pub fn room(value: &str) -> RoomName {
    RoomName::new(value.to_string()).unwrap()
}

/// 1 つの接続に届いたメッセージ
pub struct TestClient {
    pub id: ParticipantId,
    rx: mpsc::UnboundedReceiver<String>,
    buffer: VecDeque<Value>,
}

impl TestClient {
    pub fn new(id: ParticipantId, rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            id,
            rx,
            buffer: VecDeque::new(),
        }
    }

    fn pull(&mut self) {
        while let Ok(raw) = self.rx.try_recv() {
            self.buffer.push_back(serde_json::from_str(&raw).unwrap());
        }
    }

    /// 届いている全メッセージを取り出す
    pub fn drain(&mut self) -> Vec<Value> {
        self.pull();
        self.buffer.drain(..).collect()
    }

    /// 届いている全メッセージの type
    pub fn types(&mut self) -> Vec<String> {
        self.drain()
            .iter()
            .map(|m| m["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// 指定した type の最初のメッセージを取り出す（他のメッセージは残す）
    pub fn expect(&mut self, message_type: &str) -> Value {
        self.pull();
        let index = self
            .buffer
            .iter()
            .position(|m| m["type"] == message_type)
            .unwrap_or_else(|| {
                panic!(
                    "'{}' did not receive '{}', got {:?}",
                    self.id, message_type, self.buffer
                )
            });
        self.buffer.remove(index).unwrap()
    }

    /// 指定した type のメッセージが届くまで待つ（タイマー経由の通知用）
    pub async fn wait_for(&mut self, message_type: &str) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        loop {
            self.pull();
            if self.buffer.iter().any(|m| m["type"] == message_type) {
                return self.expect(message_type);
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("'{}' timed out waiting for '{}'", self.id, message_type);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// UseCase を組み立てるためのテスト環境
///
/// 共有ルームは room1, room2。タイマーは短く、乱数のシードは固定。
pub struct TestContext {
    pub repository: Arc<InMemoryRoomRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub clock: Arc<FixedClock>,
    pub resolver: Arc<TopicResolver>,
    pub config: ServerConfig,
}

impl TestContext {
    pub const NOW: i64 = 1_700_000_000_000;

    pub fn new() -> Self {
        let config = ServerConfig {
            shared_rooms: vec!["room1".to_string(), "room2".to_string()],
            matchmaking_retry: Duration::from_millis(10),
            matchmaking_max_attempts: 100,
            topic_timeout: Duration::from_millis(50),
            leave_grace: Duration::from_millis(100),
            seed: Some(7),
        };
        let registry = RoomRegistry::new(config.shared_room_names().unwrap());
        Self {
            repository: Arc::new(InMemoryRoomRepository::new(Arc::new(Mutex::new(registry)))),
            pusher: Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
                HashMap::new(),
            )))),
            clock: Arc::new(FixedClock::new(Self::NOW)),
            resolver: Arc::new(TopicResolver::new(TopicCatalog::default(), config.seed)),
            config,
        }
    }

    /// 接続を登録し、その受信側を返す
    pub async fn connect(&self, id: &str) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(pid(id), tx).await;
        TestClient::new(pid(id), rx)
    }

    /// 通知なしで共有ルームに座らせる
    pub async fn seat(&self, room_name: &str, id: &str, identity: Identity) {
        use crate::domain::RoomRepository;
        self.repository
            .add_occupant(&room(room_name), RoomKind::Shared, &pid(id), identity)
            .await
            .unwrap();
    }

    /// 2 人を座らせてマッチングを成立させる（名前は ID と同じ）
    pub async fn start_round(&self, room_name: &str, first: &str, second: &str) {
        self.seat(room_name, first, Identity::new(first, "🎨")).await;
        self.seat(room_name, second, Identity::new(second, "🖌")).await;
        let outcome = self.matchmaking().try_advance(&room(room_name)).await;
        assert!(matches!(outcome, crate::domain::StartOutcome::Started(_)));
    }

    pub fn matchmaking(&self) -> Arc<MatchmakingCoordinator> {
        Arc::new(MatchmakingCoordinator::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            self.config.matchmaking_retry,
            self.config.matchmaking_max_attempts,
        ))
    }

    pub fn connect_participant(&self) -> ConnectParticipantUseCase {
        ConnectParticipantUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn disconnect_participant(&self) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn list_rooms(&self) -> ListRoomsUseCase {
        ListRoomsUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn join_room(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            self.matchmaking(),
        )
    }

    pub fn update_identity(&self) -> UpdateIdentityUseCase {
        UpdateIdentityUseCase::new(self.repository.clone(), self.matchmaking())
    }

    pub fn propose_topic(&self) -> ProposeTopicUseCase {
        ProposeTopicUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.resolver.clone(),
            self.config.topic_timeout,
        )
    }

    pub fn submit_prediction(&self) -> SubmitPredictionUseCase {
        SubmitPredictionUseCase::new(self.repository.clone(), self.pusher.clone())
    }

    pub fn request_rematch(&self) -> RequestRematchUseCase {
        RequestRematchUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.matchmaking(),
        )
    }

    pub fn finish_drawing(&self) -> FinishDrawingUseCase {
        FinishDrawingUseCase::new(self.repository.clone(), self.pusher.clone())
    }

    pub fn relay_drawing(&self) -> RelayDrawingUseCase {
        RelayDrawingUseCase::new(self.repository.clone(), self.pusher.clone())
    }

    pub fn leave_room(&self) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            self.config.leave_grace,
        )
    }
}
