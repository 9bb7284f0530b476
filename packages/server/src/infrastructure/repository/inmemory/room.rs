//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `RoomRegistry` を 1 つの `tokio::sync::Mutex` で包み、インメモリ DB として使用します。
//!
//! 各メソッドはロックを 1 回だけ取り、その中で確認と変更を終わらせる。
//! 「両者の予測がそろったら判定して消す」といった手順が途中で割り込まれることはない。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Eviction, Identity, JoinRejection, LeaveOutcome, ParticipantId, PredictionOutcome,
    PredictionSubmission, ProposalOutcome, RematchOutcome, RepositoryError, Room, RoomClosure,
    RoomKind, RoomName, RoomRegistry, RoomRepository, RoomStatus, StartOutcome, Timestamp,
    TopicProposal, TopicResolution, TopicResolver,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    registry: Arc<Mutex<RoomRegistry>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(registry: Arc<Mutex<RoomRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_room(&self, room: &RoomName) -> Option<Room> {
        let registry = self.registry.lock().await;
        registry.room(room).cloned()
    }

    async fn room_status(&self) -> Vec<RoomStatus> {
        let registry = self.registry.lock().await;
        registry.room_status()
    }

    async fn rooms_of(&self, participant: &ParticipantId) -> Vec<RoomName> {
        let registry = self.registry.lock().await;
        registry.rooms_of(participant)
    }

    async fn add_occupant(
        &self,
        room: &RoomName,
        kind: RoomKind,
        participant: &ParticipantId,
        identity: Identity,
    ) -> Result<(), JoinRejection> {
        let mut registry = self.registry.lock().await;
        registry.add_occupant(room, kind, participant, identity)
    }

    async fn evict_participant(&self, participant: &ParticipantId) -> Vec<Eviction> {
        let mut registry = self.registry.lock().await;
        registry.evict_participant(participant)
    }

    async fn update_identity(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        identity: Identity,
    ) -> Result<(), RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.update_identity(room, participant, identity)
    }

    async fn try_start_round(
        &self,
        room: &RoomName,
        expected_generation: Option<u64>,
        started_at: Timestamp,
    ) -> StartOutcome {
        let mut registry = self.registry.lock().await;
        registry.try_start_round(room, expected_generation, started_at)
    }

    async fn record_topic_proposal(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        proposal: TopicProposal,
        resolver: &TopicResolver,
    ) -> Result<ProposalOutcome, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.record_topic_proposal(room, participant, proposal, resolver)
    }

    async fn resolve_lone_proposal(
        &self,
        room: &RoomName,
        generation: u64,
        resolver: &TopicResolver,
    ) -> Option<TopicResolution> {
        let mut registry = self.registry.lock().await;
        registry.resolve_lone_proposal(room, generation, resolver)
    }

    async fn record_prediction(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        submission: PredictionSubmission,
    ) -> Result<PredictionOutcome, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.record_prediction(room, participant, submission)
    }

    async fn record_rematch_request(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<RematchOutcome, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.record_rematch_request(room, participant)
    }

    async fn record_finish(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<Vec<ParticipantId>, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.record_finish(room, participant)
    }

    async fn peers_of(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<Vec<ParticipantId>, RepositoryError> {
        let registry = self.registry.lock().await;
        registry.peers_of(room, participant)
    }

    async fn begin_leave(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<LeaveOutcome, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.begin_leave(room, participant)
    }

    async fn confirm_leave(&self, participant: &ParticipantId) -> Option<RoomClosure> {
        let mut registry = self.registry.lock().await;
        registry.confirm_leave(participant)
    }

    async fn expire_leave(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        generation: u64,
    ) -> Option<RoomClosure> {
        let mut registry = self.registry.lock().await;
        registry.expire_leave(room, participant, generation)
    }
}
