//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{Identity, PredictionSubmission, Room, RoomStatus, TopicProposal},
    error::{JoinRejection, RepositoryError},
    registry::{
        Eviction, LeaveOutcome, PredictionOutcome, ProposalOutcome, RematchOutcome, RoomClosure,
        StartOutcome, TopicResolution,
    },
    topic::TopicResolver,
    value_object::{ParticipantId, RoomKind, RoomName, Timestamp},
};

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// 各メソッドは「確認・変更・通知先の決定」を 1 回のロック内で行い、
/// 結果（誰に何を通知すべきか）を返す。通知そのものは呼び出し側が行う。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームのスナップショットを取得
    async fn get_room(&self, room: &RoomName) -> Option<Room>;

    /// 共有ルームの状態一覧
    async fn room_status(&self) -> Vec<RoomStatus>;

    /// 参加者が入っているルーム名の一覧
    async fn rooms_of(&self, participant: &ParticipantId) -> Vec<RoomName>;

    /// 入室
    async fn add_occupant(
        &self,
        room: &RoomName,
        kind: RoomKind,
        participant: &ParticipantId,
        identity: Identity,
    ) -> Result<(), JoinRejection>;

    /// 参加中の全ルームから退室させる
    async fn evict_participant(&self, participant: &ParticipantId) -> Vec<Eviction>;

    /// 名前・アイコンを更新
    async fn update_identity(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        identity: Identity,
    ) -> Result<(), RepositoryError>;

    /// マッチングを試みる
    async fn try_start_round(
        &self,
        room: &RoomName,
        expected_generation: Option<u64>,
        started_at: Timestamp,
    ) -> StartOutcome;

    /// お題の提案を記録
    async fn record_topic_proposal(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        proposal: TopicProposal,
        resolver: &TopicResolver,
    ) -> Result<ProposalOutcome, RepositoryError>;

    /// 片方だけの提案を採用
    async fn resolve_lone_proposal(
        &self,
        room: &RoomName,
        generation: u64,
        resolver: &TopicResolver,
    ) -> Option<TopicResolution>;

    /// 予測結果を記録
    async fn record_prediction(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        submission: PredictionSubmission,
    ) -> Result<PredictionOutcome, RepositoryError>;

    /// 再戦希望を記録
    async fn record_rematch_request(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<RematchOutcome, RepositoryError>;

    /// 描き終わりを記録
    async fn record_finish(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<Vec<ParticipantId>, RepositoryError>;

    /// 同じルームの相手を取得
    async fn peers_of(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<Vec<ParticipantId>, RepositoryError>;

    /// 退出の申し出
    async fn begin_leave(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<LeaveOutcome, RepositoryError>;

    /// 退出完了
    async fn confirm_leave(&self, participant: &ParticipantId) -> Option<RoomClosure>;

    /// 退出の猶予切れ
    async fn expire_leave(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
        generation: u64,
    ) -> Option<RoomClosure>;
}
