//! Domain entities: rooms, their occupants and the state of the open round.

use std::collections::HashMap;

use serde::Serialize;

use super::{
    error::JoinRejection,
    value_object::{ParticipantId, RoomKind, RoomName, Timestamp, Topic},
};

/// Name given to participants who join without one.
pub const DEFAULT_NAME: &str = "名無し";
/// Icon given to participants who join without one.
pub const DEFAULT_ICON: &str = "👤";

/// 表示名とアイコン
///
/// 入室時は `or_defaults` で補われる。`update_identity` で空にされた場合は、
/// 両方そろうまでマッチングは成立しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    pub icon: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            icon: icon.into().trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.icon.is_empty()
    }

    /// 空の名前・アイコンを既定値で補う
    pub fn or_defaults(self) -> Self {
        let pick = |value: String, default: &str| {
            if value.is_empty() {
                default.to_string()
            } else {
                value
            }
        };
        Self {
            name: pick(self.name, DEFAULT_NAME),
            icon: pick(self.icon, DEFAULT_ICON),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureStatus {
    Present,
    /// 退出を申し出たが、完了通知がまだ届いていない
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occupant {
    pub id: ParticipantId,
    pub identity: Identity,
    pub status: DepartureStatus,
}

impl Occupant {
    pub fn new(id: ParticipantId, identity: Identity) -> Self {
        Self {
            id,
            identity,
            status: DepartureStatus::Present,
        }
    }

    pub fn is_leaving(&self) -> bool {
        self.status == DepartureStatus::Leaving
    }
}

/// 分類器が返す (ラベル, 確信度) の組
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLabel {
    pub label: String,
    pub confidence: f64,
}

impl RankedLabel {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// 判定待ちの予測結果
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSubmission {
    /// 確信度の高い順
    pub ranked_labels: Vec<RankedLabel>,
    pub target_topic: Topic,
    pub display_name: String,
}

/// A proposal for the round's topic. `Random` is drawn from the catalog only
/// when the proposal wins resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicProposal {
    Random,
    Specific(Topic),
}

/// 進行中ラウンドの一時状態
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub host: Option<ParticipantId>,
    pub started_at: Option<Timestamp>,
    pub topic: Option<Topic>,
    /// 到着順を保つため Vec で持つ
    pub proposals: Vec<(ParticipantId, TopicProposal)>,
    pub judgments: HashMap<ParticipantId, PredictionSubmission>,
}

impl RoundState {
    fn forget(&mut self, participant: &ParticipantId) {
        self.proposals.retain(|(id, _)| id != participant);
        self.judgments.remove(participant);
    }
}

/// Occupancy summary of a shared room. Never carries identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomStatus {
    pub room: RoomName,
    pub occupants: usize,
    pub departing: bool,
    pub in_progress: bool,
}

/// Room エンティティ
///
/// 占有者は入室順に並び、先頭がホストになる。`generation` はクリアと
/// ラウンド開始のたびに進み、タイマーが古いルームに作用しないための目印になる。
#[derive(Debug, Clone)]
pub struct Room {
    name: RoomName,
    kind: RoomKind,
    occupants: Vec<Occupant>,
    in_progress: bool,
    generation: u64,
    round: RoundState,
    rematch_requests: Vec<ParticipantId>,
    finish_requests: Vec<ParticipantId>,
}

impl Room {
    pub fn new(name: RoomName, kind: RoomKind) -> Self {
        Self {
            name,
            kind,
            occupants: Vec::new(),
            in_progress: false,
            generation: 0,
            round: RoundState::default(),
            rematch_requests: Vec::new(),
            finish_requests: Vec::new(),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn kind(&self) -> RoomKind {
        self.kind
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub fn occupant_ids(&self) -> Vec<ParticipantId> {
        self.occupants.iter().map(|o| o.id.clone()).collect()
    }

    pub fn occupant(&self, participant: &ParticipantId) -> Option<&Occupant> {
        self.occupants.iter().find(|o| &o.id == participant)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.occupant(participant).is_some()
    }

    /// 指定した参加者以外の占有者
    pub fn peers_of(&self, participant: &ParticipantId) -> Vec<ParticipantId> {
        self.occupants
            .iter()
            .filter(|o| &o.id != participant)
            .map(|o| o.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.kind.capacity()
    }

    pub fn has_leaving(&self) -> bool {
        self.occupants.iter().any(Occupant::is_leaving)
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn rematch_requests(&self) -> &[ParticipantId] {
        &self.rematch_requests
    }

    pub fn finish_requests(&self) -> &[ParticipantId] {
        &self.finish_requests
    }

    pub fn status(&self) -> RoomStatus {
        RoomStatus {
            room: self.name.clone(),
            occupants: self.occupants.len(),
            departing: self.has_leaving(),
            in_progress: self.in_progress,
        }
    }

    /// 占有者を追加する。拒否した場合は何も変更しない。
    pub fn add_occupant(
        &mut self,
        participant: ParticipantId,
        identity: Identity,
    ) -> Result<(), JoinRejection> {
        if self.contains(&participant) {
            return Err(JoinRejection::AlreadyJoined);
        }
        if self.is_full() {
            return Err(JoinRejection::RoomFull);
        }
        if self.in_progress {
            return Err(JoinRejection::GameInProgress);
        }
        if self.has_leaving() {
            return Err(JoinRejection::LeavingInProgress);
        }
        self.occupants.push(Occupant::new(participant, identity));
        Ok(())
    }

    /// 占有者を削除し、保留中の要求からも取り除く。いなければ `false`。
    pub fn remove_occupant(&mut self, participant: &ParticipantId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| &o.id != participant);
        if self.occupants.len() == before {
            return false;
        }
        self.round.forget(participant);
        self.rematch_requests.retain(|id| id != participant);
        self.finish_requests.retain(|id| id != participant);
        true
    }

    /// すべての一時状態を初期化する（退出中マークも含む）
    pub fn clear(&mut self) {
        self.occupants.clear();
        self.in_progress = false;
        self.round = RoundState::default();
        self.rematch_requests.clear();
        self.finish_requests.clear();
        self.generation += 1;
    }

    pub fn update_identity(&mut self, participant: &ParticipantId, identity: Identity) -> bool {
        match self.occupants.iter_mut().find(|o| &o.id == participant) {
            Some(occupant) => {
                occupant.identity = identity;
                true
            }
            None => false,
        }
    }

    pub fn mark_leaving(&mut self, participant: &ParticipantId) -> bool {
        match self.occupants.iter_mut().find(|o| &o.id == participant) {
            Some(occupant) => {
                occupant.status = DepartureStatus::Leaving;
                true
            }
            None => false,
        }
    }

    pub fn is_leaving(&self, participant: &ParticipantId) -> bool {
        self.occupant(participant).is_some_and(Occupant::is_leaving)
    }

    /// Opens a new round: the host is the first-joined occupant.
    ///
    /// Private rooms open rounds without a start time.
    pub fn open_round(&mut self, started_at: Option<Timestamp>) {
        self.in_progress = true;
        self.generation += 1;
        self.round = RoundState {
            host: self.occupants.first().map(|o| o.id.clone()),
            started_at,
            ..RoundState::default()
        };
        self.rematch_requests.clear();
        self.finish_requests.clear();
    }

    /// ラウンドを閉じる。占有者はそのまま残る。
    pub fn close_round(&mut self) {
        self.in_progress = false;
        self.round = RoundState::default();
        self.finish_requests.clear();
    }

    pub fn set_topic(&mut self, topic: Topic) {
        self.round.topic = Some(topic);
    }

    pub fn round_mut(&mut self) -> &mut RoundState {
        &mut self.round
    }

    /// 再戦希望を記録し、全員がそろったかを返す
    pub fn request_rematch(&mut self, participant: &ParticipantId) -> bool {
        if !self.rematch_requests.contains(participant) {
            self.rematch_requests.push(participant.clone());
        }
        self.occupants
            .iter()
            .all(|o| self.rematch_requests.contains(&o.id))
    }

    pub fn clear_rematch_requests(&mut self) {
        self.rematch_requests.clear();
    }

    pub fn record_finish(&mut self, participant: &ParticipantId) {
        if !self.finish_requests.contains(participant) {
            self.finish_requests.push(participant.clone());
        }
    }
}
