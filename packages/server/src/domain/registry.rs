//! Session registry: the authoritative map of rooms and their transient state.
//!
//! Every method here is synchronous and performs its whole check-and-mutate
//! step at once. The repository wraps the registry in a single mutex, so an
//! outcome such as "both predictions are in, here is the result" is decided
//! and the triggering state purged in the same step.

use std::collections::HashMap;

use super::{
    entity::{Identity, Occupant, PredictionSubmission, Room, RoomStatus, TopicProposal},
    error::{JoinRejection, RepositoryError},
    judgment::{JudgmentResult, judge},
    topic::{ChosenTopic, TopicResolver},
    value_object::{ParticipantId, RoomKind, RoomName, Timestamp},
};

/// A room a participant was removed from by [`RoomRegistry::evict_participant`].
#[derive(Debug, Clone, PartialEq)]
pub struct Eviction {
    pub room: RoomName,
    pub kind: RoomKind,
    /// Occupants left behind (the room itself has been cleared).
    pub remaining: Vec<ParticipantId>,
    pub was_leaving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    IncompleteIdentity,
    DepartureInProgress,
}

/// マッチング成立時の情報
#[derive(Debug, Clone, PartialEq)]
pub struct RoundStart {
    pub room: RoomName,
    pub host: ParticipantId,
    pub started_at: Timestamp,
    /// 入室順の占有者（名前・アイコン込み）
    pub seats: Vec<Occupant>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started(RoundStart),
    AlreadyInProgress,
    /// 一時的に条件を満たしていない。少し待って再試行する。
    Waiting {
        reason: WaitReason,
        generation: u64,
    },
    /// ルームが消えた・人数が足りない・世代が変わった
    Abandoned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicResolution {
    pub room: RoomName,
    pub chosen: ChosenTopic,
    pub recipients: Vec<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProposalOutcome {
    Pending { generation: u64 },
    Resolved(TopicResolution),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Pending,
    Judged {
        result: JudgmentResult,
        recipients: Vec<ParticipantId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RematchOutcome {
    pub peers: Vec<ParticipantId>,
    /// 全員が再戦を希望し、ラウンドがリセットされた
    pub agreed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// 相手が残っているので退出中になった。完了通知か猶予切れでクリアされる。
    Departing {
        peers: Vec<ParticipantId>,
        generation: u64,
    },
    /// 待つ相手がいないので即座に退出し、ルームはクリアされた。
    /// `abandoned` は退出中のまま残っていた占有者で、`room_closed` の宛先になる。
    Left { abandoned: Vec<ParticipantId> },
    PrivateRoomClosed,
}

/// A shared room cleared at the end of a departure.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomClosure {
    pub room: RoomName,
    pub remaining: Vec<ParticipantId>,
}

/// Session Registry
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    shared_rooms: Vec<RoomName>,
    rooms: HashMap<RoomName, Room>,
}

impl RoomRegistry {
    /// 共有ルームのプールを作成する（重複した名前は 1 つにまとめる）
    pub fn new(shared_room_names: Vec<RoomName>) -> Self {
        let mut shared_rooms: Vec<RoomName> = Vec::new();
        for name in shared_room_names {
            if !shared_rooms.contains(&name) {
                shared_rooms.push(name);
            }
        }
        let rooms = shared_rooms
            .iter()
            .map(|name| (name.clone(), Room::new(name.clone(), RoomKind::Shared)))
            .collect();
        Self {
            shared_rooms,
            rooms,
        }
    }

    pub fn room(&self, name: &RoomName) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub fn shared_room_names(&self) -> &[RoomName] {
        &self.shared_rooms
    }

    /// Names of every room the participant currently occupies.
    pub fn rooms_of(&self, participant: &ParticipantId) -> Vec<RoomName> {
        self.rooms
            .values()
            .filter(|room| room.contains(participant))
            .map(|room| room.name().clone())
            .collect()
    }

    /// 共有ルームごとの人数（ID は含めない）
    pub fn room_status(&self) -> Vec<RoomStatus> {
        self.shared_rooms
            .iter()
            .filter_map(|name| self.rooms.get(name))
            .map(Room::status)
            .collect()
    }

    /// 入室。拒否した場合は状態を一切変更しない。
    pub fn add_occupant(
        &mut self,
        room: &RoomName,
        kind: RoomKind,
        participant: &ParticipantId,
        identity: Identity,
    ) -> Result<(), JoinRejection> {
        if kind.is_private() {
            if room != &RoomName::private_for(kind, participant) {
                return Err(JoinRejection::PrivateRoomDenied);
            }
            if self.rooms.get(room).is_some_and(|r| !r.is_empty()) {
                return Err(JoinRejection::PrivateRoomOccupied);
            }
            let mut private = Room::new(room.clone(), kind);
            private.add_occupant(participant.clone(), identity)?;
            self.rooms.insert(room.clone(), private);
            return Ok(());
        }

        if !self.rooms.get(room).is_some_and(|r| r.kind() == RoomKind::Shared) {
            return Err(JoinRejection::UnknownRoom);
        }
        // 共有ルームには同時に 1 つしか座れない
        let seated_elsewhere = self.rooms.values().any(|r| {
            r.kind() == RoomKind::Shared && r.name() != room && r.contains(participant)
        });
        if seated_elsewhere {
            return Err(JoinRejection::AlreadyJoined);
        }

        let shared = self.rooms.get_mut(room).ok_or(JoinRejection::UnknownRoom)?;
        shared.add_occupant(participant.clone(), identity)
    }

    /// 退室。存在しなければ `false` を返すだけ。空になったルームはクリアする。
    pub fn remove_occupant(&mut self, room: &RoomName, participant: &ParticipantId) -> bool {
        let Some(target) = self.rooms.get_mut(room) else {
            return false;
        };
        if !target.remove_occupant(participant) {
            return false;
        }
        if target.is_empty() {
            self.clear_room(room);
        }
        true
    }

    /// 共有ルームは初期化し、専用ルームは削除する
    pub fn clear_room(&mut self, room: &RoomName) -> bool {
        match self.rooms.get_mut(room) {
            Some(target) if target.kind().is_private() => {
                self.rooms.remove(room);
                true
            }
            Some(target) => {
                target.clear();
                true
            }
            None => false,
        }
    }

    /// Removes the participant from every room it occupies.
    ///
    /// Shared rooms left behind are cleared, private rooms deleted.
    pub fn evict_participant(&mut self, participant: &ParticipantId) -> Vec<Eviction> {
        let mut evictions = Vec::new();
        for name in self.rooms_of(participant) {
            let Some(room) = self.rooms.get(&name) else {
                continue;
            };
            let eviction = Eviction {
                room: name.clone(),
                kind: room.kind(),
                remaining: room.peers_of(participant),
                was_leaving: room.is_leaving(participant),
            };
            self.clear_room(&name);
            evictions.push(eviction);
        }
        evictions
    }

    pub fn update_identity(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
        identity: Identity,
    ) -> Result<(), RepositoryError> {
        let target = self.room_mut(room)?;
        if target.update_identity(participant, identity) {
            Ok(())
        } else {
            Err(not_an_occupant(room, participant))
        }
    }

    /// waiting → ready の遷移を試みる
    ///
    /// `expected_generation` を渡した場合、世代が変わっていれば何もしない。
    pub fn try_start_round(
        &mut self,
        room: &RoomName,
        expected_generation: Option<u64>,
        started_at: Timestamp,
    ) -> StartOutcome {
        let Some(target) = self.rooms.get_mut(room) else {
            return StartOutcome::Abandoned;
        };
        if target.kind().is_private() {
            return StartOutcome::Abandoned;
        }
        if let Some(expected) = expected_generation
            && expected != target.generation()
        {
            return StartOutcome::Abandoned;
        }
        if target.in_progress() {
            return StartOutcome::AlreadyInProgress;
        }
        if target.occupants().len() != RoomKind::Shared.capacity() {
            return StartOutcome::Abandoned;
        }
        if target.has_leaving() {
            return StartOutcome::Waiting {
                reason: WaitReason::DepartureInProgress,
                generation: target.generation(),
            };
        }
        if !target.occupants().iter().all(|o| o.identity.is_complete()) {
            return StartOutcome::Waiting {
                reason: WaitReason::IncompleteIdentity,
                generation: target.generation(),
            };
        }

        target.open_round(Some(started_at));
        let seats = target.occupants().to_vec();
        StartOutcome::Started(RoundStart {
            room: room.clone(),
            host: seats[0].id.clone(),
            started_at,
            seats,
        })
    }

    /// お題の提案を記録し、そろっていれば 1 つに決める
    pub fn record_topic_proposal(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
        proposal: TopicProposal,
        resolver: &TopicResolver,
    ) -> Result<ProposalOutcome, RepositoryError> {
        let target = self.occupied_room_mut(room, participant)?;

        if target.kind().is_private() {
            let chosen = resolver
                .resolve(vec![(participant.clone(), proposal)])
                .ok_or_else(|| RepositoryError::RoundNotOpen(room.to_string()))?;
            target.open_round(None);
            target.set_topic(chosen.topic.clone());
            return Ok(ProposalOutcome::Resolved(TopicResolution {
                room: room.clone(),
                chosen,
                recipients: target.occupant_ids(),
            }));
        }

        if !target.in_progress() || target.round().topic.is_some() {
            return Err(RepositoryError::RoundNotOpen(room.to_string()));
        }

        let round = target.round_mut();
        round.proposals.retain(|(id, _)| id != participant);
        round.proposals.push((participant.clone(), proposal));
        if target.round().proposals.len() < target.occupants().len() {
            return Ok(ProposalOutcome::Pending {
                generation: target.generation(),
            });
        }

        Self::resolve_pending_topic(target, resolver)
            .map(ProposalOutcome::Resolved)
            .ok_or_else(|| RepositoryError::RoundNotOpen(room.to_string()))
    }

    /// 片方しか提案しないまま待ち時間が過ぎた場合、その提案を採用する
    pub fn resolve_lone_proposal(
        &mut self,
        room: &RoomName,
        generation: u64,
        resolver: &TopicResolver,
    ) -> Option<TopicResolution> {
        let target = self.rooms.get_mut(room)?;
        if target.generation() != generation
            || !target.in_progress()
            || target.round().topic.is_some()
            || target.round().proposals.is_empty()
        {
            return None;
        }
        Self::resolve_pending_topic(target, resolver)
    }

    fn resolve_pending_topic(
        target: &mut Room,
        resolver: &TopicResolver,
    ) -> Option<TopicResolution> {
        let proposals = std::mem::take(&mut target.round_mut().proposals);
        let chosen = resolver.resolve(proposals)?;
        target.set_topic(chosen.topic.clone());
        Some(TopicResolution {
            room: target.name().clone(),
            chosen,
            recipients: target.occupant_ids(),
        })
    }

    /// 予測結果を記録し、全員分そろったら判定してラウンドを閉じる
    pub fn record_prediction(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
        submission: PredictionSubmission,
    ) -> Result<PredictionOutcome, RepositoryError> {
        let target = self.occupied_room_mut(room, participant)?;
        if !target.in_progress() {
            return Err(RepositoryError::RoundNotOpen(room.to_string()));
        }

        let topic = target
            .round()
            .topic
            .clone()
            .unwrap_or_else(|| submission.target_topic.clone());
        target
            .round_mut()
            .judgments
            .insert(participant.clone(), submission);

        let order = target.occupant_ids();
        if !order
            .iter()
            .all(|id| target.round().judgments.contains_key(id))
        {
            return Ok(PredictionOutcome::Pending);
        }

        let mut judgments = std::mem::take(&mut target.round_mut().judgments);
        let submissions = target
            .occupants()
            .iter()
            .filter_map(|occupant| {
                let mut submission = judgments.remove(&occupant.id)?;
                if submission.display_name.trim().is_empty() {
                    submission.display_name = occupant.identity.name.clone();
                }
                Some((occupant.id.clone(), submission))
            })
            .collect();
        let result = judge(room.clone(), topic, submissions);
        target.close_round();

        Ok(PredictionOutcome::Judged {
            result,
            recipients: order,
        })
    }

    pub fn record_rematch_request(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<RematchOutcome, RepositoryError> {
        let target = self.occupied_room_mut(room, participant)?;
        if target.kind().is_private() {
            return Err(RepositoryError::UnsupportedRoomKind(room.to_string()));
        }

        let everyone = target.request_rematch(participant);
        let agreed = everyone && target.occupants().len() == RoomKind::Shared.capacity();
        if agreed {
            target.clear_rematch_requests();
            target.close_round();
        }
        Ok(RematchOutcome {
            peers: target.peers_of(participant),
            agreed,
        })
    }

    /// 描き終わりを記録し、通知先（相手）を返す
    pub fn record_finish(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<Vec<ParticipantId>, RepositoryError> {
        let target = self.occupied_room_mut(room, participant)?;
        target.record_finish(participant);
        Ok(target.peers_of(participant))
    }

    pub fn peers_of(
        &self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<Vec<ParticipantId>, RepositoryError> {
        let target = self
            .rooms
            .get(room)
            .ok_or_else(|| RepositoryError::RoomNotFound(room.to_string()))?;
        if !target.contains(participant) {
            return Err(not_an_occupant(room, participant));
        }
        Ok(target.peers_of(participant))
    }

    /// 退出の申し出（1 段階目）
    pub fn begin_leave(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<LeaveOutcome, RepositoryError> {
        let target = self.occupied_room_mut(room, participant)?;
        if target.kind().is_private() {
            self.rooms.remove(room);
            return Ok(LeaveOutcome::PrivateRoomClosed);
        }
        if target.is_leaving(participant) {
            return Err(RepositoryError::AlreadyLeaving(participant.to_string()));
        }

        let present_peers: Vec<ParticipantId> = target
            .occupants()
            .iter()
            .filter(|o| &o.id != participant && !o.is_leaving())
            .map(|o| o.id.clone())
            .collect();

        if present_peers.is_empty() {
            // 残るのは退出中の占有者だけなので、待たずにクリアする
            let abandoned = target.peers_of(participant);
            self.remove_occupant(room, participant);
            if !abandoned.is_empty() {
                self.clear_room(room);
            }
            return Ok(LeaveOutcome::Left { abandoned });
        }

        target.mark_leaving(participant);
        target.close_round();
        target.clear_rematch_requests();
        Ok(LeaveOutcome::Departing {
            peers: present_peers,
            generation: target.generation(),
        })
    }

    /// 退出完了の通知（2 段階目）。退出中のルームをクリアする。
    pub fn confirm_leave(&mut self, participant: &ParticipantId) -> Option<RoomClosure> {
        let room = self
            .rooms
            .values()
            .find(|r| r.kind() == RoomKind::Shared && r.is_leaving(participant))
            .map(|r| r.name().clone())?;
        self.close_departed_room(&room, participant)
    }

    /// 猶予時間切れ。世代が同じで、まだ退出中ならクリアする。
    pub fn expire_leave(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
        generation: u64,
    ) -> Option<RoomClosure> {
        let target = self.rooms.get(room)?;
        if target.generation() != generation || !target.is_leaving(participant) {
            return None;
        }
        self.close_departed_room(room, participant)
    }

    fn close_departed_room(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Option<RoomClosure> {
        let remaining = self.rooms.get(room)?.peers_of(participant);
        self.clear_room(room);
        Some(RoomClosure {
            room: room.clone(),
            remaining,
        })
    }

    fn room_mut(&mut self, room: &RoomName) -> Result<&mut Room, RepositoryError> {
        self.rooms
            .get_mut(room)
            .ok_or_else(|| RepositoryError::RoomNotFound(room.to_string()))
    }

    fn occupied_room_mut(
        &mut self,
        room: &RoomName,
        participant: &ParticipantId,
    ) -> Result<&mut Room, RepositoryError> {
        let target = self.room_mut(room)?;
        if !target.contains(participant) {
            return Err(not_an_occupant(room, participant));
        }
        Ok(target)
    }
}

fn not_an_occupant(room: &RoomName, participant: &ParticipantId) -> RepositoryError {
    RepositoryError::NotAnOccupant {
        room: room.to_string(),
        participant: participant.to_string(),
    }
}
