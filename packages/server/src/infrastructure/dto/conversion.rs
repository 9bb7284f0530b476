//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    JudgedEntry, Notification, Occupant, Outcome, RankedLabel, RoomStatus, Topic, TopicProposal,
    ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

/// Sentinel a client sends to ask for a catalog draw.
pub const RANDOM_TOPIC: &str = "RANDOM";

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::RankedLabelDto> for RankedLabel {
    fn from(dto: dto::RankedLabelDto) -> Self {
        RankedLabel::new(dto.label, dto.confidence)
    }
}

/// `propose_topic.topic`: null or `"RANDOM"` asks for a random draw.
pub fn topic_proposal_from_wire(
    topic: Option<String>,
) -> Result<TopicProposal, ValueObjectError> {
    match topic {
        None => Ok(TopicProposal::Random),
        Some(value) if value.trim() == RANDOM_TOPIC => Ok(TopicProposal::Random),
        Some(value) => Topic::new(value).map(TopicProposal::Specific),
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<RankedLabel> for dto::RankedLabelDto {
    fn from(model: RankedLabel) -> Self {
        Self {
            label: model.label,
            confidence: model.confidence,
        }
    }
}

impl From<Occupant> for dto::OccupantDto {
    fn from(model: Occupant) -> Self {
        Self {
            leaving: model.is_leaving(),
            participant_id: model.id.into_string(),
            name: model.identity.name,
            icon: model.identity.icon,
        }
    }
}

impl From<RoomStatus> for dto::RoomStatusDto {
    fn from(model: RoomStatus) -> Self {
        Self {
            room: model.room.into_string(),
            occupants: model.occupants,
            departing: model.departing,
            in_progress: model.in_progress,
        }
    }
}

impl From<JudgedEntry> for dto::JudgedEntryDto {
    fn from(model: JudgedEntry) -> Self {
        Self {
            participant_id: model.participant.into_string(),
            display_name: model.display_name,
            score: model.score,
            top_labels: model.top_labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Notification> for dto::ServerMessage {
    fn from(model: Notification) -> Self {
        match model {
            Notification::Connected { participant } => dto::ServerMessage::Connected {
                participant_id: participant.into_string(),
            },
            Notification::RoomJoined {
                room,
                kind,
                occupants,
            } => dto::ServerMessage::RoomJoined {
                room: room.into_string(),
                kind,
                occupants: occupants.into_iter().map(Into::into).collect(),
            },
            Notification::JoinRoomFailed { room, reason } => dto::ServerMessage::JoinRoomFailed {
                room: room.into_string(),
                reason: reason.reason().to_string(),
            },
            Notification::RoomStatus { rooms, timestamp } => dto::ServerMessage::RoomStatus {
                rooms: rooms.into_iter().map(Into::into).collect(),
                timestamp: timestamp.value(),
            },
            Notification::RoomReady {
                room,
                host,
                peer,
                started_at,
            } => dto::ServerMessage::RoomReady {
                room: room.into_string(),
                host: host.into_string(),
                peer: peer.into(),
                started_at: started_at.value(),
            },
            Notification::TopicChosen {
                room,
                topic,
                chosen_by,
            } => dto::ServerMessage::TopicChosen {
                room: room.into_string(),
                topic: topic.into_string(),
                chosen_by: chosen_by.into_string(),
            },
            Notification::PeerFinished { room, participant } => dto::ServerMessage::PeerFinished {
                room: room.into_string(),
                participant_id: participant.into_string(),
            },
            Notification::PeerDraw {
                room,
                participant,
                data,
            } => dto::ServerMessage::PeerDraw {
                room: room.into_string(),
                participant_id: participant.into_string(),
                data,
            },
            Notification::JudgmentResult(result) => {
                let (outcome, winner) = match result.outcome {
                    Outcome::Winner(winner) => ("winner", Some(winner.into_string())),
                    Outcome::Draw => ("draw", None),
                    Outcome::Solo => ("solo", None),
                };
                dto::ServerMessage::JudgmentResult {
                    room: result.room.into_string(),
                    topic: result.topic.into_string(),
                    outcome: outcome.to_string(),
                    winner,
                    entries: result.entries.into_iter().map(Into::into).collect(),
                }
            }
            Notification::PeerDeparting { room, participant } => {
                dto::ServerMessage::PeerDeparting {
                    room: room.into_string(),
                    participant_id: participant.into_string(),
                }
            }
            Notification::PeerDisconnected { room, participant } => {
                dto::ServerMessage::PeerDisconnected {
                    room: room.into_string(),
                    participant_id: participant.into_string(),
                }
            }
            Notification::RoomClosed { room } => dto::ServerMessage::RoomClosed {
                room: room.into_string(),
            },
            Notification::RematchRequested { room, participant } => {
                dto::ServerMessage::RematchRequested {
                    room: room.into_string(),
                    participant_id: participant.into_string(),
                }
            }
            Notification::LeaveAcknowledged { room, grace_secs } => {
                dto::ServerMessage::LeaveAcknowledged {
                    room: room.into_string(),
                    grace_secs,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Identity, JoinRejection, JudgmentResult, ParticipantId, RoomName, Timestamp,
    };

    fn pid(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_topic_proposal_from_wire() {
        // テスト項目: null と "RANDOM" はランダム、それ以外は指定のお題になる
        // given (前提条件):
        let inputs = [None, Some("RANDOM".to_string()), Some(" cat ".to_string())];

        // when (操作):
        let proposals: Vec<_> = inputs
            .into_iter()
            .map(|topic| topic_proposal_from_wire(topic).unwrap())
            .collect();

        // then (期待する結果):
        assert_eq!(proposals[0], TopicProposal::Random);
        assert_eq!(proposals[1], TopicProposal::Random);
        assert_eq!(
            proposals[2],
            TopicProposal::Specific(Topic::new("cat".to_string()).unwrap())
        );
    }

    #[test]
    fn test_blank_topic_is_rejected() {
        // テスト項目: 空白だけのお題は不正な入力として扱う
        // given (前提条件):
        let topic = Some("   ".to_string());

        // when (操作):
        let result = topic_proposal_from_wire(topic);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::EmptyTopic)));
    }

    #[test]
    fn test_join_rejection_to_dto() {
        // テスト項目: 入室拒否は理由コード付きの DTO に変換される
        // given (前提条件):
        let notification = Notification::JoinRoomFailed {
            room: room("room1"),
            reason: JoinRejection::LeavingInProgress,
        };

        // when (操作):
        let message: dto::ServerMessage = notification.into();

        // then (期待する結果):
        assert_eq!(
            message,
            dto::ServerMessage::JoinRoomFailed {
                room: "room1".to_string(),
                reason: "leaving_in_progress".to_string(),
            }
        );
    }

    #[test]
    fn test_room_ready_to_dto() {
        // テスト項目: マッチング成立通知に相手の名前とアイコンが含まれる
        // given (前提条件):
        let notification = Notification::RoomReady {
            room: room("room2"),
            host: pid("alice"),
            peer: Occupant::new(pid("bob"), Identity::new("Bob", "🐸")),
            started_at: Timestamp::new(1_700_000_000_000),
        };

        // when (操作):
        let message: dto::ServerMessage = notification.into();

        // then (期待する結果):
        let dto::ServerMessage::RoomReady {
            host,
            peer,
            started_at,
            ..
        } = message
        else {
            panic!("unexpected message");
        };
        assert_eq!(host, "alice");
        assert_eq!(peer.participant_id, "bob");
        assert_eq!(peer.name, "Bob");
        assert_eq!(peer.icon, "🐸");
        assert!(!peer.leaving);
        assert_eq!(started_at, 1_700_000_000_000);
    }

    #[test]
    fn test_judgment_result_to_dto() {
        // テスト項目: 判定結果は勝者の ID と上位ラベルを含む DTO に変換される
        // given (前提条件):
        let result = JudgmentResult {
            room: room("room1"),
            topic: Topic::new("cat".to_string()).unwrap(),
            outcome: Outcome::Winner(pid("alice")),
            entries: vec![JudgedEntry {
                participant: pid("alice"),
                display_name: "Alice".to_string(),
                score: 0.8,
                top_labels: vec![RankedLabel::new("cat", 0.8)],
            }],
        };

        // when (操作):
        let message: dto::ServerMessage = Notification::JudgmentResult(result).into();
        let json = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "judgment_result");
        assert_eq!(json["outcome"], "winner");
        assert_eq!(json["winner"], "alice");
        assert_eq!(json["entries"][0]["top_labels"][0]["label"], "cat");
    }

    #[test]
    fn test_draw_has_no_winner() {
        // テスト項目: 引き分けでは winner が null になる
        // given (前提条件):
        let result = JudgmentResult {
            room: room("room1"),
            topic: Topic::new("cat".to_string()).unwrap(),
            outcome: Outcome::Draw,
            entries: Vec::new(),
        };

        // when (操作):
        let message: dto::ServerMessage = Notification::JudgmentResult(result).into();

        // then (期待する結果):
        match message {
            dto::ServerMessage::JudgmentResult {
                outcome, winner, ..
            } => {
                assert_eq!(outcome, "draw");
                assert_eq!(winner, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
