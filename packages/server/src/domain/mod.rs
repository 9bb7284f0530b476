//! Domain layer: rooms, rounds and the rules that govern them.

pub mod entity;
pub mod error;
pub mod judgment;
pub mod message_pusher;
pub mod notification;
pub mod registry;
pub mod repository;
pub mod topic;
pub mod value_object;

pub use entity::{
    DEFAULT_ICON, DEFAULT_NAME, DepartureStatus, Identity, Occupant, PredictionSubmission,
    RankedLabel, Room, RoomStatus, RoundState, TopicProposal,
};
pub use error::{JoinRejection, MessagePushError, RepositoryError, ValueObjectError};
pub use judgment::{JudgedEntry, JudgmentResult, Outcome};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notification::Notification;
pub use registry::{
    Eviction, LeaveOutcome, PredictionOutcome, ProposalOutcome, RematchOutcome, RoomClosure,
    RoomRegistry, RoundStart, StartOutcome, TopicResolution, WaitReason,
};
pub use repository::RoomRepository;
pub use topic::{ChosenTopic, TopicCatalog, TopicResolver};
pub use value_object::{ParticipantId, RoomKind, RoomName, Timestamp, Topic};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
