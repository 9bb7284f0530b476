//! UseCase layer: one struct per client action.

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod finish_drawing;
pub mod join_room;
pub mod leave_room;
pub mod list_rooms;
pub mod matchmaking;
pub mod propose_topic;
pub mod relay_drawing;
pub mod request_rematch;
pub mod submit_prediction;
pub mod update_identity;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{JoinRoomError, RoomActionError};
pub use finish_drawing::FinishDrawingUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use matchmaking::MatchmakingCoordinator;
pub use propose_topic::ProposeTopicUseCase;
pub use relay_drawing::RelayDrawingUseCase;
pub use request_rematch::RequestRematchUseCase;
pub use submit_prediction::SubmitPredictionUseCase;
pub use update_identity::UpdateIdentityUseCase;
