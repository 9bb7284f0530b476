//! Server state and composition of the use cases.

use std::sync::Arc;

use rakugaki_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, RoomRepository, TopicResolver},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, FinishDrawingUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, ListRoomsUseCase, MatchmakingCoordinator,
        ProposeTopicUseCase, RelayDrawingUseCase, RequestRematchUseCase,
        SubmitPredictionUseCase, UpdateIdentityUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub clock: Arc<dyn Clock>,
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub update_identity_usecase: Arc<UpdateIdentityUseCase>,
    pub propose_topic_usecase: Arc<ProposeTopicUseCase>,
    pub submit_prediction_usecase: Arc<SubmitPredictionUseCase>,
    pub request_rematch_usecase: Arc<RequestRematchUseCase>,
    pub finish_drawing_usecase: Arc<FinishDrawingUseCase>,
    pub relay_drawing_usecase: Arc<RelayDrawingUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
}

impl AppState {
    /// Wire every use case onto the given repository and pusher.
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        resolver: Arc<TopicResolver>,
        config: &ServerConfig,
    ) -> Self {
        let matchmaking = Arc::new(MatchmakingCoordinator::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
            config.matchmaking_retry,
            config.matchmaking_max_attempts,
        ));

        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
                matchmaking.clone(),
            )),
            update_identity_usecase: Arc::new(UpdateIdentityUseCase::new(
                repository.clone(),
                matchmaking.clone(),
            )),
            propose_topic_usecase: Arc::new(ProposeTopicUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                resolver,
                config.topic_timeout,
            )),
            submit_prediction_usecase: Arc::new(SubmitPredictionUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            request_rematch_usecase: Arc::new(RequestRematchUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                matchmaking,
            )),
            finish_drawing_usecase: Arc::new(FinishDrawingUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            relay_drawing_usecase: Arc::new(RelayDrawingUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
                config.leave_grace,
            )),
            list_rooms_usecase: Arc::new(ListRoomsUseCase::new(
                repository,
                message_pusher,
                clock.clone(),
            )),
            clock,
        }
    }
}
