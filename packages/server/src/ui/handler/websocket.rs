//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    domain::{Identity, ParticipantId, PredictionSubmission, RoomName, Topic, ValueObjectError},
    infrastructure::dto::{conversion::topic_proposal_from_wire, websocket::ClientMessage},
    ui::state::AppState,
    usecase::{JoinRoomError, RoomActionError},
};

/// Why an inbound frame produced no effect.
#[derive(Debug, Error)]
enum DispatchError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] ValueObjectError),

    #[error(transparent)]
    Stale(#[from] RoomActionError),

    #[error(transparent)]
    Join(#[from] JoinRoomError),
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for messages addressed to this participant
/// * `sender` - WebSocket sink to send messages to this participant
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this participant to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // ID の発行、登録、connected / room_status の送信は UseCase が行う
    let participant = state.connect_participant_usecase.execute(tx).await;

    let participant_for_recv = participant.clone();
    let state_clone = state.clone();

    // Spawn a task to receive messages from this participant
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", participant_for_recv, text);

                    let message = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping unparsable message from '{}': {}",
                                participant_for_recv,
                                e
                            );
                            continue;
                        }
                    };

                    match dispatch(&state_clone, &participant_for_recv, message).await {
                        Ok(()) => {}
                        Err(DispatchError::Malformed(e)) => {
                            tracing::warn!(
                                "Dropping malformed message from '{}': {}",
                                participant_for_recv,
                                e
                            );
                        }
                        Err(DispatchError::Stale(e)) => {
                            tracing::debug!(
                                "Ignoring request from '{}': {}",
                                participant_for_recv,
                                e
                            );
                        }
                        Err(DispatchError::Join(e)) => {
                            // join_room_failed は UseCase が送信済み
                            tracing::debug!("Join by '{}' failed: {}", participant_for_recv, e);
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Participant '{}' requested close", participant_for_recv);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward pushed notifications to this participant
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let evictions = state.disconnect_participant_usecase.execute(&participant).await;
    tracing::info!(
        "Participant '{}' disconnected, vacated {} room(s)",
        participant,
        evictions.len()
    );
}

/// Route one inbound message to its use case.
async fn dispatch(
    state: &AppState,
    participant: &ParticipantId,
    message: ClientMessage,
) -> Result<(), DispatchError> {
    match message {
        ClientMessage::Join {
            room,
            kind,
            name,
            icon,
        } => {
            let room = room.map(RoomName::new).transpose()?;
            state
                .join_room_usecase
                .execute(participant, room, kind, Identity::new(name, icon))
                .await?;
        }
        ClientMessage::UpdateIdentity { room, name, icon } => {
            state
                .update_identity_usecase
                .execute(participant, &RoomName::new(room)?, Identity::new(name, icon))
                .await?;
        }
        ClientMessage::ProposeTopic { room, topic } => {
            let room = RoomName::new(room)?;
            let proposal = topic_proposal_from_wire(topic)?;
            state
                .propose_topic_usecase
                .execute(participant, &room, proposal)
                .await?;
        }
        ClientMessage::SubmitPrediction {
            room,
            results,
            target_topic,
            display_name,
        } => {
            let room = RoomName::new(room)?;
            let submission = PredictionSubmission {
                ranked_labels: results.into_iter().map(Into::into).collect(),
                target_topic: Topic::new(target_topic)?,
                display_name,
            };
            state
                .submit_prediction_usecase
                .execute(participant, &room, submission)
                .await?;
        }
        ClientMessage::RequestRematch { room } => {
            state
                .request_rematch_usecase
                .execute(participant, &RoomName::new(room)?)
                .await?;
        }
        ClientMessage::FinishDrawing { room } => {
            state
                .finish_drawing_usecase
                .execute(participant, &RoomName::new(room)?)
                .await?;
        }
        ClientMessage::Draw { room, data } => {
            state
                .relay_drawing_usecase
                .execute(participant, &RoomName::new(room)?, data)
                .await?;
        }
        ClientMessage::Leave { room } => {
            state
                .leave_room_usecase
                .begin(participant, &RoomName::new(room)?)
                .await?;
        }
        ClientMessage::LeaveConfirmed => {
            if state.leave_room_usecase.confirm(participant).await.is_none() {
                tracing::debug!("'{}' confirmed a leave it never started", participant);
            }
        }
        ClientMessage::ListRooms => {
            state.list_rooms_usecase.send_to(participant).await;
        }
    }
    Ok(())
}
