//! WebSocket connection handler: the per-connection session lifecycle.
//!
//! One connection maps to one session driving the state machine
//! Connecting -> Active -> Closing -> Closed. Two tasks serve the Active
//! state: a pusher task draining the session's outbound channel into the
//! socket, and a receive loop feeding inbound frames into the publish
//! usecase. Either task ending aborts the other, which is what makes every
//! in-progress wait cancellable on disconnect.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::{RoomName, ServerFrame, UserName};
use crate::ui::state::AppState;
use crate::usecase::PublishOutcome;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path((room, user)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    // Room and user come verbatim from the path; only emptiness is rejected.
    let room = RoomName::new(room).map_err(|e| {
        tracing::warn!("rejecting connection: {e}");
        StatusCode::BAD_REQUEST
    })?;
    let user = UserName::new(user).map_err(|e| {
        tracing::warn!("rejecting connection: {e}");
        StatusCode::BAD_REQUEST
    })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room, user)))
}

/// Spawns a task that drains the session's outbound channel into the
/// WebSocket sender. Ends when the channel closes or a send fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, room: RoomName, user: UserName) {
    // Connecting -> Active: register, subscribe, mark online, replay history.
    let (tx, rx) = mpsc::unbounded_channel();
    let session_id = match state
        .join_room_usecase
        .execute(room.clone(), user.clone(), tx.clone())
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("'{user}' failed to join '{room}': {e}");
            let frame = ServerFrame::Error {
                message: "room is temporarily unavailable".to_string(),
            };
            let _ = socket.send(Message::Text(frame.encode().into())).await;
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let mut push_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let recv_room = room.clone();
    let recv_user = user.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("websocket error for '{recv_user}': {e}");
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    let outcome = recv_state
                        .publish_message_usecase
                        .execute(&recv_room, &recv_user, text.as_str())
                        .await;
                    match outcome {
                        PublishOutcome::Published(_) => {}
                        PublishOutcome::RateLimited => {
                            // Notice goes to the offending session only; the
                            // message is dropped, not queued.
                            let notice = ServerFrame::Error {
                                message: "Rate limit exceeded!".to_string(),
                            };
                            let _ = tx.send(notice.encode());
                        }
                        PublishOutcome::Rejected(e) => {
                            tracing::debug!("dropped frame from '{recv_user}': {e}");
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::info!("'{recv_user}' requested close");
                    break;
                }
                // Ping/pong handled by the protocol layer; binary ignored.
                _ => {}
            }
        }
    });

    // Active -> Closing: whichever side ends first cancels the other.
    tokio::select! {
        _ = &mut recv_task => push_task.abort(),
        _ = &mut push_task => recv_task.abort(),
    };

    // Closing -> Closed: the presence entry expires via TTL.
    state.leave_room_usecase.execute(&room, session_id).await;
    tracing::info!("'{user}' left room '{room}'");
}
