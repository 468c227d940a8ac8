//! UseCase: bring a new connection from Connecting to Active.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::{PresenceTracker, RecentHistory, RoomName, ServerFrame, UserName};
use crate::infrastructure::fanout::{RoomBroadcastBridge, SessionId, SessionManager};

use super::error::JoinError;

pub struct JoinRoomUseCase {
    sessions: Arc<SessionManager>,
    bridge: Arc<RoomBroadcastBridge>,
    presence: Arc<dyn PresenceTracker>,
    history: Arc<dyn RecentHistory>,
    store_timeout: Duration,
}

impl JoinRoomUseCase {
    pub fn new(
        sessions: Arc<SessionManager>,
        bridge: Arc<RoomBroadcastBridge>,
        presence: Arc<dyn PresenceTracker>,
        history: Arc<dyn RecentHistory>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            bridge,
            presence,
            history,
            store_timeout,
        }
    }

    /// Register the session, ensure the room's broadcast subscription is
    /// running, mark the user online and replay recent history.
    ///
    /// The subscription is the only step that can fail the join: without it
    /// the session would silently miss messages. Presence and history are
    /// best-effort.
    pub async fn execute(
        &self,
        room: RoomName,
        user: UserName,
        sender: mpsc::UnboundedSender<String>,
    ) -> Result<SessionId, JoinError> {
        let id = self
            .sessions
            .register(room.clone(), user.clone(), sender.clone())
            .await;

        if let Err(e) = self.bridge.retain(&room).await {
            self.sessions.unregister(&room, id).await;
            return Err(JoinError::Subscribe(e));
        }

        match tokio::time::timeout(self.store_timeout, self.presence.mark_online(&room, &user))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("failed to mark '{user}' online in '{room}': {e}"),
            Err(_) => tracing::warn!("presence store timed out marking '{user}' in '{room}'"),
        }

        let messages =
            match tokio::time::timeout(self.store_timeout, self.history.recent(&room)).await {
                Ok(Ok(messages)) => messages,
                Ok(Err(e)) => {
                    tracing::warn!("failed to load history for '{room}': {e}");
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!("history store timed out for '{room}'");
                    Vec::new()
                }
            };
        // The session may already be gone; a failed replay is its problem.
        let _ = sender.send(ServerFrame::History { messages }.encode());

        tracing::info!("'{user}' joined room '{room}'");
        Ok(id)
    }
}
