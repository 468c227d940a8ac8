//! Process-local registry of live sessions grouped by room.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::domain::{Message, RoomName, ServerFrame, UserName};

/// Identifier of one registered session within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

struct SessionHandle {
    user: UserName,
    sender: mpsc::UnboundedSender<String>,
}

/// Owns the room -> sessions mapping and performs local broadcast.
///
/// The mapping is process-local, never persisted, and rebuilt from scratch on
/// restart. All mutation and the snapshot used for delivery go through one
/// async mutex, so delivery never observes a partially updated session set.
pub struct SessionManager {
    echo_to_sender: bool,
    rooms: Mutex<HashMap<RoomName, HashMap<SessionId, SessionHandle>>>,
}

impl SessionManager {
    pub fn new(echo_to_sender: bool) -> Self {
        Self {
            echo_to_sender,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Register a session's outbound channel into its room.
    pub async fn register(
        &self,
        room: RoomName,
        user: UserName,
        sender: mpsc::UnboundedSender<String>,
    ) -> SessionId {
        let id = SessionId(Uuid::new_v4());
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room.clone())
            .or_insert_with(HashMap::new)
            .insert(id, SessionHandle { user, sender });
        tracing::debug!("session {:?} registered in room '{room}'", id.0);
        id
    }

    /// Remove a session from its room; the room entry itself disappears with
    /// its last session.
    pub async fn unregister(&self, room: &RoomName, id: SessionId) {
        let mut rooms = self.rooms.lock().await;
        if let Some(sessions) = rooms.get_mut(room) {
            sessions.remove(&id);
            if sessions.is_empty() {
                rooms.remove(room);
            }
        }
        tracing::debug!("session {:?} unregistered from room '{room}'", id.0);
    }

    /// Number of live sessions currently registered in a room.
    pub async fn session_count(&self, room: &RoomName) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(|sessions| sessions.len()).unwrap_or(0)
    }

    /// Deliver a message to every session registered in its room.
    ///
    /// A failed delivery (connection already closed) evicts that session and
    /// never aborts delivery to the rest. When echo is disabled, the
    /// publishing user's own sessions are skipped.
    pub async fn broadcast_local(&self, room: &RoomName, message: &Message) {
        let frame = ServerFrame::Chat {
            message: message.clone(),
        }
        .encode();

        let mut rooms = self.rooms.lock().await;
        let Some(sessions) = rooms.get_mut(room) else {
            return;
        };

        let mut dead = Vec::new();
        for (id, handle) in sessions.iter() {
            if !self.echo_to_sender && handle.user == message.user {
                continue;
            }
            if handle.sender.send(frame.clone()).is_err() {
                dead.push(*id);
            }
        }

        for id in dead {
            sessions.remove(&id);
            tracing::warn!("dropped closed session {:?} from room '{room}'", id.0);
        }
        if sessions.is_empty() {
            rooms.remove(room);
        }
    }
}
