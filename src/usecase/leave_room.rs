//! UseCase: tear one session down from Closing to Closed.

use std::sync::Arc;

use crate::domain::RoomName;
use crate::infrastructure::fanout::{RoomBroadcastBridge, SessionId, SessionManager};

pub struct LeaveRoomUseCase {
    sessions: Arc<SessionManager>,
    bridge: Arc<RoomBroadcastBridge>,
}

impl LeaveRoomUseCase {
    pub fn new(sessions: Arc<SessionManager>, bridge: Arc<RoomBroadcastBridge>) -> Self {
        Self { sessions, bridge }
    }

    /// Unregister the session and drop its claim on the room subscription.
    /// The presence entry is left to expire through its TTL.
    pub async fn execute(&self, room: &RoomName, id: SessionId) {
        self.sessions.unregister(room, id).await;
        self.bridge.release(room).await;
    }
}
