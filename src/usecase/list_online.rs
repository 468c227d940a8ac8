//! UseCase: the ancillary online-roster lookup.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{PresenceTracker, RoomName, UserName};

pub struct ListOnlineUseCase {
    presence: Arc<dyn PresenceTracker>,
    store_timeout: Duration,
}

impl ListOnlineUseCase {
    pub fn new(presence: Arc<dyn PresenceTracker>, store_timeout: Duration) -> Self {
        Self {
            presence,
            store_timeout,
        }
    }

    /// Users currently online in the room. Presence is best-effort: a store
    /// failure degrades to an empty roster instead of a hard error.
    pub async fn execute(&self, room: &RoomName) -> Vec<UserName> {
        match tokio::time::timeout(self.store_timeout, self.presence.list_online(room)).await {
            Ok(Ok(online)) => online,
            Ok(Err(e)) => {
                tracing::warn!("failed to list online users for '{room}': {e}");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!("presence store timed out listing '{room}'");
                Vec::new()
            }
        }
    }
}
