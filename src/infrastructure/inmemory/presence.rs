//! TTL-backed online roster over in-process maps.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{PresenceTracker, RoomName, StoreError, UserName};

/// Per-room map of user to last-seen instant.
///
/// "Online" is computed at query time as `now - last_seen < ttl`; expired
/// entries are purged on each query so no entry outlives its TTL without a
/// refresh.
pub struct InMemoryPresenceTracker {
    ttl: Duration,
    rooms: Mutex<HashMap<RoomName, HashMap<UserName, Instant>>>,
}

impl InMemoryPresenceTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PresenceTracker for InMemoryPresenceTracker {
    async fn mark_online(&self, room: &RoomName, user: &UserName) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room.clone())
            .or_insert_with(HashMap::new)
            .insert(user.clone(), Instant::now());
        Ok(())
    }

    async fn list_online(&self, room: &RoomName) -> Result<Vec<UserName>, StoreError> {
        let now = Instant::now();
        let mut rooms = self.rooms.lock().await;
        let Some(roster) = rooms.get_mut(room) else {
            return Ok(Vec::new());
        };

        roster.retain(|_, last_seen| now.duration_since(*last_seen) < self.ttl);
        if roster.is_empty() {
            rooms.remove(room);
            return Ok(Vec::new());
        }

        let mut online: Vec<UserName> = roster.keys().cloned().collect();
        online.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(online)
    }
}
