//! Bounded recent-message cache over in-process ring buffers.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Message, RecentHistory, RoomName, StoreError};

/// Per-room ring of the most recent messages, newest-first.
///
/// Append pushes to the front and truncates to the capacity, so a room's
/// list never exceeds `capacity` after any write.
pub struct InMemoryRecentHistory {
    capacity: usize,
    rooms: Mutex<HashMap<RoomName, VecDeque<Message>>>,
}

impl InMemoryRecentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RecentHistory for InMemoryRecentHistory {
    async fn append(&self, message: &Message) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        let ring = rooms
            .entry(message.room.clone())
            .or_insert_with(VecDeque::new);
        ring.push_front(message.clone());
        ring.truncate(self.capacity);
        Ok(())
    }

    async fn recent(&self, room: &RoomName) -> Result<Vec<Message>, StoreError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .get(room)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default())
    }
}
