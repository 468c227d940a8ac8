//! Bounded recent-message cache over a Redis list per room.

use async_trait::async_trait;

use crate::domain::{Message, RecentHistory, RoomName, StoreError};

use super::history_key;

/// `LPUSH` + `LTRIM` composed atomically per room keeps the list at the
/// newest `capacity` entries after every write. `LRANGE` returns them
/// newest-first, matching the in-memory implementation.
pub struct RedisRecentHistory {
    conn: redis::aio::MultiplexedConnection,
    capacity: usize,
}

impl RedisRecentHistory {
    pub fn new(conn: redis::aio::MultiplexedConnection, capacity: usize) -> Self {
        Self { conn, capacity }
    }
}

#[async_trait]
impl RecentHistory for RedisRecentHistory {
    async fn append(&self, message: &Message) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = history_key(&message.room);
        let payload =
            serde_json::to_string(message).map_err(|e| StoreError::Codec(e.to_string()))?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("LPUSH")
            .arg(&key)
            .arg(payload)
            .ignore()
            .cmd("LTRIM")
            .arg(&key)
            .arg(0)
            .arg(self.capacity as i64 - 1)
            .ignore();

        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn recent(&self, room: &RoomName) -> Result<Vec<Message>, StoreError> {
        let mut conn = self.conn.clone();
        let key = history_key(room);

        let raw: Vec<String> = redis::cmd("LRANGE")
            .arg(&key)
            .arg(0)
            .arg(self.capacity as i64 - 1)
            .query_async(&mut conn)
            .await?;

        // Skip undecodable entries instead of failing the replay.
        Ok(raw
            .into_iter()
            .filter_map(|entry| match serde_json::from_str::<Message>(&entry) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!("skipping undecodable history entry in '{room}': {e}");
                    None
                }
            })
            .collect())
    }
}
