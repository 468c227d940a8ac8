//! TTL-backed online roster over a Redis sorted set per room.

use std::time::Duration;

use async_trait::async_trait;

use crate::common::time::now_unix_millis;
use crate::domain::{PresenceTracker, RoomName, StoreError, UserName};

use super::presence_key;

/// Per-user last-seen timestamps as sorted-set scores. Queries purge entries
/// older than the TTL before ranging, so "online" is computed against the
/// score rather than relying on key expiry alone. The whole key expires
/// after twice the TTL so abandoned rooms do not accumulate.
pub struct RedisPresenceTracker {
    conn: redis::aio::MultiplexedConnection,
    ttl: Duration,
}

impl RedisPresenceTracker {
    pub fn new(conn: redis::aio::MultiplexedConnection, ttl: Duration) -> Self {
        Self { conn, ttl }
    }
}

#[async_trait]
impl PresenceTracker for RedisPresenceTracker {
    async fn mark_online(&self, room: &RoomName, user: &UserName) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = presence_key(room);
        let now = now_unix_millis();
        let roster_ttl = (self.ttl.as_secs() * 2).max(1) as i64;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZADD")
            .arg(&key)
            .arg(now)
            .arg(user.as_str())
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(roster_ttl)
            .ignore();

        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn list_online(&self, room: &RoomName) -> Result<Vec<UserName>, StoreError> {
        let mut conn = self.conn.clone();
        let key = presence_key(room);
        let horizon = now_unix_millis() - self.ttl.as_millis() as i64;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(&key)
            .arg(0)
            .arg(horizon)
            .ignore()
            .cmd("ZRANGE")
            .arg(&key)
            .arg(0)
            .arg(-1);

        let (names,): (Vec<String>,) = pipe.query_async(&mut conn).await?;
        Ok(names
            .into_iter()
            .filter_map(|name| UserName::new(name).ok())
            .collect())
    }
}
