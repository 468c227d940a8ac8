//! Sliding-window rate limiter over a Redis sorted set per (room, user).

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::time::now_unix_millis;
use crate::domain::{RateLimiter, RoomName, StoreError, UserName};

use super::rate_key;

/// Each send attempt becomes one member of the key's sorted set, scored by
/// its timestamp. The purge, the insert and the count run in one atomic
/// pipeline so two concurrent senders can never both observe an under-limit
/// count. The key expires after a full idle window.
pub struct RedisRateLimiter {
    conn: redis::aio::MultiplexedConnection,
    window: Duration,
    max_events: usize,
}

impl RedisRateLimiter {
    pub fn new(
        conn: redis::aio::MultiplexedConnection,
        window: Duration,
        max_events: usize,
    ) -> Self {
        Self {
            conn,
            window,
            max_events,
        }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn admit(&self, room: &RoomName, user: &UserName) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let key = rate_key(room, user);
        let now = now_unix_millis();
        let horizon = now - self.window.as_millis() as i64;
        // Member must be unique per event, not per millisecond.
        let member = format!("{now}-{}", Uuid::new_v4());
        let idle_ttl = self.window.as_secs().max(1) as i64;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(&key)
            .arg(0)
            .arg(horizon)
            .ignore()
            .cmd("ZADD")
            .arg(&key)
            .arg(now)
            .arg(&member)
            .ignore()
            .cmd("ZCARD")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(idle_ttl)
            .ignore();

        let (count,): (i64,) = pipe.query_async(&mut conn).await?;
        Ok(count as usize <= self.max_events)
    }
}
