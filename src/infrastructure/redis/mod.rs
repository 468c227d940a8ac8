//! Redis-backed implementations of the backing-store ports.
//!
//! These are the coordination surface across server processes sharing one
//! logical deployment: rate counters, recent history and presence live in
//! Redis key space, and rooms exist only as keys there. Every multi-step
//! operation is composed as one atomic `MULTI`/`EXEC` pipeline so concurrent
//! senders in the same room never lose updates.

mod history;
mod presence;
mod pubsub;
mod rate_limiter;

pub use history::RedisRecentHistory;
pub use presence::RedisPresenceTracker;
pub use pubsub::RedisRoomPubSub;
pub use rate_limiter::RedisRateLimiter;

use crate::domain::{RoomName, StoreError, UserName};

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

pub(crate) fn rate_key(room: &RoomName, user: &UserName) -> String {
    format!("rl:{room}:{user}")
}

pub(crate) fn history_key(room: &RoomName) -> String {
    format!("recent:{room}")
}

pub(crate) fn presence_key(room: &RoomName) -> String {
    format!("online:{room}")
}

pub(crate) fn channel_key(room: &RoomName) -> String {
    format!("chat:{room}")
}
