//! Ports the relay core depends on.
//!
//! The usecase layer depends on these traits; the infrastructure layer
//! provides the Redis, SQLite and in-memory implementations (dependency
//! inversion, same discipline as the repository traits in the rest of the
//! codebase).

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::{PubSubError, StoreError};
use super::message::{Message, RoomName, UserName};

/// Sliding-window admission control per (room, user).
///
/// `admit` records one send attempt at the current timestamp and decides
/// whether the count of attempts within the trailing window, including this
/// one, is within the ceiling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn admit(&self, room: &RoomName, user: &UserName) -> Result<bool, StoreError>;
}

/// Bounded recent-message cache per room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecentHistory: Send + Sync {
    /// Append a message and trim the room's cache back to its capacity.
    async fn append(&self, message: &Message) -> Result<(), StoreError>;

    /// The most recent messages for a room, newest-first, capped at the
    /// cache capacity. A room with no history yields an empty list.
    async fn recent(&self, room: &RoomName) -> Result<Vec<Message>, StoreError>;
}

/// TTL-backed online roster per room.
///
/// Each mark refreshes the user's last-seen timestamp; "online" is computed
/// at query time as `now - last_seen < ttl`, so a stale entry never outlives
/// its TTL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceTracker: Send + Sync {
    async fn mark_online(&self, room: &RoomName, user: &UserName) -> Result<(), StoreError>;

    async fn list_online(&self, room: &RoomName) -> Result<Vec<UserName>, StoreError>;
}

/// Durable message store. Insert failures are surfaced to the caller so they
/// can be logged; they never block relay of the message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageArchive: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<(), StoreError>;
}

/// Live feed of encoded payloads from one room's channel.
///
/// Dropping the subscription ends the feed; the implementation cleans up its
/// transport resources once its sender side fails.
pub struct RoomSubscription {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl RoomSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<String>) -> Self {
        Self { receiver }
    }

    /// Next payload, or `None` once the feed has ended.
    pub async fn next_payload(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}

/// The external broadcast transport shared by every process serving the same
/// logical deployment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomPubSub: Send + Sync {
    /// Fire-and-forget send of an encoded message to the room's channel.
    async fn publish(&self, room: &RoomName, payload: String) -> Result<(), PubSubError>;

    /// Open a live feed of the room's channel. A new call is expected after
    /// a fatal stream error.
    async fn subscribe(&self, room: &RoomName) -> Result<RoomSubscription, PubSubError>;
}
