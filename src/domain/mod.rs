//! Domain models, wire frames and the ports the relay core depends on.
//!
//! The concrete implementations of the ports (Redis, SQLite, in-memory)
//! live in the infrastructure layer; the usecase layer depends only on the
//! traits defined here.

pub mod error;
pub mod frame;
pub mod message;
pub mod service;

pub use error::{DomainError, PubSubError, StoreError};
pub use frame::{ClientFrame, ServerFrame};
pub use message::{Message, MessageContent, RoomName, UserName};
pub use service::{
    MessageArchive, PresenceTracker, RateLimiter, RecentHistory, RoomPubSub, RoomSubscription,
};

#[cfg(test)]
pub use service::{
    MockMessageArchive, MockPresenceTracker, MockRateLimiter, MockRecentHistory, MockRoomPubSub,
};
