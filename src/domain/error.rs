//! Error types shared across the domain and infrastructure layers.

use thiserror::Error;

/// Validation failure for externally supplied values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("user name must not be empty")]
    EmptyUserName,

    #[error("message content must not be empty")]
    EmptyContent,

    #[error("message content exceeds {max} bytes")]
    ContentTooLong { max: usize },
}

/// Transient failure talking to a backing store (rate counters, recent
/// history, presence roster or the durable archive).
///
/// No store error is fatal to a session; each operation applies its own
/// failure policy (fail open/closed for admission, log-and-continue for the
/// rest).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out")]
    Timeout,

    #[error("codec error: {0}")]
    Codec(String),
}

/// Failure on the external pub/sub channel.
#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("failed to connect to pub/sub transport: {0}")]
    Connection(String),

    #[error("publish failed: {0}")]
    PublishFailed(String),

    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
}
