//! Core message model and validated value objects.

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use crate::common::time::now_unix_millis;

/// Upper bound on chat content, in bytes.
pub const MAX_CONTENT_LEN: usize = 4096;

/// A named broadcast domain. The core enforces non-emptiness only; the
/// value is otherwise taken verbatim from the connection path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyRoomName);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user identity within a room, supplied by the connection path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyUserName);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated chat content: non-blank and bounded in size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyContent);
        }
        if value.len() > MAX_CONTENT_LEN {
            return Err(DomainError::ContentTooLong {
                max: MAX_CONTENT_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An immutable chat message. Produced once by a session on send, then
/// archived, cached and broadcast; never mutated after creation.
///
/// `timestamp` is Unix milliseconds (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub room: RoomName,
    pub user: UserName,
    pub content: MessageContent,
    pub timestamp: i64,
}

impl Message {
    /// Build a message with an explicit timestamp.
    pub fn new(room: RoomName, user: UserName, content: MessageContent, timestamp: i64) -> Self {
        Self {
            room,
            user,
            content,
            timestamp,
        }
    }

    /// Build a message stamped with the current wall-clock time.
    pub fn now(room: RoomName, user: UserName, content: MessageContent) -> Self {
        Self::new(room, user, content, now_unix_millis())
    }
}
