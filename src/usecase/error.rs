//! Usecase-level errors.

use thiserror::Error;

use crate::domain::PubSubError;

/// Failure to bring a session from Connecting to Active.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("failed to open room subscription: {0}")]
    Subscribe(#[from] PubSubError),
}
