//! UseCase: publish one inbound frame into a room.
//!
//! Drives the Active-state send path: validate, admit, archive, cache,
//! refresh presence, publish to the room channel. Collaborator failures
//! degrade the single operation per its policy; they never end the session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FailPolicy;
use crate::domain::{
    ClientFrame, DomainError, Message, MessageArchive, MessageContent, PresenceTracker,
    RateLimiter, RecentHistory, RoomName, StoreError, UserName,
};
use crate::infrastructure::fanout::RoomBroadcastBridge;

/// What happened to one inbound frame.
#[derive(Debug)]
pub enum PublishOutcome {
    /// Admitted and relayed to the room channel.
    Published(Message),
    /// Sliding-window ceiling exceeded: notify the sender, drop the message.
    RateLimited,
    /// Content failed validation: drop silently, session stays active.
    Rejected(DomainError),
}

pub struct PublishMessageUseCase {
    limiter: Arc<dyn RateLimiter>,
    archive: Arc<dyn MessageArchive>,
    history: Arc<dyn RecentHistory>,
    presence: Arc<dyn PresenceTracker>,
    bridge: Arc<RoomBroadcastBridge>,
    on_limiter_error: FailPolicy,
    store_timeout: Duration,
}

impl PublishMessageUseCase {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        archive: Arc<dyn MessageArchive>,
        history: Arc<dyn RecentHistory>,
        presence: Arc<dyn PresenceTracker>,
        bridge: Arc<RoomBroadcastBridge>,
        on_limiter_error: FailPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            archive,
            history,
            presence,
            bridge,
            on_limiter_error,
            store_timeout,
        }
    }

    /// Process one raw inbound text frame from `user` in `room`.
    pub async fn execute(&self, room: &RoomName, user: &UserName, raw: &str) -> PublishOutcome {
        let content = match MessageContent::new(ClientFrame::content_of(raw)) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("dropping invalid frame from '{user}' in '{room}': {e}");
                return PublishOutcome::Rejected(e);
            }
        };

        let admitted = match bounded(self.store_timeout, self.limiter.admit(room, user)).await {
            Ok(admitted) => admitted,
            Err(e) => {
                let fail_open = self.on_limiter_error == FailPolicy::FailOpen;
                tracing::warn!(
                    "rate-limit store error for '{user}' in '{room}' ({e}), failing {}",
                    if fail_open { "open" } else { "closed" }
                );
                fail_open
            }
        };
        if !admitted {
            return PublishOutcome::RateLimited;
        }

        let message = Message::now(room.clone(), user.clone(), content);

        // Archival is fire-and-forget from the session's perspective, but
        // failures are logged rather than silently dropped.
        if let Err(e) = bounded(self.store_timeout, self.archive.insert(&message)).await {
            tracing::error!("failed to archive message from '{user}' in '{room}': {e}");
        }

        if let Err(e) = bounded(self.store_timeout, self.history.append(&message)).await {
            tracing::warn!("failed to cache message in '{room}': {e}");
        }

        // Presence is best-effort and never blocks delivery.
        if let Err(e) = bounded(self.store_timeout, self.presence.mark_online(room, user)).await {
            tracing::warn!("failed to refresh presence for '{user}' in '{room}': {e}");
        }

        // The channel round trip gets the same budget as the stores; a hung
        // transport degrades this one publish to local delivery.
        match tokio::time::timeout(self.store_timeout, self.bridge.publish(&message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("publish to '{room}' failed ({e}), delivering locally only");
                self.bridge.deliver_local(&message).await;
            }
            Err(_) => {
                tracing::warn!("publish to '{room}' timed out, delivering locally only");
                self.bridge.deliver_local(&message).await;
            }
        }

        PublishOutcome::Published(message)
    }
}

/// Bound a backing-store round trip by the configured budget, mapping an
/// elapsed budget to a store timeout.
async fn bounded<T>(
    budget: Duration,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}
