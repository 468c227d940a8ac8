//! Relay configuration.

use std::time::Duration;

/// What admission control does when the backing store cannot answer.
///
/// This is an explicit deployment choice, never a silent default at the call
/// site: `FailClosed` rejects the message, `FailOpen` admits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPolicy {
    FailOpen,
    FailClosed,
}

/// Sliding-window admission settings per (room, user).
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Trailing window duration.
    pub window: Duration,
    /// Maximum admitted sends per window, inclusive of the current attempt.
    pub max_events: usize,
    /// Policy applied when the rate-limit store is unavailable.
    pub on_store_error: FailPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            max_events: 5,
            on_store_error: FailPolicy::FailClosed,
        }
    }
}

/// Configuration for the relay core.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub rate_limit: RateLimitConfig,
    /// Maximum messages kept per room in the recent-history cache.
    pub history_capacity: usize,
    /// How long a user stays on the online roster without activity.
    pub presence_ttl: Duration,
    /// Whether a sender receives its own published message back.
    pub echo_to_sender: bool,
    /// Budget for a single backing-store round trip on the publish path.
    pub store_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            history_capacity: 50,
            presence_ttl: Duration::from_secs(60),
            echo_to_sender: true,
            store_timeout: Duration::from_secs(2),
        }
    }
}
