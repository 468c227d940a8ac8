//! In-memory implementations of the backing-store ports.
//!
//! These back single-process deployments (no Redis required) and the test
//! suite. They honor the same contracts as the Redis implementations but
//! coordinate nothing across processes.

mod archive;
mod history;
mod presence;
mod pubsub;
mod rate_limiter;

pub use archive::InMemoryMessageArchive;
pub use history::InMemoryRecentHistory;
pub use presence::InMemoryPresenceTracker;
pub use pubsub::InProcessPubSub;
pub use rate_limiter::InMemoryRateLimiter;
