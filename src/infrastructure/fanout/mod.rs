//! Process-local fan-out: the session registry and the per-room bridge that
//! turns the shared pub/sub channel into local deliveries.

mod bridge;
mod session_manager;

pub use bridge::RoomBroadcastBridge;
pub use session_manager::{SessionId, SessionManager};
