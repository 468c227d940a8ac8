//! Usecases orchestrating the relay core: joining and leaving a room,
//! publishing a message, and the roster query surface.

pub mod error;
mod join_room;
mod leave_room;
mod list_online;
mod publish_message;

pub use error::JoinError;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use list_online::ListOnlineUseCase;
pub use publish_message::{PublishMessageUseCase, PublishOutcome};
