//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::usecase::{
    JoinRoomUseCase, LeaveRoomUseCase, ListOnlineUseCase, PublishMessageUseCase,
};

pub struct AppState {
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub publish_message_usecase: Arc<PublishMessageUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub list_online_usecase: Arc<ListOnlineUseCase>,
}
