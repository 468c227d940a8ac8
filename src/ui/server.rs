//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    JoinRoomUseCase, LeaveRoomUseCase, ListOnlineUseCase, PublishMessageUseCase,
};

use super::{
    handler::{get_online_users, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat relay server.
pub struct Server {
    join_room_usecase: Arc<JoinRoomUseCase>,
    publish_message_usecase: Arc<PublishMessageUseCase>,
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    list_online_usecase: Arc<ListOnlineUseCase>,
}

impl Server {
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        publish_message_usecase: Arc<PublishMessageUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        list_online_usecase: Arc<ListOnlineUseCase>,
    ) -> Self {
        Self {
            join_room_usecase,
            publish_message_usecase,
            leave_room_usecase,
            list_online_usecase,
        }
    }

    /// Run the relay until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            join_room_usecase: self.join_room_usecase,
            publish_message_usecase: self.publish_message_usecase,
            leave_room_usecase: self.leave_room_usecase,
            list_online_usecase: self.list_online_usecase,
        });

        let app = Router::new()
            // WebSocket endpoint: room and user come from the path
            .route("/ws/{room}/{user}", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/api/rooms/{room}/online", get(get_online_users))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("chat relay listening on {}", listener.local_addr()?);
        tracing::info!("connect to: ws://{}/ws/{{room}}/{{user}}", bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server shutdown complete");

        Ok(())
    }
}
