//! End-to-end tests: a real server on a local port, driven by real
//! WebSocket and HTTP clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use sala::{
    config::RelayConfig,
    infrastructure::{
        fanout::{RoomBroadcastBridge, SessionManager},
        inmemory::{
            InMemoryMessageArchive, InMemoryPresenceTracker, InMemoryRateLimiter,
            InMemoryRecentHistory, InProcessPubSub,
        },
    },
    ui::Server,
    usecase::{JoinRoomUseCase, LeaveRoomUseCase, ListOnlineUseCase, PublishMessageUseCase},
};

/// A relay running in-process on a fixed port, over in-memory stores.
struct TestServer {
    port: u16,
}

impl TestServer {
    async fn start(port: u16) -> Self {
        let config = RelayConfig::default();

        let limiter = Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.window,
            config.rate_limit.max_events,
        ));
        let archive = Arc::new(InMemoryMessageArchive::new());
        let history = Arc::new(InMemoryRecentHistory::new(config.history_capacity));
        let presence = Arc::new(InMemoryPresenceTracker::new(config.presence_ttl));
        let pubsub = Arc::new(InProcessPubSub::new());

        let sessions = Arc::new(SessionManager::new(config.echo_to_sender));
        let bridge = Arc::new(RoomBroadcastBridge::new(pubsub, sessions.clone()));

        let join = Arc::new(JoinRoomUseCase::new(
            sessions.clone(),
            bridge.clone(),
            presence.clone(),
            history.clone(),
            config.store_timeout,
        ));
        let publish = Arc::new(PublishMessageUseCase::new(
            limiter,
            archive,
            history,
            presence.clone(),
            bridge.clone(),
            config.rate_limit.on_store_error,
            config.store_timeout,
        ));
        let leave = Arc::new(LeaveRoomUseCase::new(sessions, bridge));
        let list_online = Arc::new(ListOnlineUseCase::new(presence, config.store_timeout));

        let server = Server::new(join, publish, leave, list_online);
        tokio::spawn(async move {
            server
                .run("127.0.0.1".to_string(), port)
                .await
                .expect("server failed to run");
        });

        // Wait until the listener accepts connections
        for _ in 0..50 {
            if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                return TestServer { port };
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server did not start listening on port {port}");
    }

    fn ws_url(&self, room: &str, user: &str) -> String {
        format!("ws://127.0.0.1:{}/ws/{}/{}", self.port, room, user)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

/// A connected WebSocket client for one (room, user) pair.
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(server: &TestServer, room: &str, user: &str) -> Self {
        let (ws, _) = connect_async(server.ws_url(room, user))
            .await
            .expect("failed to connect");
        TestClient { ws }
    }

    async fn send(&mut self, text: &str) {
        self.ws
            .send(Message::text(text))
            .await
            .expect("failed to send");
    }

    /// Next text frame as parsed JSON, or a panic after the timeout.
    async fn next_frame(&mut self) -> serde_json::Value {
        let deadline = Duration::from_secs(2);
        loop {
            let msg = tokio::time::timeout(deadline, self.ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("connection closed")
                .expect("websocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("frame is not valid JSON");
            }
        }
    }

    /// Expect no frame to arrive within the given window.
    async fn assert_silent(&mut self, window: Duration) {
        let got = tokio::time::timeout(window, self.ws.next()).await;
        assert!(got.is_err(), "expected no frame, got: {:?}", got);
    }
}

#[tokio::test]
async fn test_message_reaches_every_session_in_the_room() {
    // given: ana and bia connected to the same room
    let server = TestServer::start(18090).await;
    let mut ana = TestClient::connect(&server, "turma1", "ana").await;
    let mut bia = TestClient::connect(&server, "turma1", "bia").await;
    assert_eq!(ana.next_frame().await["type"], "history");
    assert_eq!(bia.next_frame().await["type"], "history");

    // when: ana sends a message
    ana.send("oi").await;

    // then: both sessions receive it, sender included
    for client in [&mut ana, &mut bia] {
        let frame = client.next_frame().await;
        assert_eq!(frame["type"], "chat");
        assert_eq!(frame["room"], "turma1");
        assert_eq!(frame["user"], "ana");
        assert_eq!(frame["content"], "oi");
        assert!(frame["timestamp"].as_i64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_late_joiner_receives_recent_history() {
    // given: two messages already published to the room
    let server = TestServer::start(18091).await;
    let mut ana = TestClient::connect(&server, "turma1", "ana").await;
    assert_eq!(ana.next_frame().await["type"], "history");
    ana.send("primeira").await;
    ana.next_frame().await;
    ana.send("segunda").await;
    ana.next_frame().await;

    // when: bia joins afterwards
    let mut bia = TestClient::connect(&server, "turma1", "bia").await;

    // then: her first frame replays the history, newest first
    let frame = bia.next_frame().await;
    assert_eq!(frame["type"], "history");
    assert_eq!(frame["messages"][0]["content"], "segunda");
    assert_eq!(frame["messages"][1]["content"], "primeira");
}

#[tokio::test]
async fn test_flood_is_rate_limited_with_a_private_notice() {
    // given: one connected session and the default limit of 5 per second
    let server = TestServer::start(18092).await;
    let mut ana = TestClient::connect(&server, "turma1", "ana").await;
    assert_eq!(ana.next_frame().await["type"], "history");

    // when: six messages arrive back to back
    for i in 1..=6 {
        ana.send(&format!("msg{i}")).await;
    }

    // then: five echo back as chat frames and exactly one error notice
    let mut chats = 0;
    let mut errors = 0;
    for _ in 0..6 {
        match ana.next_frame().await["type"].as_str().unwrap() {
            "chat" => chats += 1,
            "error" => errors += 1,
            other => panic!("unexpected frame type: {other}"),
        }
    }
    assert_eq!(chats, 5);
    assert_eq!(errors, 1);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // given: ana in turma1, bia in geral
    let server = TestServer::start(18093).await;
    let mut ana = TestClient::connect(&server, "turma1", "ana").await;
    let mut bia = TestClient::connect(&server, "geral", "bia").await;
    assert_eq!(ana.next_frame().await["type"], "history");
    assert_eq!(bia.next_frame().await["type"], "history");

    // when: ana sends into turma1
    ana.send("oi turma").await;

    // then: only ana's room sees it
    assert_eq!(ana.next_frame().await["content"], "oi turma");
    bia.assert_silent(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_disconnected_session_stops_receiving() {
    // given: two sessions in the room
    let server = TestServer::start(18094).await;
    let mut ana = TestClient::connect(&server, "turma1", "ana").await;
    let mut bia = TestClient::connect(&server, "turma1", "bia").await;
    assert_eq!(ana.next_frame().await["type"], "history");
    assert_eq!(bia.next_frame().await["type"], "history");

    // when: bia disconnects and ana keeps talking
    bia.ws.close(None).await.expect("failed to close");
    tokio::time::sleep(Duration::from_millis(100)).await;
    ana.send("ainda aqui").await;

    // then: ana's session keeps working
    let frame = ana.next_frame().await;
    assert_eq!(frame["type"], "chat");
    assert_eq!(frame["content"], "ainda aqui");
}

#[tokio::test]
async fn test_health_and_online_roster_endpoints() {
    // given: two users in turma1
    let server = TestServer::start(18095).await;
    let mut ana = TestClient::connect(&server, "turma1", "ana").await;
    let mut bia = TestClient::connect(&server, "turma1", "bia").await;
    assert_eq!(ana.next_frame().await["type"], "history");
    assert_eq!(bia.next_frame().await["type"], "history");

    let http = reqwest::Client::new();

    // when / then: health reports ok
    let health: serde_json::Value = http
        .get(server.http_url("/api/health"))
        .send()
        .await
        .expect("health request failed")
        .json()
        .await
        .expect("health response is not JSON");
    assert_eq!(health["status"], "ok");

    // and the roster lists both users in the room, nobody elsewhere
    let roster: serde_json::Value = http
        .get(server.http_url("/api/rooms/turma1/online"))
        .send()
        .await
        .expect("roster request failed")
        .json()
        .await
        .expect("roster response is not JSON");
    assert_eq!(roster["room"], "turma1");
    let online = roster["online"].as_array().unwrap();
    assert_eq!(online.len(), 2);
    assert!(online.contains(&serde_json::json!("ana")));
    assert!(online.contains(&serde_json::json!("bia")));

    let empty: serde_json::Value = http
        .get(server.http_url("/api/rooms/geral/online"))
        .send()
        .await
        .expect("roster request failed")
        .json()
        .await
        .expect("roster response is not JSON");
    assert_eq!(empty["online"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_connection_with_blank_user_is_rejected() {
    // given: a running server
    let server = TestServer::start(18096).await;

    // when: the user path segment is only whitespace
    let result = connect_async(server.ws_url("turma1", "%20%20")).await;

    // then: the upgrade is refused
    assert!(result.is_err(), "blank user should not be able to connect");
}
