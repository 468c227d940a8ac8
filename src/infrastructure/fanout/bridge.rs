//! Per-room bridge between the shared pub/sub channel and local sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::{Message, PubSubError, RoomName, RoomPubSub};

use super::session_manager::SessionManager;

struct RoomSubscriptionState {
    refcount: usize,
    task: JoinHandle<()>,
}

/// Keeps exactly one subscription task per room per process, reference
/// counted by the local sessions in that room.
///
/// The first `retain` for a room opens the subscription and spawns its
/// receive loop; the last `release` aborts it. The loop decodes each payload
/// and hands it to [`SessionManager::broadcast_local`]; a payload that fails
/// to decode is logged and skipped without terminating the loop.
pub struct RoomBroadcastBridge {
    pubsub: Arc<dyn RoomPubSub>,
    sessions: Arc<SessionManager>,
    rooms: Mutex<HashMap<RoomName, RoomSubscriptionState>>,
}

impl RoomBroadcastBridge {
    pub fn new(pubsub: Arc<dyn RoomPubSub>, sessions: Arc<SessionManager>) -> Self {
        Self {
            pubsub,
            sessions,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Ensure the room's subscription is running and count one more local
    /// session against it.
    pub async fn retain(&self, room: &RoomName) -> Result<(), PubSubError> {
        let mut rooms = self.rooms.lock().await;
        if let Some(state) = rooms.get_mut(room) {
            state.refcount += 1;
            return Ok(());
        }

        let mut subscription = self.pubsub.subscribe(room).await?;
        let sessions = self.sessions.clone();
        let loop_room = room.clone();
        let task = tokio::spawn(async move {
            while let Some(payload) = subscription.next_payload().await {
                match serde_json::from_str::<Message>(&payload) {
                    Ok(message) => sessions.broadcast_local(&loop_room, &message).await,
                    Err(e) => {
                        tracing::warn!("skipping undecodable payload on '{loop_room}': {e}");
                    }
                }
            }
            tracing::debug!("subscription feed for '{loop_room}' ended");
        });

        rooms.insert(room.clone(), RoomSubscriptionState { refcount: 1, task });
        tracing::info!("opened broadcast subscription for room '{room}'");
        Ok(())
    }

    /// Drop one local session's claim on the room; the last release tears
    /// the subscription down.
    pub async fn release(&self, room: &RoomName) {
        let mut rooms = self.rooms.lock().await;
        if let Some(state) = rooms.get_mut(room) {
            state.refcount -= 1;
            if state.refcount == 0 {
                if let Some(state) = rooms.remove(room) {
                    state.task.abort();
                }
                tracing::info!("closed broadcast subscription for room '{room}'");
            }
        }
    }

    /// Encode a message and send it to the room's channel. Fire-and-forget:
    /// delivery to local sessions comes from the subscription loop.
    pub async fn publish(&self, message: &Message) -> Result<(), PubSubError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| PubSubError::PublishFailed(e.to_string()))?;
        self.pubsub.publish(&message.room, payload).await
    }

    /// Deliver a message to local sessions directly, bypassing the channel.
    /// Used as a degraded path when the transport rejects a publish.
    pub async fn deliver_local(&self, message: &Message) {
        self.sessions.broadcast_local(&message.room, message).await;
    }

    /// Whether this process currently holds a subscription for the room.
    pub async fn is_subscribed(&self, room: &RoomName) -> bool {
        self.rooms.lock().await.contains_key(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use crate::domain::{MessageContent, UserName};
    use crate::infrastructure::inmemory::InProcessPubSub;

    fn room(name: &str) -> RoomName {
        RoomName::new(name).unwrap()
    }

    fn message(room_name: &str, user_name: &str, content: &str) -> Message {
        Message::new(
            room(room_name),
            UserName::new(user_name).unwrap(),
            MessageContent::new(content).unwrap(),
            1,
        )
    }

    fn bridge_fixture() -> (Arc<RoomBroadcastBridge>, Arc<SessionManager>, Arc<InProcessPubSub>) {
        let pubsub = Arc::new(InProcessPubSub::new());
        let sessions = Arc::new(SessionManager::new(true));
        let bridge = Arc::new(RoomBroadcastBridge::new(pubsub.clone(), sessions.clone()));
        (bridge, sessions, pubsub)
    }

    #[tokio::test]
    async fn test_published_message_reaches_local_sessions_through_the_loop() {
        // given: one registered session and a retained room
        let (bridge, sessions, _pubsub) = bridge_fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        sessions
            .register(room("turma1"), UserName::new("ana").unwrap(), tx)
            .await;
        bridge.retain(&room("turma1")).await.unwrap();

        // when: a message is published to the room channel
        bridge.publish(&message("turma1", "ana", "oi")).await.unwrap();

        // then: the session receives the chat frame via the bridge loop
        let payload = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        let frame: serde_json::Value = serde_json::from_str(&payload.unwrap()).unwrap();
        assert_eq!(frame["type"], "chat");
        assert_eq!(frame["content"], "oi");
    }

    #[tokio::test]
    async fn test_subscription_is_reference_counted() {
        let (bridge, _sessions, _pubsub) = bridge_fixture();

        bridge.retain(&room("turma1")).await.unwrap();
        bridge.retain(&room("turma1")).await.unwrap();
        assert!(bridge.is_subscribed(&room("turma1")).await);

        bridge.release(&room("turma1")).await;
        assert!(bridge.is_subscribed(&room("turma1")).await);

        bridge.release(&room("turma1")).await;
        assert!(!bridge.is_subscribed(&room("turma1")).await);
    }

    #[tokio::test]
    async fn test_undecodable_payload_does_not_kill_the_loop() {
        // given: a retained room with one session
        let (bridge, sessions, pubsub) = bridge_fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        sessions
            .register(room("turma1"), UserName::new("ana").unwrap(), tx)
            .await;
        bridge.retain(&room("turma1")).await.unwrap();

        // when: garbage arrives on the channel, then a valid message
        pubsub
            .publish(&room("turma1"), "{not json".to_string())
            .await
            .unwrap();
        bridge.publish(&message("turma1", "ana", "oi")).await.unwrap();

        // then: the valid message still comes through
        let payload = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        let frame: serde_json::Value = serde_json::from_str(&payload.unwrap()).unwrap();
        assert_eq!(frame["content"], "oi");
    }

    #[tokio::test]
    async fn test_release_on_unknown_room_is_a_no_op() {
        let (bridge, _sessions, _pubsub) = bridge_fixture();

        bridge.release(&room("ghost")).await;

        assert!(!bridge.is_subscribed(&room("ghost")).await);
    }
}
