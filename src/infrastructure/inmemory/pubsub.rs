//! In-process pub/sub over tokio broadcast channels.
//!
//! Stands in for the external transport in single-process deployments and
//! tests: each room maps to one broadcast channel, created lazily on first
//! publish or subscribe.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, mpsc};

use crate::domain::{PubSubError, RoomName, RoomPubSub, RoomSubscription};

const CHANNEL_CAPACITY: usize = 256;

pub struct InProcessPubSub {
    channels: Mutex<HashMap<RoomName, broadcast::Sender<String>>>,
}

impl InProcessPubSub {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    async fn channel(&self, room: &RoomName) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for InProcessPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomPubSub for InProcessPubSub {
    async fn publish(&self, room: &RoomName, payload: String) -> Result<(), PubSubError> {
        // A send with no live subscribers is not an error at this layer.
        let _ = self.channel(room).await.send(payload);
        Ok(())
    }

    async fn subscribe(&self, room: &RoomName) -> Result<RoomSubscription, PubSubError> {
        let mut feed = self.channel(room).await.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let room = room.clone();

        tokio::spawn(async move {
            loop {
                // A dropped subscription must release the feed promptly, not
                // on the next payload.
                tokio::select! {
                    _ = tx.closed() => break,
                    received = feed.recv() => match received {
                        Ok(payload) => {
                            if tx.send(payload).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "subscription to '{room}' lagged, skipped {skipped} payloads"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(RoomSubscription::new(rx))
    }
}
