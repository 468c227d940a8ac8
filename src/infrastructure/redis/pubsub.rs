//! Room pub/sub over Redis channels.
//!
//! One multiplexed connection handles publishes; each subscribed room gets
//! its own pub/sub connection driven by a forwarding task. The task
//! reconnects with backoff after a dropped stream and exits once its
//! subscriber side is gone.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::domain::{PubSubError, RoomName, RoomPubSub, RoomSubscription};

use super::channel_key;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

pub struct RedisRoomPubSub {
    client: redis::Client,
    conn: redis::aio::MultiplexedConnection,
}

impl RedisRoomPubSub {
    pub fn new(client: redis::Client, conn: redis::aio::MultiplexedConnection) -> Self {
        Self { client, conn }
    }

    /// Open a client and a publish connection against the given URL.
    pub async fn connect(url: &str) -> Result<Self, PubSubError> {
        let client =
            redis::Client::open(url).map_err(|e| PubSubError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| PubSubError::Connection(e.to_string()))?;
        Ok(Self::new(client, conn))
    }
}

async fn open_feed(
    client: &redis::Client,
    channel: &str,
) -> Result<impl Stream<Item = redis::Msg>, redis::RedisError> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(channel).await?;
    Ok(pubsub.into_on_message())
}

#[async_trait]
impl RoomPubSub for RedisRoomPubSub {
    async fn publish(&self, room: &RoomName, payload: String) -> Result<(), PubSubError> {
        let mut conn = self.conn.clone();
        redis::cmd("PUBLISH")
            .arg(channel_key(room))
            .arg(payload)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| PubSubError::PublishFailed(e.to_string()))
    }

    async fn subscribe(&self, room: &RoomName) -> Result<RoomSubscription, PubSubError> {
        let client = self.client.clone();
        let channel = channel_key(room);
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                match open_feed(&client, &channel).await {
                    Ok(stream) => {
                        backoff = INITIAL_BACKOFF;
                        tokio::pin!(stream);
                        loop {
                            // A dropped subscription must close this
                            // connection promptly, not on the next payload.
                            let msg = tokio::select! {
                                _ = tx.closed() => return,
                                msg = stream.next() => msg,
                            };
                            let Some(msg) = msg else {
                                tracing::warn!(
                                    "pub/sub stream for '{channel}' ended, reconnecting"
                                );
                                break;
                            };
                            let payload = match msg.get_payload::<String>() {
                                Ok(payload) => payload,
                                Err(e) => {
                                    tracing::warn!(
                                        "skipping non-text payload on '{channel}': {e}"
                                    );
                                    continue;
                                }
                            };
                            if tx.send(payload).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("pub/sub connect for '{channel}' failed: {e}");
                    }
                }

                tokio::select! {
                    _ = tx.closed() => return,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        });

        Ok(RoomSubscription::new(rx))
    }
}
