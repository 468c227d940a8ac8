//! Sliding-window rate limiter over an in-process event map.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RateLimiter, RoomName, StoreError, UserName};

/// Per-(room, user) sliding window of send timestamps.
///
/// Each `admit` records the attempt, purges events older than the window,
/// and admits iff the remaining count is within the ceiling. The purge keeps
/// every retained set bounded by the window.
pub struct InMemoryRateLimiter {
    window: Duration,
    max_events: usize,
    events: Mutex<HashMap<(RoomName, UserName), VecDeque<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(window: Duration, max_events: usize) -> Self {
        Self {
            window,
            max_events,
            events: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn admit(&self, room: &RoomName, user: &UserName) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut events = self.events.lock().await;

        // Drop keys idle for a full window, like the keyed expiry of the
        // shared-store implementation; the map stays bounded by the set of
        // senders active within the last window.
        events.retain(|_, window| {
            window
                .back()
                .is_some_and(|newest| now.duration_since(*newest) <= self.window)
        });

        let window = events
            .entry((room.clone(), user.clone()))
            .or_insert_with(VecDeque::new);

        window.push_back(now);
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) > self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        Ok(window.len() <= self.max_events)
    }
}
