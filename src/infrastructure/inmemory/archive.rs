//! In-memory message archive for tests and storeless deployments.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Message, MessageArchive, StoreError};

pub struct InMemoryMessageArchive {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryMessageArchive {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Every archived message, oldest-first.
    pub async fn all(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }
}

impl Default for InMemoryMessageArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageArchive for InMemoryMessageArchive {
    async fn insert(&self, message: &Message) -> Result<(), StoreError> {
        self.messages.lock().await.push(message.clone());
        Ok(())
    }
}
