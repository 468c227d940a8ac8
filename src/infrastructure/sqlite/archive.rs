//! Message archive over a SQLite pool.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::domain::{Message, MessageArchive, StoreError};

pub struct SqliteMessageArchive {
    pool: SqlitePool,
}

impl SqliteMessageArchive {
    /// Connect to the database and ensure the messages table exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        // A single connection: an in-memory database exists per connection,
        // and the write path is one INSERT per message anyway.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room TEXT NOT NULL,
                user TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageArchive for SqliteMessageArchive {
    async fn insert(&self, message: &Message) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO messages (room, user, content, timestamp) VALUES (?, ?, ?, ?)")
            .bind(message.room.as_str())
            .bind(message.user.as_str())
            .bind(message.content.as_str())
            .bind(message.timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageContent, RoomName, UserName};

    #[tokio::test]
    async fn test_insert_persists_all_fields() {
        // given: an in-memory database
        let archive = SqliteMessageArchive::connect("sqlite::memory:")
            .await
            .unwrap();
        let message = Message::new(
            RoomName::new("geral").unwrap(),
            UserName::new("ana").unwrap(),
            MessageContent::new("oi").unwrap(),
            1_700_000_000_000,
        );

        // when:
        archive.insert(&message).await.unwrap();

        // then: the row survives with its fields intact
        let (room, user, content, timestamp): (String, String, String, i64) =
            sqlx::query_as("SELECT room, user, content, timestamp FROM messages")
                .fetch_one(&archive.pool)
                .await
                .unwrap();
        assert_eq!(room, "geral");
        assert_eq!(user, "ana");
        assert_eq!(content, "oi");
        assert_eq!(timestamp, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_about_the_schema() {
        // Connecting twice against the same URL must not fail on the
        // CREATE TABLE statement.
        let first = SqliteMessageArchive::connect("sqlite::memory:").await;
        let second = SqliteMessageArchive::connect("sqlite::memory:").await;

        assert!(first.is_ok());
        assert!(second.is_ok());
    }
}
