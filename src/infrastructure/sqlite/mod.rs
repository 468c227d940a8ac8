//! SQLite-backed durable message archive.

mod archive;

pub use archive::SqliteMessageArchive;

use crate::domain::StoreError;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}
