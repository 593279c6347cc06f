//! Durable key/value storage for saved snapshots.
//!
//! Stands in for the browser's local storage: one JSON string per key,
//! no listing, no expiry.

pub mod file;
pub mod redis_store;

use async_trait::async_trait;

use crate::errors::AppError;

pub use self::file::FileSnapshotStore;
pub use self::redis_store::RedisSnapshotStore;

/// Fixed prefix for snapshot keys; the session id is appended.
pub const SNAPSHOT_KEY: &str = "alevel-explorer-save";

pub fn snapshot_key(session: &uuid::Uuid) -> String {
    format!("{SNAPSHOT_KEY}:{session}")
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
