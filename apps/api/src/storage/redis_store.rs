use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::{info, warn};

use super::SnapshotStore;
use crate::errors::AppError;

/// Snapshots kept as plain string values in Redis (GET / SET / DEL).
#[derive(Clone)]
pub struct RedisSnapshotStore {
    conn: MultiplexedConnection,
}

impl RedisSnapshotStore {
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = Client::open(url).map_err(storage_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(storage_error)?;
        info!("Redis snapshot store connected");
        Ok(Self { conn })
    }
}

fn storage_error(e: redis::RedisError) -> AppError {
    AppError::Storage(format!("redis: {e}"))
}

/// Raw value to snapshot text. Non-UTF-8 bytes come back as an empty string,
/// which fails to decode as a snapshot and so goes down the corrupt path.
fn snapshot_text(key: &str, raw: Option<Vec<u8>>) -> Option<String> {
    raw.map(|bytes| {
        String::from_utf8(bytes).unwrap_or_else(|_| {
            warn!(key, "Stored snapshot is not valid UTF-8");
            String::new()
        })
    })
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let raw = conn
            .get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(storage_error)?;
        Ok(snapshot_text(key, raw))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await.map_err(storage_error)
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(storage_error)
    }
}
