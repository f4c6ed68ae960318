//! Cache backends: the transport underneath [`CacheClient`](crate::CacheClient).

pub mod memory;
pub mod redis_backend;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::CacheError;

pub use self::memory::MemoryBackend;
pub use self::redis_backend::{RedisBackend, RedisConfig};

/// Buffer for connection-state events.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Connection-state changes reported by a backend's transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Error(String),
    Disconnected,
}

/// String key-value store with per-key expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value and TTL.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Whether the transport currently has a working connection.
    fn is_connected(&self) -> bool;

    /// Receive subsequent connection-state events.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Close the transport and stop any background work.
    async fn shutdown(&self);
}
