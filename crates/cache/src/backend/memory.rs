//! In-process cache backend.
//!
//! Expiry uses [`tokio::time::Instant`], so tests can drive it with a
//! paused clock. [`MemoryBackend::set_available`] simulates the transport
//! going away and coming back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

use super::{CacheBackend, ConnectionEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::CacheError;

struct Entry {
    value: String,
    expires_at: Instant,
}

pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
    available: AtomicBool,
    events: broadcast::Sender<ConnectionEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            events,
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the backend reachable or unreachable, announcing the change as
    /// the matching connection event.
    pub fn set_available(&self, available: bool) {
        let was = self.available.swap(available, Ordering::SeqCst);
        if was == available {
            return;
        }
        let event = if available {
            ConnectionEvent::Connected
        } else {
            ConnectionEvent::Disconnected
        };
        let _ = self.events.send(event);
    }

    /// Remaining time to live of `key`, if it is present and unexpired.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        entry.expires_at.checked_duration_since(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    fn ensure_available(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable)
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_available()?;
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ensure_available()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn shutdown(&self) {
        self.set_available(false);
    }
}
