//! Degrading cache client.
//!
//! [`CacheClient`] wraps a [`CacheBackend`] and never reports cache
//! trouble to its callers: reads degrade to "absent" and writes to `false`.
//! The connected flag follows the backend's [`ConnectionEvent`]s; the client
//! does not attempt reconnects of its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::backend::{CacheBackend, ConnectionEvent};
use crate::error::CacheError;

/// Shared handle to a cache backend. Cheap to clone.
#[derive(Clone)]
pub struct CacheClient {
    backend: Arc<dyn CacheBackend>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl CacheClient {
    /// Wrap `backend` and start following its connection events.
    ///
    /// The initial state is taken from [`CacheBackend::is_connected`]. The
    /// listener task runs until [`CacheClient::disconnect`], which awaits it,
    /// or until the backend's event channel closes. Must be called from
    /// within a Tokio runtime.
    pub fn start(backend: Arc<dyn CacheBackend>) -> Self {
        let client = Self {
            connected: Arc::new(AtomicBool::new(backend.is_connected())),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
            backend,
        };

        let events = client.backend.subscribe();
        client.tasks.spawn(client.clone().listen(events));
        client.tasks.close();
        client
    }

    async fn listen(self, mut events: broadcast::Receiver<ConnectionEvent>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Missed transitions; resync from the transport itself.
                        tracing::warn!(missed, "Cache connection events lagged");
                        self.connected
                            .store(self.backend.is_connected(), Ordering::SeqCst);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("Cache event listener stopped");
    }

    /// Apply a connection event to the connected flag.
    pub fn handle_event(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => {
                if !self.connected.swap(true, Ordering::SeqCst) {
                    tracing::info!("Cache connected");
                }
            }
            ConnectionEvent::Error(message) => {
                tracing::warn!(error = %message, "Cache transport error");
                self.connected.store(false, Ordering::SeqCst);
            }
            ConnectionEvent::Disconnected => {
                if self.connected.swap(false, Ordering::SeqCst) {
                    tracing::warn!("Cache disconnected, operating without cache");
                }
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Fetch and deserialize `key`.
    ///
    /// Returns `None` when the key is missing, the client is disconnected,
    /// the backend fails, or the stored value does not deserialize as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_connected() {
            return None;
        }

        let raw = match self.backend.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Serialize and store `value` under `key` for `ttl`. Returns whether
    /// the write was accepted.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        if !self.is_connected() {
            return false;
        }

        let result: Result<(), CacheError> = async {
            let raw = serde_json::to_string(value)?;
            self.backend.set_ex(key, raw, ttl).await
        }
        .await;

        log_write("set", key, result)
    }

    /// Remove `key`. Returns whether the delete was accepted.
    pub async fn delete(&self, key: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        log_write("delete", key, self.backend.delete(key).await)
    }

    /// Stop following events, wait for the listener to exit, then close the
    /// backend.
    pub async fn disconnect(&self) {
        self.cancel.cancel();
        self.tasks.wait().await;
        self.backend.shutdown().await;
        self.connected.store(false, Ordering::SeqCst);
        tracing::info!("Cache client disconnected");
    }
}

fn log_write(op: &'static str, key: &str, result: Result<(), CacheError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(op, key, error = %e, "Cache write failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn client_with_backend() -> (CacheClient, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let client = CacheClient::start(backend.clone());
        (client, backend)
    }

    /// Let the listener task drain pending events.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn set_then_get_round_trips_json() {
        let (client, _) = client_with_backend();
        assert!(client.set("k", &vec![1, 2, 3], Duration::from_secs(60)).await);
        assert_eq!(client.get::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn missing_key_is_absent() {
        let (client, _) = client_with_backend();
        assert_eq!(client.get::<String>("nope").await, None);
    }

    #[tokio::test]
    async fn undecodable_entry_is_absent() {
        let (client, backend) = client_with_backend();
        backend
            .set_ex("k", "not json".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(client.get::<Vec<i32>>("k").await, None);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (client, _) = client_with_backend();
        client.set("k", &"v", Duration::from_secs(60)).await;
        assert!(client.delete("k").await);
        assert_eq!(client.get::<String>("k").await, None);
    }

    #[tokio::test]
    async fn disconnected_client_degrades() {
        let (client, _) = client_with_backend();
        client.set("k", &"v", Duration::from_secs(60)).await;

        client.handle_event(ConnectionEvent::Disconnected);
        assert!(!client.is_connected());
        assert_eq!(client.get::<String>("k").await, None);
        assert!(!client.set("k", &"w", Duration::from_secs(60)).await);
        assert!(!client.delete("k").await);

        client.handle_event(ConnectionEvent::Connected);
        assert_eq!(client.get::<String>("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn error_event_marks_disconnected() {
        let (client, _) = client_with_backend();
        client.handle_event(ConnectionEvent::Error("connection reset".into()));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn follows_backend_events() {
        let (client, backend) = client_with_backend();
        assert!(client.is_connected());

        backend.set_available(false);
        settle().await;
        assert!(!client.is_connected());

        backend.set_available(true);
        settle().await;
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn backend_failure_while_flagged_connected_degrades() {
        let (client, backend) = client_with_backend();
        client.cancel.cancel();
        settle().await;

        // The listener is gone, so the flag stays up while the backend fails.
        backend.set_available(false);
        assert!(client.is_connected());
        assert_eq!(client.get::<String>("k").await, None);
        assert!(!client.set("k", &"v", Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn disconnect_shuts_backend_down() {
        let (client, backend) = client_with_backend();
        client.disconnect().await;
        assert!(!client.is_connected());
        assert!(!backend.is_connected());
    }

    #[tokio::test]
    async fn disconnect_waits_for_listener_to_exit() {
        let (client, backend) = client_with_backend();
        assert_eq!(client.tasks.len(), 1);

        client.disconnect().await;
        assert!(client.tasks.is_empty());

        // Events after disconnect reach nobody.
        backend.set_available(true);
        settle().await;
        assert!(!client.is_connected());
    }
}
