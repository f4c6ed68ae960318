//! Redis cache backend.
//!
//! Holds one shared [`ConnectionManager`]. A supervised task owns the
//! transport side of the connection lifecycle: it makes the connection
//! attempts, checks liveness with `PING`, and broadcasts
//! [`ConnectionEvent`]s on every state change. Consumers only listen.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use super::{CacheBackend, ConnectionEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::CacheError;

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: String,
    /// Interval between liveness checks / connection attempts.
    pub health_interval: Duration,
    /// Bound on each connection attempt and liveness ping.
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            health_interval: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

pub struct RedisBackend {
    client: redis::Client,
    config: RedisConfig,
    conn: RwLock<Option<ConnectionManager>>,
    connected: AtomicBool,
    events: broadcast::Sender<ConnectionEvent>,
    cancel: CancellationToken,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("url", &self.config.url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Create the backend and make the first connection attempt.
    ///
    /// Only an invalid URL is an error. An unreachable server leaves the
    /// backend disconnected; the supervisor keeps attempting in the
    /// background and announces recovery with [`ConnectionEvent::Connected`].
    pub async fn connect(config: RedisConfig) -> Result<Arc<Self>, CacheError> {
        let client = redis::Client::open(config.url.as_str())?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let backend = Arc::new(Self {
            client,
            config,
            conn: RwLock::new(None),
            connected: AtomicBool::new(false),
            events,
            cancel: CancellationToken::new(),
        });

        backend.try_connect().await;
        tokio::spawn(Arc::clone(&backend).supervise());
        Ok(backend)
    }

    async fn supervise(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.health_interval) => {}
            }

            let has_conn = self.conn.read().await.is_some();
            if has_conn {
                self.check_liveness().await;
            } else {
                self.try_connect().await;
            }
        }
        tracing::debug!("Redis supervisor stopped");
    }

    async fn try_connect(&self) {
        let attempt = tokio::time::timeout(
            self.config.connect_timeout,
            ConnectionManager::new(self.client.clone()),
        )
        .await;

        match attempt {
            Ok(Ok(manager)) => {
                *self.conn.write().await = Some(manager);
                self.set_connected(true);
            }
            Ok(Err(e)) => {
                self.report_error(e.to_string());
                self.set_connected(false);
            }
            Err(_) => {
                self.report_error("connection attempt timed out".to_string());
                self.set_connected(false);
            }
        }
    }

    async fn check_liveness(&self) {
        let Some(mut conn) = self.conn.read().await.clone() else {
            return;
        };
        let ping = tokio::time::timeout(self.config.connect_timeout, async move {
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(pong)
        })
        .await;

        match ping {
            Ok(Ok(_)) => self.set_connected(true),
            Ok(Err(e)) => {
                self.report_error(e.to_string());
                self.set_connected(false);
            }
            Err(_) => {
                self.report_error("liveness ping timed out".to_string());
                self.set_connected(false);
            }
        }
    }

    fn report_error(&self, message: String) {
        tracing::debug!(error = %message, "Redis transport error");
        let _ = self.events.send(ConnectionEvent::Error(message));
    }

    /// Record the connection state, announcing it only when it changes.
    fn set_connected(&self, up: bool) {
        let was = self.connected.swap(up, Ordering::SeqCst);
        if was == up {
            return;
        }
        let event = if up {
            ConnectionEvent::Connected
        } else {
            ConnectionEvent::Disconnected
        };
        let _ = self.events.send(event);
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.conn.read().await.clone().ok_or(CacheError::Unavailable)
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
        self.conn.write().await.take();
        self.set_connected(false);
        tracing::info!("Redis connection closed");
    }
}
