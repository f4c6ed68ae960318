//! TTL cache client with graceful degradation, and the read-through facade
//! that puts it in front of the video search provider.

pub mod backend;
pub mod client;
pub mod error;
pub mod facade;

pub use backend::{CacheBackend, ConnectionEvent, MemoryBackend, RedisBackend, RedisConfig};
pub use client::CacheClient;
pub use error::CacheError;
pub use facade::{CachePolicy, Cached, VideoCache};
