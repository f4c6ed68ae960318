/// Failures of a cache backend operation.
///
/// These never reach callers of [`CacheClient`](crate::CacheClient); the
/// client logs them and degrades to "absent" or `false`.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend unavailable")]
    Unavailable,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
