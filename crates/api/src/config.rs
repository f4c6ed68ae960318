use std::str::FromStr;
use std::time::Duration;

use vidseek_cache::{CachePolicy, RedisConfig};
use vidseek_db::repositories::{CleanupMode, FavoritesConfig, HistoryConfig};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub redis: RedisConfig,
    pub cache_policy: CachePolicy,
    pub favorites: FavoritesConfig,
    pub history: HistoryConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                   |
    /// |------------------------------|---------------------------|
    /// | `HOST`                       | `0.0.0.0`                 |
    /// | `PORT`                       | `3000`                    |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                      |
    /// | `REDIS_URL`                  | `redis://127.0.0.1:6379`  |
    /// | `CACHE_HEALTH_INTERVAL_SECS` | `5`                       |
    /// | `CACHE_CONNECT_TIMEOUT_SECS` | `3`                       |
    /// | `CACHE_SEARCH_TTL_SECS`      | `300`                     |
    /// | `CACHE_POPULAR_TTL_SECS`     | `300`                     |
    /// | `CACHE_RELATED_TTL_SECS`     | `180`                     |
    /// | `MAX_FAVORITES`              | `100`                     |
    /// | `MAX_HISTORY_ITEMS`          | `10`                      |
    /// | `HISTORY_CLEANUP_MODE`       | `inline`                  |
    ///
    /// Panics on values that do not parse; misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);

        let redis_defaults = RedisConfig::default();
        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").unwrap_or(redis_defaults.url),
            health_interval: env_secs("CACHE_HEALTH_INTERVAL_SECS", redis_defaults.health_interval),
            connect_timeout: env_secs("CACHE_CONNECT_TIMEOUT_SECS", redis_defaults.connect_timeout),
        };

        let policy_defaults = CachePolicy::default();
        let cache_policy = CachePolicy {
            search_ttl: env_secs("CACHE_SEARCH_TTL_SECS", policy_defaults.search_ttl),
            popular_ttl: env_secs("CACHE_POPULAR_TTL_SECS", policy_defaults.popular_ttl),
            related_ttl: env_secs("CACHE_RELATED_TTL_SECS", policy_defaults.related_ttl),
        };

        let favorites = FavoritesConfig {
            max_favorites: env_or("MAX_FAVORITES", FavoritesConfig::default().max_favorites),
        };

        let history_defaults = HistoryConfig::default();
        let history = HistoryConfig {
            max_items: env_or("MAX_HISTORY_ITEMS", history_defaults.max_items),
            cleanup_mode: env_or::<CleanupMode>("HISTORY_CLEANUP_MODE", history_defaults.cleanup_mode),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis,
            cache_policy,
            favorites,
            history,
        }
    }
}

/// Parse `name` from the environment, or return `default` when unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} is invalid ('{raw}'): {e}")),
        Err(_) => default,
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or(name, default.as_secs()))
}
