use std::sync::Arc;

use vidseek_cache::{CacheClient, VideoCache};
use vidseek_core::provider::VideoSearchProvider;
use vidseek_db::repositories::{FavoriteRepo, SearchHistoryRepo};
use vidseek_db::table::PgTable;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every client inside is a shared handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: vidseek_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub favorites: FavoriteRepo,
    pub history: SearchHistoryRepo,
    /// Degrading cache client; never fails a request.
    pub cache: CacheClient,
    /// Read-through video lookups, present once a provider is attached.
    pub videos: Option<VideoCache>,
}

impl AppState {
    /// Wire the stores onto `pool` and share `cache` across handlers.
    pub fn new(pool: vidseek_db::DbPool, config: ServerConfig, cache: CacheClient) -> Self {
        let favorites = FavoriteRepo::new(
            Arc::new(PgTable::favorites(pool.clone())),
            config.favorites.clone(),
        );
        let history = SearchHistoryRepo::new(
            Arc::new(PgTable::search_history(pool.clone())),
            config.history.clone(),
        );

        Self {
            pool,
            config: Arc::new(config),
            favorites,
            history,
            cache,
            videos: None,
        }
    }

    /// Put `provider` behind the shared cache client using the configured
    /// TTLs.
    pub fn with_provider(mut self, provider: Arc<dyn VideoSearchProvider>) -> Self {
        self.videos = Some(VideoCache::new(
            self.cache.clone(),
            provider,
            self.config.cache_policy.clone(),
        ));
        self
    }
}
