//! Repository for per-user favorite videos.

use std::sync::Arc;

use chrono::Utc;
use vidseek_core::policy::{clamp_limit, MAX_FAVORITES};
use vidseek_core::video::Video;

use super::validate_user_id;
use crate::error::StoreError;
use crate::models::favorite::Favorite;
use crate::table::{batch_delete_all, ItemTable, QueryOptions, TableError};

#[derive(Debug, Clone)]
pub struct FavoritesConfig {
    /// Per-user favorite quota checked by [`FavoriteRepo::add_within_quota`].
    pub max_favorites: usize,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            max_favorites: MAX_FAVORITES,
        }
    }
}

/// Provides add/remove/list operations for user favorites.
#[derive(Clone)]
pub struct FavoriteRepo {
    table: Arc<dyn ItemTable>,
    config: FavoritesConfig,
}

impl FavoriteRepo {
    pub fn new(table: Arc<dyn ItemTable>, config: FavoritesConfig) -> Self {
        Self { table, config }
    }

    pub fn config(&self) -> &FavoritesConfig {
        &self.config
    }

    /// Save `video` for `user_id`, stamped with the current time.
    ///
    /// The insert is conditional on the `(user, video)` key being absent, so
    /// two concurrent adds of the same video cannot both succeed. The quota
    /// is not checked here; see [`add_within_quota`](Self::add_within_quota).
    pub async fn add(&self, user_id: &str, video: &Video) -> Result<Favorite, StoreError> {
        validate_user_id(user_id).into_result()?;

        let favorite = Favorite::new(user_id, video, Utc::now());
        match self.table.put_if_absent(favorite.to_item()?).await {
            Ok(()) => {}
            Err(TableError::ConditionalCheckFailed) => {
                return Err(StoreError::AlreadyExists {
                    user_id: user_id.to_string(),
                    video_id: video.id().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id, video_id = video.id(), "Favorite added");
        Ok(favorite)
    }

    /// Count the user's favorites, then add if under the quota.
    ///
    /// The count and the insert are separate round-trips. Concurrent calls
    /// for a user near the limit can each pass the count and leave the user
    /// slightly over quota; duplicates are still impossible.
    pub async fn add_within_quota(
        &self,
        user_id: &str,
        video: &Video,
    ) -> Result<Favorite, StoreError> {
        let count = self.count(user_id).await?;
        if count >= self.config.max_favorites {
            tracing::debug!(user_id, count, "Favorite quota reached");
            return Err(StoreError::QuotaExceeded {
                limit: self.config.max_favorites,
            });
        }
        self.add(user_id, video).await
    }

    /// Remove a favorite. Returns `false` if it did not exist.
    pub async fn remove(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        let key = Favorite::key_for(user_id, video_id);
        match self.table.delete_if_exists(&key).await {
            Ok(()) => {
                tracing::info!(user_id, video_id, "Favorite removed");
                Ok(true)
            }
            Err(TableError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, user_id: &str, video_id: &str) -> Result<Option<Favorite>, StoreError> {
        let key = Favorite::key_for(user_id, video_id);
        match self.table.get(&key).await? {
            Some(item) => Ok(Some(Favorite::from_item(item)?)),
            None => Ok(None),
        }
    }

    /// Whether the user has favorited `video_id`.
    pub async fn contains(&self, user_id: &str, video_id: &str) -> Result<bool, StoreError> {
        Ok(self.get(user_id, video_id).await?.is_some())
    }

    /// The user's favorites, newest first by `added_at`.
    ///
    /// `limit` defaults to and is capped at the configured quota.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Favorite>, StoreError> {
        let limit = clamp_limit(limit, self.config.max_favorites, self.config.max_favorites);

        // The partition is ordered by video id, so ordering by time happens here.
        let mut favorites = self
            .table
            .query(user_id, QueryOptions::default())
            .await?
            .into_iter()
            .map(Favorite::from_item)
            .collect::<Result<Vec<_>, _>>()?;
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        favorites.truncate(limit);
        Ok(favorites)
    }

    pub async fn count(&self, user_id: &str) -> Result<usize, StoreError> {
        Ok(self.table.count(user_id).await?)
    }

    /// Delete every favorite of the user. Returns how many were deleted.
    pub async fn remove_all(&self, user_id: &str) -> Result<usize, StoreError> {
        let keys: Vec<_> = self
            .table
            .query(user_id, QueryOptions::default())
            .await?
            .iter()
            .map(|item| item.key())
            .collect();
        let deleted = batch_delete_all(self.table.as_ref(), &keys).await?;
        tracing::info!(user_id, deleted, "Cleared favorites");
        Ok(deleted)
    }
}
