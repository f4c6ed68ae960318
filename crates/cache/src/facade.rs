//! Read-through caching in front of the video search provider.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vidseek_core::cache_keys::{popular_key, related_key, search_key};
use vidseek_core::policy::{POPULAR_TTL_SECS, RELATED_TTL_SECS, SEARCH_TTL_SECS};
use vidseek_core::provider::{ProviderError, VideoList, VideoSearchProvider};

use crate::client::CacheClient;

/// Expiry applied to each cached query shape.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub search_ttl: Duration,
    pub popular_ttl: Duration,
    pub related_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(SEARCH_TTL_SECS),
            popular_ttl: Duration::from_secs(POPULAR_TTL_SECS),
            related_ttl: Duration::from_secs(RELATED_TTL_SECS),
        }
    }
}

/// A payload annotated with whether it was served from the cache.
///
/// Serializes as the payload's own fields plus `"cached"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cached<T> {
    #[serde(flatten)]
    pub value: T,
    pub cached: bool,
}

impl<T> Cached<T> {
    pub fn hit(value: T) -> Self {
        Self { value, cached: true }
    }

    pub fn miss(value: T) -> Self {
        Self {
            value,
            cached: false,
        }
    }
}

/// Check the cache, fall back to the provider, then populate the cache.
///
/// Provider errors are returned unchanged and never cached. A failed cache
/// write does not fail the call. Two concurrent misses on one key both reach
/// the provider and both write; the later write wins.
#[derive(Clone)]
pub struct VideoCache {
    cache: CacheClient,
    provider: Arc<dyn VideoSearchProvider>,
    policy: CachePolicy,
}

impl VideoCache {
    pub fn new(
        cache: CacheClient,
        provider: Arc<dyn VideoSearchProvider>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            cache,
            provider,
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        max_results: u32,
    ) -> Result<Cached<VideoList>, ProviderError> {
        let key = search_key(query, category, max_results);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Cached::hit(hit));
        }

        let list = self.provider.search(query, category, max_results).await?;
        self.populate(&key, list, self.policy.search_ttl).await
    }

    pub async fn popular(
        &self,
        category: Option<&str>,
        max_results: u32,
    ) -> Result<Cached<VideoList>, ProviderError> {
        let key = popular_key(category, max_results);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Cached::hit(hit));
        }

        let list = self.provider.popular(category, max_results).await?;
        self.populate(&key, list, self.policy.popular_ttl).await
    }

    pub async fn related(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Cached<VideoList>, ProviderError> {
        let key = related_key(video_id, max_results);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Cached::hit(hit));
        }

        let list = self.provider.related(video_id, max_results).await?;
        self.populate(&key, list, self.policy.related_ttl).await
    }

    async fn populate(
        &self,
        key: &str,
        list: VideoList,
        ttl: Duration,
    ) -> Result<Cached<VideoList>, ProviderError> {
        if !self.cache.set(key, &list, ttl).await {
            tracing::debug!(key, "Result not cached");
        }
        Ok(Cached::miss(list))
    }
}
