//! Integration tests for the read-through video cache.
//!
//! Drives [`VideoCache`] with an in-memory backend and a scripted provider:
//! - Miss populates, hit skips the provider
//! - Per-shape TTLs
//! - Provider errors pass through and are not cached
//! - Disconnected cache falls through to the provider

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use vidseek_cache::{CacheClient, CachePolicy, ConnectionEvent, MemoryBackend, VideoCache};
use vidseek_core::cache_keys::{popular_key, related_key, search_key};
use vidseek_core::provider::{ProviderError, VideoList, VideoSearchProvider};
use vidseek_core::video::{RawThumbnails, RawVideo, Video};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn video(id: &str) -> Video {
    Video::try_from(RawVideo {
        id: Some(id.to_string()),
        title: Some(format!("Video {id}")),
        channel_title: Some("Skills Channel".to_string()),
        thumbnails: Some(RawThumbnails {
            default: Some(format!("https://i.ytimg.com/vi/{id}/default.jpg")),
            ..Default::default()
        }),
        ..Default::default()
    })
    .unwrap()
}

fn list_of(ids: &[&str]) -> VideoList {
    VideoList {
        videos: ids.iter().map(|id| video(id)).collect(),
        total_results: ids.len() as u64,
        next_page_token: None,
    }
}

/// Provider that counts calls and either answers with a fixed list or fails.
#[derive(Default)]
struct ScriptedProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, ids: &[&str]) -> Result<VideoList, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::QuotaExceeded);
        }
        Ok(list_of(ids))
    }
}

#[async_trait]
impl VideoSearchProvider for ScriptedProvider {
    async fn search(
        &self,
        _query: &str,
        _category: Option<&str>,
        _max_results: u32,
    ) -> Result<VideoList, ProviderError> {
        self.answer(&["s1", "s2"])
    }

    async fn popular(
        &self,
        _category: Option<&str>,
        _max_results: u32,
    ) -> Result<VideoList, ProviderError> {
        self.answer(&["p1"])
    }

    async fn related(
        &self,
        _video_id: &str,
        _max_results: u32,
    ) -> Result<VideoList, ProviderError> {
        self.answer(&["r1", "r2", "r3"])
    }
}

struct Fixture {
    cache: VideoCache,
    client: CacheClient,
    backend: Arc<MemoryBackend>,
    provider: Arc<ScriptedProvider>,
}

fn fixture_with(provider: ScriptedProvider) -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let client = CacheClient::start(backend.clone());
    let provider = Arc::new(provider);
    let cache = VideoCache::new(client.clone(), provider.clone(), CachePolicy::default());
    Fixture {
        cache,
        client,
        backend,
        provider,
    }
}

fn fixture() -> Fixture {
    fixture_with(ScriptedProvider::default())
}

// ---------------------------------------------------------------------------
// Hit / miss
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_miss_then_hit() {
    let f = fixture();

    let first = f.cache.search("Skills Tutorial", Some("tutorial"), 10).await.unwrap();
    assert!(!first.cached);
    assert_eq!(first.value.videos.len(), 2);

    let second = f.cache.search("  skills tutorial ", Some("tutorial"), 10).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.value, first.value);
    assert_eq!(f.provider.calls(), 1);
}

#[tokio::test]
async fn different_parameters_miss_separately() {
    let f = fixture();
    f.cache.search("goals", None, 10).await.unwrap();
    f.cache.search("goals", None, 20).await.unwrap();
    f.cache.search("goals", Some("review"), 10).await.unwrap();
    assert_eq!(f.provider.calls(), 3);
}

#[tokio::test]
async fn popular_and_related_are_cached() {
    let f = fixture();

    assert!(!f.cache.popular(Some("gameplay"), 12).await.unwrap().cached);
    assert!(f.cache.popular(Some("gameplay"), 12).await.unwrap().cached);
    assert!(!f.cache.related("vid-9", 8).await.unwrap().cached);
    assert!(f.cache.related("vid-9", 8).await.unwrap().cached);
    assert_eq!(f.provider.calls(), 2);
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn entries_use_per_shape_ttls() {
    let f = fixture();
    f.cache.search("goals", None, 10).await.unwrap();
    f.cache.popular(None, 10).await.unwrap();
    f.cache.related("vid-9", 10).await.unwrap();

    assert_eq!(
        f.backend.ttl(&search_key("goals", None, 10)).await,
        Some(Duration::from_secs(300))
    );
    assert_eq!(
        f.backend.ttl(&popular_key(None, 10)).await,
        Some(Duration::from_secs(300))
    );
    assert_eq!(
        f.backend.ttl(&related_key("vid-9", 10)).await,
        Some(Duration::from_secs(180))
    );
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_refetched() {
    let f = fixture();
    f.cache.related("vid-9", 10).await.unwrap();

    tokio::time::advance(Duration::from_secs(181)).await;
    let again = f.cache.related("vid-9", 10).await.unwrap();
    assert!(!again.cached);
    assert_eq!(f.provider.calls(), 2);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_error_propagates_and_is_not_cached() {
    let f = fixture_with(ScriptedProvider::failing());

    let result = f.cache.search("goals", None, 10).await;
    assert_matches!(result, Err(ProviderError::QuotaExceeded));
    assert_eq!(f.backend.len().await, 0);

    assert_matches!(
        f.cache.search("goals", None, 10).await,
        Err(ProviderError::QuotaExceeded)
    );
    assert_eq!(f.provider.calls(), 2);
}

#[tokio::test]
async fn disconnected_cache_falls_through_to_provider() {
    let f = fixture();
    f.cache.search("goals", None, 10).await.unwrap();

    f.client.handle_event(ConnectionEvent::Disconnected);
    for _ in 0..3 {
        let result = f.cache.search("goals", None, 10).await.unwrap();
        assert!(!result.cached);
        assert_eq!(result.value.videos.len(), 2);
    }
    assert_eq!(f.provider.calls(), 4);
}

#[tokio::test]
async fn failed_cache_write_does_not_fail_the_call() {
    let f = fixture();
    // Transport fails while the client still believes it is connected.
    f.backend.set_available(false);
    f.client.handle_event(ConnectionEvent::Connected);

    let result = f.cache.popular(None, 10).await.unwrap();
    assert!(!result.cached);
    assert_eq!(result.value.videos.len(), 1);
}

#[tokio::test]
async fn cache_recovers_after_reconnect() {
    let f = fixture();
    f.client.handle_event(ConnectionEvent::Disconnected);
    f.cache.search("goals", None, 10).await.unwrap();
    assert_eq!(f.backend.len().await, 0);

    f.client.handle_event(ConnectionEvent::Connected);
    f.cache.search("goals", None, 10).await.unwrap();
    assert!(f.cache.search("goals", None, 10).await.unwrap().cached);
    assert_eq!(f.provider.calls(), 2);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_misses_may_both_reach_provider() {
    let f = fixture();

    let results = futures::future::join_all(
        (0..4).map(|_| f.cache.search("goals", None, 10)),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap().value.videos.len(), 2);
    }
    // Every miss that raced the first write called the provider; at least
    // one did, and the entry ends up cached once.
    assert!(f.provider.calls() >= 1);
    assert_eq!(f.backend.len().await, 1);
    assert!(f.cache.search("goals", None, 10).await.unwrap().cached);
}
