//! Video search provider collaborator.
//!
//! The provider is an external, rate-limited and fallible service. This
//! crate only defines the contract; callers inject an implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::video::Video;

/// Default number of results requested from the provider.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Upper bound on results per provider request.
pub const MAX_RESULTS_LIMIT: u32 = 50;

/// A page of videos returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoList {
    pub videos: Vec<Video>,
    pub total_results: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Failures reported by the provider. Passed through to callers unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider quota exceeded")]
    QuotaExceeded,

    #[error("Provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait VideoSearchProvider: Send + Sync {
    /// Free-text search, optionally narrowed to a category.
    async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        max_results: u32,
    ) -> Result<VideoList, ProviderError>;

    /// Currently popular videos, optionally narrowed to a category.
    async fn popular(
        &self,
        category: Option<&str>,
        max_results: u32,
    ) -> Result<VideoList, ProviderError>;

    /// Videos related to `video_id`.
    async fn related(&self, video_id: &str, max_results: u32)
        -> Result<VideoList, ProviderError>;
}
