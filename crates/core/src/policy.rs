//! Policy constants shared by the stores and the cache facade.
//!
//! These are defaults; each consumer exposes a config struct so deployments
//! can tune them.

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

/// Maximum favorites per user.
pub const MAX_FAVORITES: usize = 100;

// ---------------------------------------------------------------------------
// Search history
// ---------------------------------------------------------------------------

/// Number of most-recent history entries retained per user.
pub const MAX_HISTORY_ITEMS: usize = 10;

/// Maximum length of a stored search query, in characters, after trimming.
pub const MAX_QUERY_LENGTH: usize = 500;

/// Default number of distinct recent queries returned for suggestions.
pub const DEFAULT_UNIQUE_QUERY_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Cache TTLs (seconds)
// ---------------------------------------------------------------------------

pub const SEARCH_TTL_SECS: u64 = 300;
pub const POPULAR_TTL_SECS: u64 = 300;
pub const RELATED_TTL_SECS: u64 = 180;

/// Clamp a user-provided limit to `1..=max`, using `default` when absent.
pub fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).max(1).min(max)
}
