//! Cache key derivation for the three cached query shapes.
//!
//! Keys are `:`-delimited and deterministic. Segment values are not
//! escaped, so a query or category containing `:` can produce the same key
//! as a different parameter set (`("a:b", Some(""))` and `("a", Some("b:"))`).
//! The format is kept as-is so existing cache entries stay addressable.

/// Key prefix for search results.
pub const SEARCH_PREFIX: &str = "search";

/// Key prefix for popular-video listings.
pub const POPULAR_PREFIX: &str = "popular";

/// Key prefix for related-video listings.
pub const RELATED_PREFIX: &str = "related";

/// Key for a search. The query is trimmed and lower-cased; a missing
/// category becomes an empty segment.
///
/// ```
/// use vidseek_core::cache_keys::search_key;
/// assert_eq!(
///     search_key("  EFootball Gameplay  ", Some("tips"), 10),
///     "search:efootball gameplay:tips:10"
/// );
/// assert_eq!(search_key("", Some("review"), 15), "search::review:15");
/// ```
pub fn search_key(query: &str, category: Option<&str>, max_results: u32) -> String {
    format!(
        "{SEARCH_PREFIX}:{}:{}:{max_results}",
        query.trim().to_lowercase(),
        category.unwrap_or_default()
    )
}

/// Key for a popular-videos listing.
pub fn popular_key(category: Option<&str>, max_results: u32) -> String {
    format!(
        "{POPULAR_PREFIX}:{}:{max_results}",
        category.unwrap_or_default()
    )
}

/// Key for a related-videos listing.
pub fn related_key(video_id: &str, max_results: u32) -> String {
    format!("{RELATED_PREFIX}:{video_id}:{max_results}")
}
