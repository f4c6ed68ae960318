//! Domain types and pure logic shared by the vidseek crates.
//!
//! Nothing here performs I/O: the video value object, cache key scheme,
//! history aggregates and the search-provider contract all live in this
//! crate so the store, cache and API layers agree on them.

pub mod cache_keys;
pub mod clock;
pub mod error;
pub mod history;
pub mod policy;
pub mod provider;
pub mod types;
pub mod video;
