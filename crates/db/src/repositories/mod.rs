//! Repository layer.
//!
//! Each repository owns a shared handle to its [`ItemTable`](crate::table::ItemTable)
//! and the policy it enforces. Uniqueness and existence checks are pushed
//! down to the table's conditional operations.

pub mod favorite_repo;
pub mod search_history_repo;

pub use favorite_repo::{FavoriteRepo, FavoritesConfig};
pub use search_history_repo::{CleanupMode, HistoryConfig, SearchHistoryRepo};

use vidseek_core::error::ValidationErrors;

fn validate_user_id(user_id: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(user_id.trim().is_empty(), "userId is required");
    errors
}
