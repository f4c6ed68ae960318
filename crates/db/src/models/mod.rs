//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `Serialize` + `Deserialize` entity struct, stored as the attributes
//!   document of one table item
//! - The key layout that places the entity in its user's partition

pub mod favorite;
pub mod search_history;
