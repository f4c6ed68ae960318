//! Durable key-value table abstraction.
//!
//! Items live in a partition (`partition_key`, the user) and are ordered
//! within it by `sort_key`. Implementations must provide the atomic
//! conditional operations the stores rely on; the stores never emulate
//! them with a read followed by a write.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::FromRow;

pub use memory::MemoryTable;
pub use postgres::PgTable;

/// Largest number of keys accepted by one [`ItemTable::batch_delete`] call.
pub const MAX_BATCH_SIZE: usize = 25;

/// Composite primary key of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub partition_key: String,
    pub sort_key: String,
}

impl ItemKey {
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// A stored item: its key plus a JSON document of attributes.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Item {
    pub partition_key: String,
    pub sort_key: String,
    pub attributes: serde_json::Value,
}

impl Item {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.partition_key.clone(), self.sort_key.clone())
    }
}

/// Options for a partition range query.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Return items in descending `sort_key` order.
    pub descending: bool,
    /// Maximum number of items; `None` returns the whole partition.
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn newest_first(limit: Option<usize>) -> Self {
        Self {
            descending: true,
            limit,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The precondition of a conditional write did not hold: the key
    /// already existed on put, or was absent on delete.
    #[error("Conditional check failed")]
    ConditionalCheckFailed,

    #[error("Batch of {size} exceeds the limit of {max} items")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Item serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ItemTable: Send + Sync {
    /// Insert `item`, failing with [`TableError::ConditionalCheckFailed`]
    /// if its key already exists.
    async fn put_if_absent(&self, item: Item) -> Result<(), TableError>;

    /// Delete `key`, failing with [`TableError::ConditionalCheckFailed`]
    /// if it does not exist.
    async fn delete_if_exists(&self, key: &ItemKey) -> Result<(), TableError>;

    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, TableError>;

    /// Items of one partition ordered by `sort_key`.
    async fn query(
        &self,
        partition_key: &str,
        options: QueryOptions,
    ) -> Result<Vec<Item>, TableError>;

    /// Number of items in one partition.
    async fn count(&self, partition_key: &str) -> Result<usize, TableError>;

    /// Delete up to [`MAX_BATCH_SIZE`] keys in one call. Absent keys are
    /// ignored. Returns how many items were actually removed.
    async fn batch_delete(&self, keys: &[ItemKey]) -> Result<usize, TableError>;
}

/// Delete every key, sending batches of at most [`MAX_BATCH_SIZE`].
///
/// Returns how many items were removed; keys already gone are not
/// counted. Stops at the first failed batch; earlier batches stay deleted.
pub async fn batch_delete_all(table: &dyn ItemTable, keys: &[ItemKey]) -> Result<usize, TableError> {
    let mut deleted = 0;
    for chunk in keys.chunks(MAX_BATCH_SIZE) {
        deleted += table.batch_delete(chunk).await?;
    }
    Ok(deleted)
}

fn check_batch_size(keys: &[ItemKey]) -> Result<(), TableError> {
    if keys.len() > MAX_BATCH_SIZE {
        return Err(TableError::BatchTooLarge {
            size: keys.len(),
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}
