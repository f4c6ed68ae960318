//! In-process [`ItemTable`] used by tests and local development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_batch_size, Item, ItemKey, ItemTable, QueryOptions, TableError};

type Partition = BTreeMap<String, serde_json::Value>;

/// A table held in memory. Each operation takes the lock once, so the
/// conditional operations are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryTable {
    partitions: RwLock<BTreeMap<String, Partition>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of items across all partitions.
    pub async fn len(&self) -> usize {
        self.partitions.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn to_item(partition_key: &str, sort_key: &str, attributes: &serde_json::Value) -> Item {
    Item {
        partition_key: partition_key.to_string(),
        sort_key: sort_key.to_string(),
        attributes: attributes.clone(),
    }
}

#[async_trait]
impl ItemTable for MemoryTable {
    async fn put_if_absent(&self, item: Item) -> Result<(), TableError> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(item.partition_key).or_default();
        if partition.contains_key(&item.sort_key) {
            return Err(TableError::ConditionalCheckFailed);
        }
        partition.insert(item.sort_key, item.attributes);
        Ok(())
    }

    async fn delete_if_exists(&self, key: &ItemKey) -> Result<(), TableError> {
        let mut partitions = self.partitions.write().await;
        partitions
            .get_mut(&key.partition_key)
            .and_then(|p| p.remove(&key.sort_key))
            .map(|_| ())
            .ok_or(TableError::ConditionalCheckFailed)
    }

    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, TableError> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(&key.partition_key)
            .and_then(|p| p.get(&key.sort_key))
            .map(|attrs| to_item(&key.partition_key, &key.sort_key, attrs)))
    }

    async fn query(
        &self,
        partition_key: &str,
        options: QueryOptions,
    ) -> Result<Vec<Item>, TableError> {
        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(partition_key) else {
            return Ok(Vec::new());
        };
        let limit = options.limit.unwrap_or(usize::MAX);
        let items = partition
            .iter()
            .map(|(sk, attrs)| to_item(partition_key, sk, attrs));
        let items = if options.descending {
            items.rev().take(limit).collect()
        } else {
            items.take(limit).collect()
        };
        Ok(items)
    }

    async fn count(&self, partition_key: &str) -> Result<usize, TableError> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(partition_key).map_or(0, BTreeMap::len))
    }

    async fn batch_delete(&self, keys: &[ItemKey]) -> Result<usize, TableError> {
        check_batch_size(keys)?;
        let mut partitions = self.partitions.write().await;
        let mut deleted = 0;
        for key in keys {
            if let Some(partition) = partitions.get_mut(&key.partition_key) {
                if partition.remove(&key.sort_key).is_some() {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }
}
