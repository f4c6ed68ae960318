//! PostgreSQL-backed [`ItemTable`].
//!
//! Each logical table is a physical table with a composite primary key
//! `(partition_key, sort_key)` and a JSONB `attributes` column. Conditional
//! writes are single statements whose affected-row count decides the
//! outcome, so they stay atomic under concurrent callers.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{check_batch_size, Item, ItemKey, ItemTable, QueryOptions, TableError};

/// Physical table holding favorites.
pub const FAVORITES_TABLE: &str = "favorites";

/// Physical table holding search history entries.
pub const SEARCH_HISTORY_TABLE: &str = "search_history";

/// Column list for item queries.
const COLUMNS: &str = "partition_key, sort_key, attributes";

pub struct PgTable {
    pool: PgPool,
    table: &'static str,
}

impl PgTable {
    /// Wrap one physical table. `table` is interpolated into SQL and must
    /// be a trusted identifier.
    pub fn new(pool: PgPool, table: &'static str) -> Self {
        Self { pool, table }
    }

    pub fn favorites(pool: PgPool) -> Self {
        Self::new(pool, FAVORITES_TABLE)
    }

    pub fn search_history(pool: PgPool) -> Self {
        Self::new(pool, SEARCH_HISTORY_TABLE)
    }
}

#[async_trait]
impl ItemTable for PgTable {
    async fn put_if_absent(&self, item: Item) -> Result<(), TableError> {
        let query = format!(
            "INSERT INTO {} ({COLUMNS}) VALUES ($1, $2, $3) \
             ON CONFLICT (partition_key, sort_key) DO NOTHING",
            self.table
        );
        let result = sqlx::query(&query)
            .bind(&item.partition_key)
            .bind(&item.sort_key)
            .bind(&item.attributes)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TableError::ConditionalCheckFailed);
        }
        Ok(())
    }

    async fn delete_if_exists(&self, key: &ItemKey) -> Result<(), TableError> {
        let query = format!(
            "DELETE FROM {} WHERE partition_key = $1 AND sort_key = $2",
            self.table
        );
        let result = sqlx::query(&query)
            .bind(&key.partition_key)
            .bind(&key.sort_key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TableError::ConditionalCheckFailed);
        }
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> Result<Option<Item>, TableError> {
        let query = format!(
            "SELECT {COLUMNS} FROM {} WHERE partition_key = $1 AND sort_key = $2",
            self.table
        );
        let item = sqlx::query_as::<_, Item>(&query)
            .bind(&key.partition_key)
            .bind(&key.sort_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn query(
        &self,
        partition_key: &str,
        options: QueryOptions,
    ) -> Result<Vec<Item>, TableError> {
        let order = if options.descending { "DESC" } else { "ASC" };
        // LIMIT NULL returns every row.
        let query = format!(
            "SELECT {COLUMNS} FROM {} \
             WHERE partition_key = $1 \
             ORDER BY sort_key {order} \
             LIMIT $2",
            self.table
        );
        let items = sqlx::query_as::<_, Item>(&query)
            .bind(partition_key)
            .bind(options.limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn count(&self, partition_key: &str) -> Result<usize, TableError> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE partition_key = $1",
            self.table
        );
        let count: i64 = sqlx::query_scalar(&query)
            .bind(partition_key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn batch_delete(&self, keys: &[ItemKey]) -> Result<usize, TableError> {
        check_batch_size(keys)?;
        if keys.is_empty() {
            return Ok(0);
        }
        let (partition_keys, sort_keys): (Vec<String>, Vec<String>) = keys
            .iter()
            .map(|k| (k.partition_key.clone(), k.sort_key.clone()))
            .unzip();
        let query = format!(
            "DELETE FROM {} WHERE (partition_key, sort_key) IN \
             (SELECT * FROM UNNEST($1::text[], $2::text[]))",
            self.table
        );
        let result = sqlx::query(&query)
            .bind(&partition_keys)
            .bind(&sort_keys)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}
