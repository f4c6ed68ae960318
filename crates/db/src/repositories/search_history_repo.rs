//! Repository for per-user search history with bounded retention.

use std::str::FromStr;
use std::sync::Arc;

use tokio_util::task::TaskTracker;
use vidseek_core::clock::MonotonicClock;
use vidseek_core::history::{
    compute_statistics, unique_recent_queries, validate_query, HistoryStatistics,
};
use vidseek_core::policy::{clamp_limit, DEFAULT_UNIQUE_QUERY_LIMIT, MAX_HISTORY_ITEMS};
use vidseek_core::types::Timestamp;

use super::validate_user_id;
use crate::error::StoreError;
use crate::models::search_history::{CreateSearchEntry, SearchHistoryEntry};
use crate::table::{batch_delete_all, ItemTable, QueryOptions, TableError};

/// Attempts at finding a free `(user, timestamp)` key before giving up.
const MAX_INSERT_ATTEMPTS: usize = 3;

/// How the retention cleanup runs after an insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupMode {
    /// Awaited after the insert; a failure is logged.
    #[default]
    Inline,
    /// Spawned onto the repository's task tracker; a failure is logged by
    /// that task. [`SearchHistoryRepo::wait_for_cleanups`] awaits them.
    Background,
}

impl FromStr for CleanupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(CleanupMode::Inline),
            "background" => Ok(CleanupMode::Background),
            other => Err(format!("unknown cleanup mode: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Number of most-recent entries kept per user.
    pub max_items: usize,
    pub cleanup_mode: CleanupMode,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: MAX_HISTORY_ITEMS,
            cleanup_mode: CleanupMode::default(),
        }
    }
}

/// Records searches and serves recent-history queries.
///
/// Each insert is followed by a cleanup pass that trims the user's history
/// to the newest `max_items` entries. The two steps are not atomic:
/// concurrent inserts for one user can leave extra entries visible until a
/// later cleanup settles them.
#[derive(Clone)]
pub struct SearchHistoryRepo {
    table: Arc<dyn ItemTable>,
    config: HistoryConfig,
    clock: Arc<MonotonicClock>,
    cleanups: TaskTracker,
}

impl SearchHistoryRepo {
    pub fn new(table: Arc<dyn ItemTable>, config: HistoryConfig) -> Self {
        Self {
            table,
            config,
            clock: Arc::new(MonotonicClock::new()),
            cleanups: TaskTracker::new(),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Record a search for `user_id`.
    ///
    /// The query is trimmed before it is stored. The returned entry reflects
    /// the committed insert; the retention cleanup that follows cannot fail
    /// this call.
    pub async fn add(
        &self,
        user_id: &str,
        input: CreateSearchEntry,
    ) -> Result<SearchHistoryEntry, StoreError> {
        let mut errors = validate_user_id(user_id);
        errors.extend(validate_query(&input.query));
        errors.into_result()?;

        let entry = self.insert(user_id, input).await?;
        tracing::debug!(user_id, timestamp = %entry.timestamp, "Search recorded");

        match self.config.cleanup_mode {
            CleanupMode::Inline => self.cleanup_logged(user_id).await,
            CleanupMode::Background => {
                let repo = self.clone();
                let user_id = user_id.to_string();
                self.cleanups
                    .spawn(async move { repo.cleanup_logged(&user_id).await });
            }
        }

        Ok(entry)
    }

    /// Wait until every background cleanup spawned so far has finished.
    ///
    /// Called on shutdown so no trim is cut off mid-batch. Cleanups spawned
    /// while waiting are awaited too.
    pub async fn wait_for_cleanups(&self) {
        self.cleanups.close();
        self.cleanups.wait().await;
        self.cleanups.reopen();
    }

    async fn insert(
        &self,
        user_id: &str,
        input: CreateSearchEntry,
    ) -> Result<SearchHistoryEntry, StoreError> {
        let mut entry = SearchHistoryEntry {
            user_id: user_id.to_string(),
            timestamp: self.clock.now(),
            query: input.query.trim().to_string(),
            category: input.category,
            result_count: input.result_count,
        };

        let mut attempt = 1;
        loop {
            match self.table.put_if_absent(entry.to_item()?).await {
                Ok(()) => return Ok(entry),
                // Another writer holds this millisecond; take the next one.
                Err(TableError::ConditionalCheckFailed) if attempt < MAX_INSERT_ATTEMPTS => {
                    tracing::debug!(user_id, attempt, "History timestamp taken, retrying");
                    entry.timestamp = self.clock.now();
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn cleanup_logged(&self, user_id: &str) {
        if let Err(e) = self.cleanup(user_id).await {
            tracing::warn!(user_id, error = %e, "Search history cleanup failed");
        }
    }

    /// Delete every entry beyond the newest `max_items`. Returns how many
    /// entries were deleted.
    pub async fn cleanup(&self, user_id: &str) -> Result<usize, StoreError> {
        let items = self
            .table
            .query(user_id, QueryOptions::newest_first(None))
            .await?;
        if items.len() <= self.config.max_items {
            return Ok(0);
        }

        let stale: Vec<_> = items[self.config.max_items..]
            .iter()
            .map(|item| item.key())
            .collect();
        let deleted = batch_delete_all(self.table.as_ref(), &stale).await?;
        tracing::debug!(user_id, deleted, "Trimmed search history");
        Ok(deleted)
    }

    /// The user's history, newest first.
    ///
    /// With `enforce_limit`, `limit` defaults to and is capped at
    /// `max_items`. Without it, `limit` is applied as given and `None`
    /// returns every stored entry.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
        enforce_limit: bool,
    ) -> Result<Vec<SearchHistoryEntry>, StoreError> {
        let limit = if enforce_limit {
            Some(clamp_limit(limit, self.config.max_items, self.config.max_items))
        } else {
            limit
        };

        let entries = self
            .table
            .query(user_id, QueryOptions::newest_first(limit))
            .await?
            .into_iter()
            .map(SearchHistoryEntry::from_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Distinct recent queries, newest first, compared case-insensitively.
    /// Each query keeps the spelling of its most recent occurrence.
    pub async fn recent_unique_queries(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<String>, StoreError> {
        let entries = self.list_by_user(user_id, None, true).await?;
        let limit = limit.unwrap_or(DEFAULT_UNIQUE_QUERY_LIMIT);
        Ok(unique_recent_queries(
            entries.iter().map(|e| e.query.as_str()),
            limit,
        ))
    }

    /// Entries recorded under `category`, newest first.
    pub async fn by_category(
        &self,
        user_id: &str,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHistoryEntry>, StoreError> {
        let limit = limit.unwrap_or(self.config.max_items);
        let entries = self.list_by_user(user_id, None, false).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.category.as_deref() == Some(category))
            .take(limit)
            .collect())
    }

    /// Delete one entry. Returns `false` if it did not exist.
    pub async fn delete_one(&self, user_id: &str, timestamp: &Timestamp) -> Result<bool, StoreError> {
        let key = SearchHistoryEntry::key_for(user_id, timestamp);
        match self.table.delete_if_exists(&key).await {
            Ok(()) => Ok(true),
            Err(TableError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the user's whole history. Returns how many entries were deleted.
    pub async fn clear_all(&self, user_id: &str) -> Result<usize, StoreError> {
        let keys: Vec<_> = self
            .list_by_user(user_id, None, false)
            .await?
            .iter()
            .map(SearchHistoryEntry::key)
            .collect();
        let deleted = batch_delete_all(self.table.as_ref(), &keys).await?;
        tracing::info!(user_id, deleted, "Cleared search history");
        Ok(deleted)
    }

    /// Aggregates over the user's full stored history.
    pub async fn statistics(&self, user_id: &str) -> Result<HistoryStatistics, StoreError> {
        let entries = self.list_by_user(user_id, None, false).await?;
        let records: Vec<_> = entries.iter().map(SearchHistoryEntry::as_record).collect();
        Ok(compute_statistics(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_mode_parses_case_insensitively() {
        assert_eq!("Inline".parse::<CleanupMode>(), Ok(CleanupMode::Inline));
        assert_eq!(" background ".parse::<CleanupMode>(), Ok(CleanupMode::Background));
        assert!("eventually".parse::<CleanupMode>().is_err());
    }
}
