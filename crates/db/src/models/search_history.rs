//! Search history entity model and DTOs.

use serde::{Deserialize, Serialize};
use vidseek_core::history::HistoryRecord;
use vidseek_core::types::{to_millis_string, Timestamp};

use crate::table::{Item, ItemKey, TableError};

/// One recorded search. Keyed by `(user_id, timestamp)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub user_id: String,
    pub timestamp: Timestamp,
    pub query: String,
    pub category: Option<String>,
    pub result_count: u32,
}

/// DTO for recording a search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSearchEntry {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub result_count: u32,
}

impl CreateSearchEntry {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            result_count: 0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_result_count(mut self, result_count: u32) -> Self {
        self.result_count = result_count;
        self
    }
}

impl SearchHistoryEntry {
    pub fn key_for(user_id: &str, timestamp: &Timestamp) -> ItemKey {
        ItemKey::new(user_id, to_millis_string(timestamp))
    }

    pub fn key(&self) -> ItemKey {
        Self::key_for(&self.user_id, &self.timestamp)
    }

    pub fn as_record(&self) -> HistoryRecord<'_> {
        HistoryRecord {
            query: &self.query,
            category: self.category.as_deref(),
            result_count: self.result_count,
            timestamp: self.timestamp,
        }
    }

    pub(crate) fn to_item(&self) -> Result<Item, TableError> {
        let key = self.key();
        Ok(Item {
            partition_key: key.partition_key,
            sort_key: key.sort_key,
            attributes: serde_json::to_value(self)?,
        })
    }

    pub(crate) fn from_item(item: Item) -> Result<Self, TableError> {
        Ok(serde_json::from_value(item.attributes)?)
    }
}
