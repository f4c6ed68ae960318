//! Favorite entity model.

use serde::{Deserialize, Serialize};
use vidseek_core::types::Timestamp;
use vidseek_core::video::Video;

use crate::table::{Item, ItemKey, TableError};

/// A video saved by a user. Keyed by `(user_id, video_id)`.
///
/// `video` is a snapshot taken when the favorite was added and is never
/// refreshed from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: String,
    pub video_id: String,
    pub video: Video,
    pub added_at: Timestamp,
}

impl Favorite {
    pub fn new(user_id: &str, video: &Video, added_at: Timestamp) -> Self {
        Self {
            user_id: user_id.to_string(),
            video_id: video.id().to_string(),
            video: video.clone(),
            added_at,
        }
    }

    pub fn key_for(user_id: &str, video_id: &str) -> ItemKey {
        ItemKey::new(user_id, video_id)
    }

    pub fn key(&self) -> ItemKey {
        Self::key_for(&self.user_id, &self.video_id)
    }

    pub(crate) fn to_item(&self) -> Result<Item, TableError> {
        Ok(Item {
            partition_key: self.user_id.clone(),
            sort_key: self.video_id.clone(),
            attributes: serde_json::to_value(self)?,
        })
    }

    pub(crate) fn from_item(item: Item) -> Result<Self, TableError> {
        Ok(serde_json::from_value(item.attributes)?)
    }
}
