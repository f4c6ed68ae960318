//! Video value object.
//!
//! A [`Video`] is the snapshot of provider metadata embedded in favorites
//! and returned by searches. It can only be built from a [`RawVideo`] that
//! passes every check in [`RawVideo::validate`]; deserialization goes
//! through the same path, so an invalid video never exists in memory.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationErrors};
use crate::types::Timestamp;

/// Unvalidated video fields as received at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub channel_title: Option<String>,
    pub thumbnails: Option<RawThumbnails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawThumbnails {
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
}

/// Outcome of [`RawVideo::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl RawVideo {
    /// Run every field check and report all violations at once.
    pub fn validate(&self) -> ValidationReport {
        let errors = self.violations();
        ValidationReport {
            valid: errors.is_empty(),
            errors: errors.messages().to_vec(),
        }
    }

    fn violations(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        errors.check(is_blank(&self.id), "id is required");
        errors.check(is_blank(&self.title), "title is required");
        errors.check(is_blank(&self.channel_title), "channelTitle is required");

        match &self.thumbnails {
            None => errors.push("thumbnails is required"),
            Some(thumbs) => {
                match thumbs.default.as_deref() {
                    None | Some("") => errors.push("thumbnails.default is required"),
                    Some(url) => errors.check(
                        !is_http_url(url),
                        "thumbnails.default must be an http(s) URL",
                    ),
                }
                if let Some(url) = &thumbs.medium {
                    errors.check(!is_http_url(url), "thumbnails.medium must be an http(s) URL");
                }
                if let Some(url) = &thumbs.high {
                    errors.check(!is_http_url(url), "thumbnails.high must be an http(s) URL");
                }
            }
        }

        if let Some(published) = &self.published_at {
            errors.check(
                parse_timestamp(published).is_none(),
                "publishedAt must be an ISO-8601 timestamp",
            );
        }
        if let Some(count) = self.view_count {
            errors.check(count < 0, "viewCount must be a non-negative integer");
        }

        errors
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

/// RFC 3339 with an offset, or a naive ISO-8601 date-time read as UTC.
fn parse_timestamp(value: &str) -> Option<Timestamp> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    value
        .parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

/// Thumbnail URLs; `default` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnails {
    pub default: String,
    pub medium: Option<String>,
    pub high: Option<String>,
}

/// A validated, immutable video record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVideo", into = "RawVideo")]
pub struct Video {
    id: String,
    title: String,
    channel_title: String,
    thumbnails: Thumbnails,
    description: Option<String>,
    published_at: Option<Timestamp>,
    duration: Option<String>,
    view_count: Option<u64>,
    category: Option<String>,
}

impl Video {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn channel_title(&self) -> &str {
        &self.channel_title
    }

    pub fn thumbnails(&self) -> &Thumbnails {
        &self.thumbnails
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }

    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    pub fn view_count(&self) -> Option<u64> {
        self.view_count
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

impl TryFrom<RawVideo> for Video {
    type Error = CoreError;

    fn try_from(raw: RawVideo) -> Result<Self, Self::Error> {
        raw.violations().into_result()?;

        // Every unwrap_or_default below is guarded by the checks above.
        let thumbs = raw.thumbnails.unwrap_or_default();
        Ok(Video {
            id: raw.id.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            channel_title: raw.channel_title.unwrap_or_default(),
            thumbnails: Thumbnails {
                default: thumbs.default.unwrap_or_default(),
                medium: thumbs.medium,
                high: thumbs.high,
            },
            description: raw.description,
            published_at: raw.published_at.as_deref().and_then(parse_timestamp),
            duration: raw.duration,
            view_count: raw.view_count.map(|c| c as u64),
            category: raw.category,
        })
    }
}

impl From<Video> for RawVideo {
    fn from(video: Video) -> Self {
        RawVideo {
            id: Some(video.id),
            title: Some(video.title),
            channel_title: Some(video.channel_title),
            thumbnails: Some(RawThumbnails {
                default: Some(video.thumbnails.default),
                medium: video.thumbnails.medium,
                high: video.thumbnails.high,
            }),
            description: video.description,
            published_at: video
                .published_at
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            duration: video.duration,
            view_count: video.view_count.map(|c| c as i64),
            category: video.category,
        }
    }
}
