//! Core data structures for the cardbox library.
//!
//! This module contains the generic record managed by the store, plus the
//! draft and patch value objects used by the create and update operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{normalize_tags, Queryable};

/// Represents a single record in a collection.
///
/// The field set is the union of what the concrete domains (notes, memories,
/// files, activities) need: text fields for substring search, a tag set, an
/// optional domain timestamp for date-range filtering, boolean flags usable
/// as filter toggles or sort primaries, and an optional numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, assigned at creation and never reused
    pub id: String,
    /// Record title
    pub title: String,
    /// Free-form body text
    #[serde(default)]
    pub body: String,
    /// Tags for organization; no duplicates, no empty entries
    #[serde(default)]
    pub tags: Vec<String>,
    /// Domain timestamp (event date, photo date) for date-range filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    /// Pinned records sort ahead under the pinned-first comparator
    #[serde(default)]
    pub pinned: bool,
    /// Favorite flag
    #[serde(default)]
    pub favorite: bool,
    /// Numeric field (file size, download count) for numeric sorting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Merges the non-empty fields of a patch into this record.
    ///
    /// `id` and `created_at` are never touched. The caller is responsible for
    /// validating the patch beforehand and for bumping `updated_at` after.
    pub(crate) fn merge(&mut self, patch: RecordPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(occurred_at) = patch.occurred_at {
            self.occurred_at = Some(occurred_at);
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(favorite) = patch.favorite {
            self.favorite = favorite;
        }
        if let Some(size) = patch.size {
            self.size = Some(size);
        }
    }
}

impl Queryable for Record {
    fn text_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.body]
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "pinned" => Some(self.pinned),
            "favorite" => Some(self.favorite),
            _ => None,
        }
    }

    fn numeric(&self, name: &str) -> Option<u64> {
        match name {
            "size" => self.size,
            _ => None,
        }
    }

    fn sort_title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Input for creating a new record. The store assigns id and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDraft {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl RecordDraft {
    /// Creates a draft with the given title and everything else empty.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn occurred_at(mut self, when: DateTime<Utc>) -> Self {
        self.occurred_at = Some(when);
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Partial update for an existing record. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn occurred_at(mut self, when: DateTime<Utc>) -> Self {
        self.occurred_at = Some(when);
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.tags.is_none()
            && self.occurred_at.is_none()
            && self.pinned.is_none()
            && self.favorite.is_none()
            && self.size.is_none()
    }
}
