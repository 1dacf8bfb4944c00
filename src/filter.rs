//! Filter configuration and predicate evaluation.
//!
//! A [`FilterConfig`] is a value object describing four independent predicate
//! categories: free-text search, tag membership, date range, and boolean flag
//! toggles. A record passes the filter iff every category passes (AND across
//! categories); within the tag category any selected tag may match (OR).
//! An empty configuration passes every record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{fold, Queryable};

/// A composable filter over one record collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Case-insensitive substring matched against text fields and tags.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search: String,

    /// Selected tags; a record must carry at least one when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Inclusive lower bound on the record's domain timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the record's domain timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,

    /// Flag toggles; every listed flag must be true on the record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl FilterConfig {
    /// Create a new empty filter (the identity filter).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text search string.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Add a tag to the selected set (OR logic with other selected tags).
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add multiple tags to the selected set.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Set the inclusive lower date bound.
    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the inclusive upper date bound.
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Require a boolean flag to be true (AND logic with other toggles).
    pub fn require_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Check if the filter is empty (no constraints).
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.tags.is_empty()
            && self.from.is_none()
            && self.until.is_none()
            && self.flags.is_empty()
    }

    /// Decide whether one record passes the whole filter.
    pub fn matches<T: Queryable>(&self, record: &T) -> bool {
        self.matches_text(record)
            && self.matches_tags(record)
            && self.matches_range(record)
            && self.matches_flags(record)
    }

    fn matches_text<T: Queryable>(&self, record: &T) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = fold(&self.search);
        record
            .text_fields()
            .iter()
            .any(|field| fold(field).contains(&needle))
            || record.tags().iter().any(|tag| fold(tag).contains(&needle))
    }

    fn matches_tags<T: Queryable>(&self, record: &T) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        self.tags.iter().any(|selected| {
            let selected = fold(selected);
            record.tags().iter().any(|tag| fold(tag) == selected)
        })
    }

    fn matches_range<T: Queryable>(&self, record: &T) -> bool {
        if self.from.is_none() && self.until.is_none() {
            return true;
        }
        // A record with no domain timestamp cannot fall within a set bound.
        let Some(ts) = record.timestamp() else {
            return false;
        };
        if let Some(from) = self.from {
            if ts < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if ts > until {
                return false;
            }
        }
        true
    }

    fn matches_flags<T: Queryable>(&self, record: &T) -> bool {
        self.flags
            .iter()
            .all(|flag| record.flag(flag).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use chrono::TimeZone;

    fn record(title: &str, tags: &[&str], occurred: Option<DateTime<Utc>>) -> Record {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Record {
            id: format!("test-{}", title),
            title: title.to_string(),
            body: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            occurred_at: occurred,
            pinned: false,
            favorite: false,
            size: None,
            created_at: t0,
            updated_at: t0,
        }
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let filter = FilterConfig::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&record("anything", &["x"], None)));
    }

    #[test]
    fn test_text_predicate_case_insensitive() {
        let filter = FilterConfig::new().with_search("SHIP");
        assert!(filter.matches(&record("Ship release", &[], None)));
        assert!(!filter.matches(&record("Buy milk", &[], None)));
    }

    #[test]
    fn test_text_predicate_matches_tags_too() {
        let filter = FilterConfig::new().with_search("urg");
        assert!(filter.matches(&record("Untitled", &["Urgent"], None)));
    }

    #[test]
    fn test_tag_predicate_or_within_set() {
        let filter = FilterConfig::new()
            .with_tag("work")
            .with_tag("urgent");
        assert!(filter.matches(&record("a", &["urgent"], None)));
        assert!(!filter.matches(&record("b", &["home"], None)));
    }

    #[test]
    fn test_and_across_categories() {
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = FilterConfig::new().with_tag("work").since(from);
        // Matches the tag predicate but fails the date-range predicate.
        let too_old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(!filter.matches(&record("a", &["work"], Some(too_old))));
        let in_range = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        assert!(filter.matches(&record("b", &["work"], Some(in_range))));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let bound = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = FilterConfig::new().since(bound).until(bound);
        assert!(filter.matches(&record("exact", &[], Some(bound))));
    }

    #[test]
    fn test_range_excludes_records_without_timestamp() {
        let bound = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = FilterConfig::new().since(bound);
        assert!(!filter.matches(&record("dateless", &[], None)));
    }

    #[test]
    fn test_flag_toggle() {
        let filter = FilterConfig::new().require_flag("pinned");
        let mut pinned = record("a", &[], None);
        pinned.pinned = true;
        assert!(filter.matches(&pinned));
        assert!(!filter.matches(&record("b", &[], None)));
    }

    #[test]
    fn test_unknown_flag_excludes() {
        let filter = FilterConfig::new().require_flag("starred");
        assert!(!filter.matches(&record("a", &[], None)));
    }

    #[test]
    fn test_filter_config_round_trips_through_json() {
        let filter = FilterConfig::new().with_search("x").with_tag("work");
        let json = serde_json::to_string(&filter).unwrap();
        let back: FilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(filter, back);
    }
}
