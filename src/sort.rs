//! Named sort comparators over record collections.
//!
//! A [`SortKey`] selects one total-order comparator at query time. Every key
//! carries its conventional direction (recency keys descend, title ascends)
//! and breaks ties on `updated_at` descending. Full ties keep their original
//! relative order because the engine sorts with a stable sort.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{fold, Queryable};

/// Registry of named comparators selectable at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Last modification time, newest first (the default).
    #[default]
    Updated,
    /// Creation time, newest first.
    Created,
    /// Title, case-folded, ascending.
    Title,
    /// Records with the named flag true sort before the rest; within each
    /// group, newest update first. String forms: `pinned-first`,
    /// `favorite-first`, or `flag:<name>` for any other flag.
    FlagFirst(String),
    /// Named numeric field, largest first; records lacking the field last.
    /// String forms: `size`, or `numeric:<field>` for any other field.
    Numeric(String),
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Updated => write!(f, "updated"),
            Self::Created => write!(f, "created"),
            Self::Title => write!(f, "title"),
            Self::FlagFirst(flag) => match flag.as_str() {
                "pinned" => write!(f, "pinned-first"),
                "favorite" => write!(f, "favorite-first"),
                other => write!(f, "flag:{}", other),
            },
            Self::Numeric(field) => match field.as_str() {
                "size" => write!(f, "size"),
                other => write!(f, "numeric:{}", other),
            },
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "updated" => Ok(Self::Updated),
            "created" => Ok(Self::Created),
            "title" => Ok(Self::Title),
            "pinned-first" => Ok(Self::FlagFirst("pinned".to_string())),
            "favorite-first" => Ok(Self::FlagFirst("favorite".to_string())),
            "size" => Ok(Self::Numeric("size".to_string())),
            other => {
                if let Some(flag) = other.strip_prefix("flag:") {
                    if flag.is_empty() {
                        return Err("Empty flag name in sort key".to_string());
                    }
                    return Ok(Self::FlagFirst(flag.to_string()));
                }
                if let Some(field) = other.strip_prefix("numeric:") {
                    if field.is_empty() {
                        return Err("Empty field name in sort key".to_string());
                    }
                    return Ok(Self::Numeric(field.to_string()));
                }
                Err(format!("Invalid sort key: {}", s))
            }
        }
    }
}

impl SortKey {
    /// Compares two records under this key, tie-breaking on `updated_at`
    /// descending. Equal results must be left in their original order by the
    /// caller (stable sort).
    pub fn compare<T: Queryable>(&self, a: &T, b: &T) -> Ordering {
        let primary = match self {
            Self::Updated => b.updated_at().cmp(&a.updated_at()),
            Self::Created => b.created_at().cmp(&a.created_at()),
            Self::Title => fold(a.sort_title()).cmp(&fold(b.sort_title())),
            Self::FlagFirst(flag) => {
                let a_flag = a.flag(flag).unwrap_or(false);
                let b_flag = b.flag(flag).unwrap_or(false);
                b_flag.cmp(&a_flag)
            }
            Self::Numeric(field) => match (a.numeric(field), b.numeric(field)) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| b.updated_at().cmp(&a.updated_at()))
    }

    /// Stable-sorts a view of record references in place.
    pub fn sort_refs<T: Queryable>(&self, view: &mut [&T]) {
        view.sort_by(|a, b| self.compare(*a, *b));
    }
}
