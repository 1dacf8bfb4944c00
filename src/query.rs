//! The collection query engine.
//!
//! Pure functions that turn a record slice plus a filter and sort
//! configuration into an ordered view of references. The engine is generic
//! over the [`Queryable`] accessor trait so the same filter, sort, and facet
//! logic serves every record shape rather than being rewritten per app.
//!
//! Recomputing with identical inputs yields an identical result; nothing here
//! mutates the underlying collection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use log::debug;

use crate::{fold, FacetCount, FilterConfig, SortKey};

/// Field accessors the query engine needs from a record type.
pub trait Queryable {
    /// Text fields searched by the text predicate and ranked search. The
    /// first entry is treated as the title and weighted double in ranking.
    fn text_fields(&self) -> Vec<&str>;

    /// The record's tag set.
    fn tags(&self) -> &[String];

    /// Domain timestamp used by the date-range predicate.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Named boolean flag; `None` for flags the type does not carry.
    fn flag(&self, name: &str) -> Option<bool>;

    /// Named numeric field; `None` when absent.
    fn numeric(&self, name: &str) -> Option<u64>;

    /// Title used by the title comparator.
    fn sort_title(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;
}

/// Produces the final ordered, filtered view over a collection.
///
/// Filtering is O(n · p) for p active predicate categories; sorting is a
/// stable O(n log n). The input slice's order is the base order, so equal-key
/// records keep their relative positions across invocations.
pub fn filtered_view<'a, T: Queryable>(
    records: &'a [T],
    filter: &FilterConfig,
    sort: &SortKey,
) -> Vec<&'a T> {
    let mut view: Vec<&T> = records.iter().filter(|r| filter.matches(*r)).collect();
    debug!(
        "Filtered {} of {} records, sorting by {}",
        view.len(),
        records.len(),
        sort
    );
    sort.sort_refs(&mut view);
    view
}

/// Computes the distinct tag values and their usage counts.
///
/// The result is ordered alphabetically (case-folded) for stable UI
/// presentation. Callers pass the full active-plus-archived collection;
/// tags whose owning records are gone do not linger.
pub fn facets<'a, T, I>(records: I) -> Vec<FacetCount>
where
    T: Queryable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        for tag in record.tags() {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .map(|(tag, count)| FacetCount { tag, count })
        .collect();
    facets.sort_by(|a, b| fold(&a.tag).cmp(&fold(&b.tag)).then_with(|| a.tag.cmp(&b.tag)));
    facets
}

/// Searches records by fuzzy relevance instead of exact substring.
///
/// The first text field (the title) is weighted twice as heavily as the
/// rest. Results come back most relevant first, ties broken by most recent
/// update; records with no match at all are omitted. At most `limit` records
/// are returned.
pub fn ranked_search<'a, T: Queryable>(records: &'a [T], query: &str, limit: usize) -> Vec<&'a T> {
    let matcher = SkimMatcherV2::default();

    struct Scored<'a, T> {
        record: &'a T,
        score: i64,
    }

    let mut matched: Vec<Scored<'a, T>> = Vec::new();
    for record in records {
        let fields = record.text_fields();
        let mut score = 0;
        for (index, field) in fields.iter().enumerate() {
            let field_score = matcher.fuzzy_match(field, query).unwrap_or(0);
            // Title matches are weighted more heavily
            score += if index == 0 { field_score * 2 } else { field_score };
        }
        if score > 0 {
            matched.push(Scored { record, score });
        }
    }

    debug!("Ranked search for '{}' matched {} records", query, matched.len());

    matched.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.record.updated_at().cmp(&a.record.updated_at()))
    });

    matched
        .into_iter()
        .take(limit)
        .map(|scored| scored.record)
        .collect()
}
