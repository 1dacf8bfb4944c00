//! Integration tests driving the query interface through a live store:
//! filtered views, facets, and ranked search tracking mutations.

use cardbox::{Config, FilterConfig, RecordDraft, RecordPatch, RecordStore, SortKey};
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

fn seeded_store(dir: &std::path::Path) -> RecordStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = RecordStore::open(Config::in_dir(dir, "querybox")).unwrap();
    store
        .create(
            RecordDraft::new("Buy milk")
                .with_tag("home")
                .occurred_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
        )
        .unwrap();
    store
        .create(
            RecordDraft::new("Ship release")
                .with_tags(vec!["work".to_string(), "urgent".to_string()])
                .pinned(true)
                .occurred_at(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()),
        )
        .unwrap();
    store
        .create(
            RecordDraft::new("Plan offsite")
                .with_tag("work")
                .occurred_at(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()),
        )
        .unwrap();
    store
}

fn titles(view: &[&cardbox::Record]) -> Vec<String> {
    view.iter().map(|r| r.title.clone()).collect()
}

#[test]
fn test_filtered_view_combines_predicates_over_live_store() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(tmp.path());

    // Tag OR within the set, AND with the date range.
    let filter = FilterConfig::new()
        .with_tag("home")
        .with_tag("urgent")
        .since(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
    let view = store.filtered_view(&filter, &SortKey::Updated);
    assert_eq!(titles(&view), vec!["Ship release"]);
}

#[test]
fn test_identity_filter_lists_active_in_sort_order() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(tmp.path());

    let view = store.filtered_view(
        &FilterConfig::new(),
        &SortKey::FlagFirst("pinned".to_string()),
    );
    assert_eq!(view.len(), 3);
    assert_eq!(view[0].title, "Ship release");
}

#[test]
fn test_view_tracks_mutations() {
    let tmp = tempdir().unwrap();
    let mut store = seeded_store(tmp.path());

    let filter = FilterConfig::new().with_tag("work");
    assert_eq!(store.filtered_view(&filter, &SortKey::Title).len(), 2);

    let offsite = store
        .filtered_view(&FilterConfig::new().with_search("offsite"), &SortKey::Updated)[0]
        .id
        .clone();
    store
        .update(&offsite, RecordPatch::new().tags(vec!["home".to_string()]))
        .unwrap();
    assert_eq!(store.filtered_view(&filter, &SortKey::Title).len(), 1);
}

#[test]
fn test_archived_records_leave_the_view_but_keep_their_facets() {
    let tmp = tempdir().unwrap();
    let mut store = seeded_store(tmp.path());

    let milk = store.records()[0].id.clone();
    store.archive(&milk).unwrap();

    let view = store.filtered_view(&FilterConfig::new(), &SortKey::Updated);
    assert_eq!(view.len(), 2);
    assert!(!titles(&view).contains(&"Buy milk".to_string()));

    // Facets span active plus archived.
    let facets = store.facets();
    let tags: Vec<&str> = facets.iter().map(|f| f.tag.as_str()).collect();
    assert_eq!(tags, vec!["home", "urgent", "work"]);
}

#[test]
fn test_deleting_the_last_holder_drops_the_facet() {
    let tmp = tempdir().unwrap();
    let mut store = seeded_store(tmp.path());

    let milk = store.records()[0].id.clone();
    store.delete(&milk).unwrap();

    let tags: Vec<String> = store.facets().into_iter().map(|f| f.tag).collect();
    assert!(!tags.contains(&"home".to_string()));
}

#[test]
fn test_facet_counts_follow_tag_edits() {
    let tmp = tempdir().unwrap();
    let mut store = seeded_store(tmp.path());

    let work_count = |store: &RecordStore| {
        store
            .facets()
            .into_iter()
            .find(|f| f.tag == "work")
            .map(|f| f.count)
            .unwrap_or(0)
    };
    assert_eq!(work_count(&store), 2);

    let release = store.records()[1].id.clone();
    store
        .update(&release, RecordPatch::new().tags(vec!["done".to_string()]))
        .unwrap();
    assert_eq!(work_count(&store), 1);
}

#[test]
fn test_ranked_search_through_the_store() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(tmp.path());

    let results = store.ranked_search("release", 10);
    assert_eq!(results[0].title, "Ship release");

    assert!(store.ranked_search("zzzz", 10).is_empty());
}

#[test]
fn test_view_is_deterministic_across_invocations() {
    let tmp = tempdir().unwrap();
    let store = seeded_store(tmp.path());

    let filter = FilterConfig::new().with_search("i");
    let first = titles(&store.filtered_view(&filter, &SortKey::Title));
    for _ in 0..5 {
        assert_eq!(titles(&store.filtered_view(&filter, &SortKey::Title)), first);
    }
}
