mod common;

use common::references_of;
use phpscope_api::Cache;
use phpscope_api::cache::references_key;
use phpscope_api::models::{ReferenceTableSummary, SymbolKind, uri_hash};
use phpscope_core::cache::codec;
use phpscope_core::{BucketFileCache, MemoryCache, ReferenceStore};
use std::sync::Arc;

#[tokio::test]
async fn given_open_table_when_closed_then_fetch_restores_it_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Arc<dyn Cache> = Arc::new(BucketFileCache::new(dir.path()).unwrap());
    let store = ReferenceStore::new(cache.clone());

    let table = references_of(
        "file:///a.php",
        &[(SymbolKind::Class, "App\\Widget"), (SymbolKind::Method, "run")],
    );
    store.add(table.clone());
    assert!(store.is_open("file:///a.php"));

    assert!(store.close("file:///a.php").await.unwrap());
    assert!(!store.is_open("file:///a.php"));
    assert!(store.summary("file:///a.php").is_some());

    let fetched = store.fetch("file:///a.php").await.expect("cached table");
    assert_eq!(*fetched, table);
    assert!(cache.read(&references_key("file:///a.php")).await.unwrap().is_some());

    // closing twice is a no-op
    assert!(!store.close("file:///a.php").await.unwrap());
}

#[tokio::test]
async fn given_mixed_case_names_when_found_then_case_sensitivity_follows_kind() {
    let store = ReferenceStore::new(Arc::new(MemoryCache::new()));
    store.add(references_of(
        "file:///a.php",
        &[
            (SymbolKind::Method, "Run"),
            (SymbolKind::Property, "$Count"),
            (SymbolKind::Property, "$count"),
        ],
    ));
    store.add(references_of("file:///b.php", &[(SymbolKind::Method, "run")]));

    let methods = store.find("run", |r| r.kind == SymbolKind::Method).await;
    let uris: Vec<_> = methods.iter().map(|r| r.location.uri.as_str()).collect();
    assert_eq!(uris, vec!["file:///a.php", "file:///b.php"]);

    let props = store.find("$count", |r| r.kind == SymbolKind::Property).await;
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].name, "$count");
}

#[tokio::test]
async fn given_two_files_when_one_removed_then_other_summary_still_matches() {
    let store = ReferenceStore::new(Arc::new(MemoryCache::new()));
    store.add(references_of("file:///a.php", &[(SymbolKind::Function, "shared")]));
    store.add(references_of(
        "file:///b.php",
        &[(SymbolKind::Function, "shared"), (SymbolKind::Function, "only_b")],
    ));
    assert_eq!(store.candidate_uris("SHARED").len(), 2);

    store.remove("file:///a.php");
    assert_eq!(store.candidate_uris("shared"), vec!["file:///b.php"]);
    assert_eq!(store.candidate_uris("only_b"), vec!["file:///b.php"]);
    assert!(store.get("file:///a.php").is_none());
    assert_eq!(store.summaries().len(), 1);
}

#[tokio::test]
async fn given_summary_without_cached_table_when_found_then_file_is_skipped() {
    let cache = Arc::new(MemoryCache::new());
    let store = ReferenceStore::with_fetch_window(cache.clone(), 2);

    let evicted = references_of("file:///gone.php", &[(SymbolKind::Class, "Foo")]);
    codec::write_reference_table(cache.as_ref(), &evicted).await.unwrap();
    store.add_summary(evicted.summary());
    store.add_summary(ReferenceTableSummary {
        uri: "file:///missing.php".into(),
        hash: uri_hash("file:///missing.php"),
        identifiers: vec!["foo".into()],
    });
    store.add(references_of("file:///open.php", &[(SymbolKind::Class, "foo")]));

    let found = store.find("Foo", |_| true).await;
    let uris: Vec<_> = found.iter().map(|r| r.location.uri.as_str()).collect();
    assert_eq!(uris, vec!["file:///gone.php", "file:///open.php"]);
}
