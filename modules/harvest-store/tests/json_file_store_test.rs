//! JsonFileStore against a real temp directory.

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use harvest_common::{normalize_item, CommentRecord, PageRequest};
use harvest_store::{CommentStore, JsonFileStore, StoreError};
use serde_json::json;

fn batch(run_id: &str, n: usize, minutes_ago: i64) -> Vec<CommentRecord> {
    let fetched_at =
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap() - Duration::minutes(minutes_ago);
    (0..n)
        .map(|i| {
            normalize_item(
                json!({"commentText": format!("{run_id}-{i}"), "likesCount": i}),
                run_id,
                &format!("ds-{run_id}"),
                fetched_at,
            )
        })
        .collect()
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nothing-here.json"));

    assert!(store.list_recent(PageRequest::default()).await.unwrap().is_empty());
    assert!(store.list_by_run("run-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_creates_parent_dirs_and_round_trips_raw() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("comments.json");
    let store = JsonFileStore::new(&path);

    let records = batch("run-1", 3, 0);
    assert_eq!(store.insert_many(&records).await.unwrap(), 3);
    assert!(path.exists());

    let stored = store.list_by_run("run-1").await.unwrap();
    assert_eq!(stored, records);
}

#[tokio::test]
async fn appends_across_runs_and_pages_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("comments.json"));

    store.insert_many(&batch("old", 4, 30)).await.unwrap();
    store.insert_many(&batch("new", 3, 0)).await.unwrap();

    let first = store.list_recent(PageRequest::new(Some(0), Some(5))).await.unwrap();
    assert_eq!(first.len(), 5);
    assert!(first[..3].iter().all(|r| r.run_id == "new"));
    assert!(first[3..].iter().all(|r| r.run_id == "old"));

    let second = store.list_recent(PageRequest::new(Some(1), Some(5))).await.unwrap();
    assert_eq!(second.len(), 2);

    let ids: HashSet<_> = first.iter().chain(second.iter()).map(|r| r.id).collect();
    assert_eq!(ids.len(), 7, "pages must not overlap");
}

#[tokio::test]
async fn list_by_run_keeps_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("comments.json"));

    let run = batch("run-a", 3, 0);
    store.insert_many(&run).await.unwrap();
    store.insert_many(&batch("run-b", 2, 0)).await.unwrap();

    let texts: Vec<_> = store
        .list_by_run("run-a")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.comment_text.unwrap())
        .collect();
    assert_eq!(texts, vec!["run-a-0", "run-a-1", "run-a-2"]);
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comments.json");
    std::fs::write(&path, "{ not an array").unwrap();
    let store = JsonFileStore::new(&path);

    let err = store.list_recent(PageRequest::default()).await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn concurrent_inserts_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(JsonFileStore::new(dir.path().join("comments.json")));

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.insert_many(&batch(&format!("run-{i}"), 5, 0)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let all = store.list_recent(PageRequest::new(Some(0), Some(100))).await.unwrap();
    assert_eq!(all.len(), 40);
}
