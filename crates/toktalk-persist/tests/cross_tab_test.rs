use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::RwLock;
use toktalk_persist::{
    CrossTabNotifier, FileStore, KeyValueStore, MemoryStore, RequestStore, StoreBuilder, MIN_POLL_INTERVAL,
};
use toktalk_types::{CounselingRequest, CounselorType, SessionSelection};

fn request(name: &str, class_name: &str, second: u32) -> CounselingRequest {
    let selection = SessionSelection::new(name, "친구와 싸웠어요", CounselorType::HomeroomTeacher).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, second).unwrap();
    CounselingRequest::new(&selection, "요약", class_name, at)
}

async fn wait_for_change(rx: &mut tokio::sync::watch::Receiver<u64>) {
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("no change within timeout")
        .expect("notifier stopped");
}

#[tokio::test]
async fn test_requests_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let requests = vec![request("민수", "3학년 2반", 2), request("지아", "1반", 1)];

    {
        let store = StoreBuilder::new().data_dir(dir.path()).build().await.unwrap();
        store.save_requests(&requests).await.unwrap();
        store.save_active_class("3학년 2반").await.unwrap();
    }

    let reopened = StoreBuilder::new().data_dir(dir.path()).build().await.unwrap();
    let snapshot = reopened.snapshot().await.unwrap();

    assert_eq!(snapshot.requests, requests);
    assert_eq!(snapshot.active_class.as_deref(), Some("3학년 2반"));
}

#[tokio::test]
async fn test_other_tab_write_replaces_state() {
    let first = MemoryStore::new();
    let second = first.open_tab();
    let store_a = RequestStore::new(Arc::new(first));
    let store_b = RequestStore::new(Arc::new(second));

    let shared = Arc::new(RwLock::new(Vec::new()));
    let notifier = CrossTabNotifier::spawn(&store_a, shared.clone());
    let mut changes = notifier.changes();

    let written = vec![request("민수", "3학년 2반", 1)];
    store_b.save_requests(&written).await.unwrap();

    wait_for_change(&mut changes).await;
    assert_eq!(*shared.read().await, written);
}

#[tokio::test]
async fn test_own_writes_do_not_notify() {
    let backend = MemoryStore::new();
    let store = RequestStore::new(Arc::new(backend));
    let shared = Arc::new(RwLock::new(Vec::new()));
    let notifier = CrossTabNotifier::spawn(&store, shared.clone());
    let changes = notifier.changes();

    store.save_requests(&[request("민수", "1반", 1)]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!changes.has_changed().unwrap());
    assert!(shared.read().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_writers_last_one_wins() {
    // Two tabs each append to the list they loaded; the later write drops the other's record
    let first = MemoryStore::new();
    let second = first.open_tab();
    let store_a = RequestStore::new(Arc::new(first));
    let store_b = RequestStore::new(Arc::new(second));

    let mut list_a = store_a.load_requests().await.unwrap();
    let mut list_b = store_b.load_requests().await.unwrap();

    list_a.insert(0, request("가", "1반", 1));
    store_a.save_requests(&list_a).await.unwrap();

    list_b.insert(0, request("나", "1반", 2));
    store_b.save_requests(&list_b).await.unwrap();

    let stored = store_a.load_requests().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].student_name, "나");
}

#[tokio::test]
async fn test_external_process_write_is_observed() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreBuilder::new()
        .data_dir(dir.path())
        .poll_interval(Duration::from_millis(20))
        .build()
        .await
        .unwrap();
    let shared = Arc::new(RwLock::new(Vec::new()));
    let notifier = CrossTabNotifier::spawn(&store, shared.clone());
    let mut changes = notifier.changes();

    // A second handle on the same directory stands in for another process
    let other = StoreBuilder::new().data_dir(dir.path()).build().await.unwrap();
    let written = vec![request("지아", "2반", 3)];
    other.save_requests(&written).await.unwrap();

    wait_for_change(&mut changes).await;
    assert_eq!(*shared.read().await, written);
}

#[tokio::test]
async fn test_class_key_changes_leave_requests_alone() {
    let first = MemoryStore::new();
    let second = first.open_tab();
    let store_a = RequestStore::new(Arc::new(first));
    let shared = Arc::new(RwLock::new(vec![request("민수", "1반", 1)]));
    let notifier = CrossTabNotifier::spawn(&store_a, shared.clone());
    let changes = notifier.changes();

    second.set(toktalk_persist::ACTIVE_CLASS_KEY, "2반").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!changes.has_changed().unwrap());
    assert_eq!(shared.read().await.len(), 1);
}

#[tokio::test]
async fn test_other_process_repeating_an_old_own_value_is_observed() {
    let dir = tempfile::tempdir().unwrap();
    let store_a = StoreBuilder::new()
        .data_dir(dir.path())
        .poll_interval(Duration::from_millis(20))
        .build()
        .await
        .unwrap();
    let store_b = StoreBuilder::new().data_dir(dir.path()).build().await.unwrap();

    store_a.save_requests(&[]).await.unwrap();
    let shared = Arc::new(RwLock::new(Vec::new()));
    let notifier = CrossTabNotifier::spawn(&store_a, shared.clone());
    let mut changes = notifier.changes();
    // Let the watcher pick up A's own write before anyone else writes
    tokio::time::sleep(Duration::from_millis(100)).await;

    store_b.save_requests(&[request("지아", "2반", 1)]).await.unwrap();
    wait_for_change(&mut changes).await;
    assert_eq!(shared.read().await.len(), 1);

    // Same bytes A wrote earlier, this time from B
    store_b.save_requests(&[]).await.unwrap();
    wait_for_change(&mut changes).await;
    assert!(shared.read().await.is_empty());
    assert!(store_a.load_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_poll_interval_still_watches() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = FileStore::open(dir.path(), Duration::ZERO).await.unwrap();
    assert_eq!(file_store.poll_interval(), MIN_POLL_INTERVAL);

    let store = RequestStore::new(Arc::new(file_store));
    let shared = Arc::new(RwLock::new(Vec::new()));
    let notifier = CrossTabNotifier::spawn(&store, shared.clone());
    let mut changes = notifier.changes();

    let other = StoreBuilder::new().data_dir(dir.path()).build().await.unwrap();
    let written = vec![request("민수", "3학년 2반", 4)];
    other.save_requests(&written).await.unwrap();

    wait_for_change(&mut changes).await;
    assert_eq!(*shared.read().await, written);
}
