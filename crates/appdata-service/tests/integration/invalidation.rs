use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use appdata_service::collections::CollectionKind;

use crate::{StubFetcher, ids, setup_manager};

/// Polls until the condition holds, giving spawned tasks a chance to run in between.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_keeps_data() {
    let fetcher = StubFetcher::new();
    fetcher.respond_json(
        CollectionKind::Groups,
        json!([{"id": "g1", "displayName": "Sales"}]),
    );
    let manager = setup_manager(&fetcher, |_| ());
    manager
        .get_collection(CollectionKind::Groups, false)
        .await
        .unwrap();

    manager.invalidate(CollectionKind::Groups);

    assert!(manager.is_stale(CollectionKind::Groups));
    assert_eq!(
        ids(&manager.get_cached_collection(CollectionKind::Groups)),
        ["g1"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_handle_change_refreshes() {
    let fetcher = StubFetcher::new();
    fetcher.respond_json(
        CollectionKind::Groups,
        json!([{"id": "g1", "displayName": "Sales"}]),
    );
    let manager = setup_manager(&fetcher, |_| ());
    manager
        .get_collection(CollectionKind::Groups, false)
        .await
        .unwrap();

    fetcher.respond_json(
        CollectionKind::Groups,
        json!([
            {"id": "g1", "displayName": "Sales"},
            {"id": "g2", "displayName": "Marketing"},
        ]),
    );
    manager.handle_change(CollectionKind::Groups).await;

    assert_eq!(fetcher.calls(CollectionKind::Groups), 2);
    assert!(!manager.is_stale(CollectionKind::Groups));
    assert_eq!(
        ids(&manager.get_cached_collection(CollectionKind::Groups)),
        ["g1", "g2"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_handle_change_failure_leaves_stale() {
    let fetcher = StubFetcher::new();
    fetcher.respond_json(
        CollectionKind::Filters,
        json!([{"id": "f1", "displayName": "Managed"}]),
    );
    let manager = setup_manager(&fetcher, |_| ());
    manager
        .get_collection(CollectionKind::Filters, false)
        .await
        .unwrap();

    fetcher.fail(CollectionKind::Filters, "connection refused");
    manager.handle_change(CollectionKind::Filters).await;

    assert!(manager.is_stale(CollectionKind::Filters));
    assert_eq!(
        ids(&manager.get_cached_collection(CollectionKind::Filters)),
        ["f1"]
    );

    // the next regular access fetches again instead of serving the invalidated data
    fetcher.respond_json(CollectionKind::Filters, json!([]));
    manager
        .get_collection(CollectionKind::Filters, false)
        .await
        .unwrap();
    assert_eq!(fetcher.calls(CollectionKind::Filters), 3);
}

#[tokio::test(start_paused = true)]
async fn test_handle_change_while_loading() {
    let fetcher = StubFetcher::with_delay(Duration::from_secs(1));
    let manager = setup_manager(&fetcher, |_| ());

    let (loaded, _) = tokio::join!(
        manager.get_collection(CollectionKind::Categories, false),
        manager.handle_change(CollectionKind::Categories),
    );

    // the change is swallowed, the running fetch still commits
    assert!(loaded.is_ok());
    assert_eq!(fetcher.calls(CollectionKind::Categories), 1);
    assert!(!manager.is_stale(CollectionKind::Categories));
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_listener() {
    let fetcher = StubFetcher::new();
    let manager = setup_manager(&fetcher, |_| ());
    manager.refresh_all().await.unwrap();

    let handle = manager.spawn_invalidation_listener();
    fetcher.respond_json(
        CollectionKind::Categories,
        json!([{"id": "c9", "displayName": "Finance"}]),
    );
    handle.notify_changed(CollectionKind::Categories);

    wait_until(|| fetcher.calls(CollectionKind::Categories) == 2).await;
    wait_until(|| !manager.get_cached_collection(CollectionKind::Categories).is_empty()).await;

    assert_eq!(
        ids(&manager.get_cached_collection(CollectionKind::Categories)),
        ["c9"]
    );
    assert_eq!(fetcher.calls(CollectionKind::Groups), 1);
    assert_eq!(fetcher.calls(CollectionKind::Filters), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_handles_are_shared() {
    let fetcher = StubFetcher::new();
    let manager = setup_manager(&fetcher, |_| ());

    let handle = manager.spawn_invalidation_listener();
    let cloned = handle.clone();
    handle.notify_changed(CollectionKind::Groups);
    cloned.notify_changed(CollectionKind::Filters);

    wait_until(|| {
        fetcher.calls(CollectionKind::Groups) == 1 && fetcher.calls(CollectionKind::Filters) == 1
    })
    .await;
    assert_eq!(fetcher.calls(CollectionKind::Categories), 0);
}

#[tokio::test]
async fn test_listener_shuts_down_with_handles() {
    let fetcher = StubFetcher::new();
    let manager = setup_manager(&fetcher, |_| ());

    let handle = manager.spawn_invalidation_listener();
    assert_eq!(Arc::strong_count(&manager), 2);
    drop(handle);

    // the listener task holds the last extra reference until it exits
    wait_until(|| Arc::strong_count(&manager) == 1).await;
}
