use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;
use serde_json::json;

use appdata_service::collections::{CollectionError, CollectionKind, CollectionManager};
use appdata_service::config::{FilesystemSourceConfig, SourceConfig};
use appdata_service::fetch::{self, FilesystemFetcher, HttpFetcher};
use appdata_test::CollectionServer;

use crate::ids;

#[tokio::test]
async fn test_filesystem_source() {
    appdata_test::setup();
    let fetcher = FilesystemFetcher::new(appdata_test::fixture("collections"));
    let manager = CollectionManager::new(Arc::new(fetcher));

    manager.refresh_all().await.unwrap();

    assert_eq!(manager.get_cached_collection(CollectionKind::Categories).len(), 3);
    assert_eq!(manager.get_cached_collection(CollectionKind::Groups).len(), 2);
    assert_eq!(manager.get_cached_collection(CollectionKind::Filters).len(), 4);
    assert_eq!(
        ids(&manager.get_cached_collection(CollectionKind::Groups)),
        ["grp-engineering", "grp-sales"]
    );
}

#[tokio::test]
async fn test_source_from_config() {
    appdata_test::setup();
    let source = SourceConfig::Filesystem(FilesystemSourceConfig {
        path: appdata_test::fixture("collections"),
    });
    let manager = CollectionManager::new(fetch::from_config(&source).unwrap());

    let categories = manager
        .get_collection(CollectionKind::Categories, false)
        .await
        .unwrap();

    assert_eq!(
        ids(&categories),
        ["cat-productivity", "cat-developer", "cat-security"]
    );
}

#[tokio::test]
async fn test_http_source_is_cached() {
    appdata_test::setup();
    let server = CollectionServer::new(BTreeMap::from([
        (
            "categories".to_owned(),
            json!([{"id": "c1", "displayName": "Productivity"}]),
        ),
        ("groups".to_owned(), json!([])),
        ("filters".to_owned(), json!([])),
    ]));
    let fetcher = HttpFetcher::new(Client::new(), server.url("api/"), None);
    let manager = CollectionManager::new(Arc::new(fetcher));

    let first = manager
        .get_collection(CollectionKind::Categories, false)
        .await
        .unwrap();
    let second = manager
        .get_collection(CollectionKind::Categories, false)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(server.all_hits(), [("/api/categories".to_owned(), 1)]);

    manager
        .get_collection(CollectionKind::Categories, true)
        .await
        .unwrap();
    assert_eq!(server.accesses(), 1);
}

#[tokio::test]
async fn test_http_invalid_records() {
    appdata_test::setup();
    let server = CollectionServer::new(BTreeMap::from([(
        "filters".to_owned(),
        json!([{"id": "f1", "name": "Managed"}]),
    )]));
    let fetcher = HttpFetcher::new(Client::new(), server.url("api"), None);
    let manager = CollectionManager::new(Arc::new(fetcher));

    let err = manager
        .get_collection(CollectionKind::Filters, false)
        .await
        .unwrap_err();

    insta::assert_snapshot!(err, @"invalid filters data: record 0 is missing `displayName`");
    assert!(manager.is_stale(CollectionKind::Filters));
}

#[tokio::test]
async fn test_http_missing_collection() {
    appdata_test::setup();
    let server = CollectionServer::new(BTreeMap::new());
    let fetcher = HttpFetcher::new(Client::new(), server.url("api"), None);
    let manager = CollectionManager::new(Arc::new(fetcher));

    let err = manager
        .get_collection(CollectionKind::Groups, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CollectionError::FetchFailed {
            kind: CollectionKind::Groups,
            ..
        }
    ));
    // not found is not retried
    assert_eq!(server.accesses(), 1);
}
