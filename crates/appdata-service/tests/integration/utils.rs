use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{self, BoxFuture};
use serde_json::Value;

use appdata_service::collections::{CollectionKind, CollectionManager, Record};
use appdata_service::config::CollectionsConfig;
use appdata_service::fetch::{FetchResult, Fetcher};

/// What the [`StubFetcher`] answers for a collection.
#[derive(Clone, Debug)]
pub enum StubResponse {
    Records(Vec<Record>),
    Failure(String),
    /// Never completes.
    Hang,
}

/// A [`Fetcher`] with canned responses that counts how often each collection was fetched.
pub struct StubFetcher {
    responses: Mutex<[StubResponse; 3]>,
    calls: [AtomicUsize; 3],
    delay: Duration,
}

impl StubFetcher {
    /// Creates a fetcher that answers every collection with an empty list.
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    /// Creates a fetcher whose responses take `delay` to arrive.
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        let empty = StubResponse::Records(vec![]);
        Arc::new(Self {
            responses: Mutex::new([empty.clone(), empty.clone(), empty]),
            calls: Default::default(),
            delay,
        })
    }

    pub fn respond(&self, kind: CollectionKind, response: StubResponse) {
        self.responses.lock().unwrap()[kind as usize] = response;
    }

    /// Responds with the records in the given JSON array.
    pub fn respond_json(&self, kind: CollectionKind, records: Value) {
        self.respond(kind, StubResponse::Records(records_from_json(records)));
    }

    pub fn fail(&self, kind: CollectionKind, reason: &str) {
        self.respond(kind, StubResponse::Failure(reason.to_owned()));
    }

    /// The number of times the collection was fetched.
    pub fn calls(&self, kind: CollectionKind) -> usize {
        self.calls[kind as usize].load(Ordering::SeqCst)
    }

    fn fetch_stub(&self, kind: CollectionKind) -> BoxFuture<'_, FetchResult> {
        self.calls[kind as usize].fetch_add(1, Ordering::SeqCst);
        let response = self.responses.lock().unwrap()[kind as usize].clone();
        let delay = self.delay;

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match response {
                StubResponse::Records(records) => Ok(records),
                StubResponse::Failure(reason) => Err(anyhow::anyhow!(reason)),
                StubResponse::Hang => future::pending().await,
            }
        })
    }
}

impl Fetcher for StubFetcher {
    fn fetch_categories(&self) -> BoxFuture<'_, FetchResult> {
        self.fetch_stub(CollectionKind::Categories)
    }

    fn fetch_groups(&self) -> BoxFuture<'_, FetchResult> {
        self.fetch_stub(CollectionKind::Groups)
    }

    fn fetch_filters(&self) -> BoxFuture<'_, FetchResult> {
        self.fetch_stub(CollectionKind::Filters)
    }
}

pub fn records_from_json(records: Value) -> Vec<Record> {
    serde_json::from_value(records).unwrap()
}

/// Collects the `id`s of the given records.
pub fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().filter_map(Record::id).collect()
}

/// Setup tests and create a manager backed by the given fetcher.
///
/// The `update_config` closure can modify the default configuration if needed.
pub fn setup_manager(
    fetcher: &Arc<StubFetcher>,
    update_config: impl FnOnce(&mut CollectionsConfig),
) -> Arc<CollectionManager> {
    appdata_test::setup();

    let mut config = CollectionsConfig::default();
    update_config(&mut config);

    Arc::new(CollectionManager::from_config(fetcher.clone(), &config))
}
