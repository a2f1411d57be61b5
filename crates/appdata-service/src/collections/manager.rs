use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future;
use tokio::time::Instant;

use crate::config::CollectionsConfig;
use crate::fetch::Fetcher;
use crate::utils::defer::defer;

use super::entry::CollectionEntry;
use super::{Collection, CollectionError, CollectionKind, Record, RefreshError, record};

/// The result of loading a single collection.
pub type CollectionResult = Result<Collection, CollectionError>;

/// Caches the remote collections and coordinates fetching them.
///
/// There is exactly one entry per [`CollectionKind`], each guarded by its own lock which is
/// never held across the fetch. At most one fetch per collection runs at any time; concurrent
/// requests for a collection that is already loading fail fast with
/// [`CollectionError::AlreadyLoading`] instead of waiting.
///
/// The manager is meant to be created once and shared via [`Arc`] for the lifetime of the
/// application.
pub struct CollectionManager {
    fetcher: Arc<dyn Fetcher>,
    freshness_threshold: Duration,
    fetch_timeout: Option<Duration>,
    entries: [Mutex<CollectionEntry>; 3],
}

impl std::fmt::Debug for CollectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionManager")
            .field("freshness_threshold", &self.freshness_threshold)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl CollectionManager {
    /// Creates a manager with empty entries and the default configuration.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::from_config(fetcher, &CollectionsConfig::default())
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &CollectionsConfig) -> Self {
        Self {
            fetcher,
            freshness_threshold: config.freshness_threshold,
            fetch_timeout: config.fetch_timeout,
            entries: Default::default(),
        }
    }

    /// The maximum age at which cached data is served without a new fetch.
    pub fn freshness_threshold(&self) -> Duration {
        self.freshness_threshold
    }

    pub(super) fn entry(&self, kind: CollectionKind) -> MutexGuard<'_, CollectionEntry> {
        self.entries[kind.index()].lock().unwrap()
    }

    /// Returns the collection, fetching it if needed.
    ///
    /// Fresh data is served from memory unless `force_refresh` is set. Otherwise the fetcher is
    /// invoked and its result validated and committed. On failure the cached data is left as it
    /// was.
    #[tracing::instrument(skip(self, kind), fields(collection = %kind))]
    pub async fn get_collection(
        &self,
        kind: CollectionKind,
        force_refresh: bool,
    ) -> CollectionResult {
        metric!(counter("collections.access") += 1, "collection" => kind.as_str());

        {
            let mut entry = self.entry(kind);
            if entry.in_flight {
                metric!(counter("collections.already_loading") += 1, "collection" => kind.as_str());
                tracing::debug!("Collection is already loading");
                return Err(CollectionError::AlreadyLoading(kind));
            }
            if !force_refresh && entry.is_fresh(self.freshness_threshold, Instant::now()) {
                metric!(counter("collections.memory.hit") += 1, "collection" => kind.as_str());
                return Ok(entry.data.clone());
            }
            entry.in_flight = true;
        }

        // Released on every exit path, including when this future is dropped mid-fetch.
        let _in_flight = defer(|| self.entry(kind).in_flight = false);

        let start = Instant::now();
        let result = self.fetch(kind).await;
        metric!(timer("collections.fetch.duration") = start.elapsed(), "collection" => kind.as_str());

        let result = result.and_then(|records| {
            record::validate(kind, &records)?;
            Ok(Collection::from(records))
        });

        metric!(
            counter("collections.fetch") += 1,
            "collection" => kind.as_str(),
            "status" => match &result {
                Ok(_) => "ok",
                Err(err) => err.metrics_tag(),
            },
        );

        match result {
            Ok(data) => {
                tracing::debug!(records = data.len(), "Fetched collection");
                metric!(gauge("collections.size") = data.len() as u64, "collection" => kind.as_str());
                self.entry(kind).commit(data.clone(), Instant::now());
                Ok(data)
            }
            Err(err) => {
                tracing::warn!(error = &err as &dyn std::error::Error, "Failed to load collection");
                Err(err)
            }
        }
    }

    /// Invokes the fetcher, bounded by the fetch timeout if one is configured.
    async fn fetch(&self, kind: CollectionKind) -> Result<Vec<Record>, CollectionError> {
        let future = self.fetcher.fetch(kind);
        let result = match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| CollectionError::Timeout {
                    kind,
                    after: timeout,
                })?,
            None => future.await,
        };

        result.map_err(|err| CollectionError::FetchFailed {
            kind,
            reason: format!("{err:#}"),
        })
    }

    /// Returns whatever is currently cached, without any freshness check.
    ///
    /// This never blocks on the network and never fails. If the collection was never fetched
    /// the returned collection is empty.
    pub fn get_cached_collection(&self, kind: CollectionKind) -> Collection {
        self.entry(kind).data.clone()
    }

    /// Returns `true` if the collection was never fetched or is older than the freshness
    /// threshold.
    pub fn is_stale(&self, kind: CollectionKind) -> bool {
        self.is_stale_after(kind, self.freshness_threshold)
    }

    /// Returns `true` if the collection was never fetched or is older than `max_age`.
    pub fn is_stale_after(&self, kind: CollectionKind, max_age: Duration) -> bool {
        self.entry(kind).is_stale(max_age, Instant::now())
    }

    /// Force-refreshes all collections concurrently.
    ///
    /// Fails if any of the collections fails, but the collections that were fetched
    /// successfully are committed nonetheless.
    pub async fn refresh_all(&self) -> Result<(), RefreshError> {
        let results = future::join_all(
            CollectionKind::ALL.map(|kind| self.get_collection(kind, true)),
        )
        .await;

        let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RefreshError::new(errors))
        }
    }

    /// Forgets all cached data.
    ///
    /// Fetches that are currently running are not affected and will still commit their result.
    pub fn clear_all(&self) {
        for kind in CollectionKind::ALL {
            self.entry(kind).clear();
        }
        tracing::debug!("Cleared all collections");
    }

    /// Drops all cached data and loads it again.
    ///
    /// Used when the credentials or tenant change and everything cached must be presumed
    /// invalid.
    pub async fn reinitialize_after_auth_change(&self) -> Result<(), RefreshError> {
        tracing::info!("Reinitializing collections after authentication change");
        self.clear_all();
        self.refresh_all().await
    }
}
