//! # Collection cache
//!
//! The management UI displays three remote collections: categories, groups and filters.
//! Fetching them is slow, so they are cached in memory by the [`CollectionManager`], which
//! decides for every request whether to serve cached data or to go through the [`Fetcher`].
//!
//! ## Freshness
//!
//! Every collection remembers when it was last fetched successfully. Data younger than the
//! freshness threshold (`collections.freshness_threshold`, default 5 minutes) is served from
//! memory. Older data is fetched again on the next [`get_collection`] call, and
//! [`is_stale`] reports it as stale.
//!
//! A failed fetch never touches the cached data or its timestamp, so readers keep seeing the
//! last good state.
//!
//! ## Concurrency
//!
//! At most one fetch per collection runs at a time. There is no request coalescing: a
//! [`get_collection`] call for a collection that is already loading fails right away with
//! [`CollectionError::AlreadyLoading`]. Different collections are fully independent, which is
//! what allows [`refresh_all`] to fetch all of them concurrently.
//!
//! The UI reads through [`get_cached_collection`], which never blocks on the network and never
//! fails. It may observe data from either side of a concurrently completing fetch.
//!
//! ## Validation
//!
//! Before anything is committed, every record must carry an `id` and a `displayName`. Records
//! failing that check reject the whole fetch with [`CollectionError::InvalidData`].
//!
//! ## Invalidation
//!
//! Components that modify a collection signal it through an [`InvalidationHandle`], obtained
//! from [`spawn_invalidation_listener`]. The collection is then marked stale and refreshed in
//! the background. [`clear_all`] and [`reinitialize_after_auth_change`] drop everything when
//! the credentials change.
//!
//! ## Metrics
//!
//! All metrics are tagged with a `collection` field:
//!
//! - `collections.access`: All accesses.
//! - `collections.memory.hit`: Accesses served from memory.
//! - `collections.already_loading`: Accesses rejected because a fetch was running.
//! - `collections.fetch`: Completed fetches, tagged with a `status`.
//! - `collections.fetch.duration`: Time spent in the fetcher.
//! - `collections.size`: Number of records of the last committed fetch.
//!
//! [`Fetcher`]: crate::fetch::Fetcher
//! [`get_collection`]: CollectionManager::get_collection
//! [`get_cached_collection`]: CollectionManager::get_cached_collection
//! [`is_stale`]: CollectionManager::is_stale
//! [`refresh_all`]: CollectionManager::refresh_all
//! [`clear_all`]: CollectionManager::clear_all
//! [`reinitialize_after_auth_change`]: CollectionManager::reinitialize_after_auth_change
//! [`spawn_invalidation_listener`]: CollectionManager::spawn_invalidation_listener

mod entry;
mod error;
mod invalidation;
mod kind;
mod manager;
mod record;

pub use error::{CollectionError, RefreshError};
pub use invalidation::InvalidationHandle;
pub use kind::{CollectionKind, ParseCollectionKindError};
pub use manager::{CollectionManager, CollectionResult};
pub use record::{Collection, DISPLAY_NAME_KEY, ID_KEY, Record, validate};
