//! Fetchers deliver the raw records of a collection.
//!
//! A [`Fetcher`] neither validates the records nor knows anything about freshness, both of
//! these are the business of the [`CollectionManager`](crate::collections::CollectionManager).
//! Timeouts and retries, on the other hand, are the fetcher's responsibility.

use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;

use crate::collections::{CollectionKind, Record};
use crate::config::SourceConfig;

mod filesystem;
mod http;

pub use self::filesystem::FilesystemFetcher;
pub use self::http::HttpFetcher;

/// The `User-Agent` sent with every outgoing request.
pub const USER_AGENT: &str = concat!("appdata/", env!("CARGO_PKG_VERSION"));

/// The result of fetching one collection.
pub type FetchResult = Result<Vec<Record>>;

/// The remote-call contract the collection cache depends on.
///
/// Collections are scoped to the current tenant and credentials implicitly, so the fetch
/// methods take no arguments.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch_categories(&self) -> BoxFuture<'_, FetchResult>;

    fn fetch_groups(&self) -> BoxFuture<'_, FetchResult>;

    fn fetch_filters(&self) -> BoxFuture<'_, FetchResult>;

    /// Dispatches to the fetch method of the given collection.
    fn fetch(&self, kind: CollectionKind) -> BoxFuture<'_, FetchResult> {
        match kind {
            CollectionKind::Categories => self.fetch_categories(),
            CollectionKind::Groups => self.fetch_groups(),
            CollectionKind::Filters => self.fetch_filters(),
        }
    }
}

/// Creates the fetcher described by the given source configuration.
pub fn from_config(source: &SourceConfig) -> Result<Arc<dyn Fetcher>> {
    let fetcher: Arc<dyn Fetcher> = match source {
        SourceConfig::Http(config) => Arc::new(HttpFetcher::from_config(config)?),
        SourceConfig::Filesystem(config) => Arc::new(FilesystemFetcher::new(config.path.clone())),
    };
    Ok(fetcher)
}
