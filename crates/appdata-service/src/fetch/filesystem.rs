//! Support to fetch collections from the local filesystem.
//!
//! Every collection lives in a `<collection>.json` file inside one directory. This is usually
//! only used for testing and offline work.

use std::path::PathBuf;

use anyhow::Context;
use futures::future::BoxFuture;

use crate::collections::CollectionKind;

use super::{FetchResult, Fetcher};

/// Fetcher implementation reading collections from a directory.
#[derive(Debug, Clone)]
pub struct FilesystemFetcher {
    path: PathBuf,
}

impl FilesystemFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the given collection is read from.
    pub fn collection_path(&self, kind: CollectionKind) -> PathBuf {
        self.path.join(format!("{kind}.json"))
    }

    async fn read_collection(&self, kind: CollectionKind) -> FetchResult {
        let path = self.collection_path(kind);
        tracing::debug!("Fetching {} from {:?}", kind, path);

        let contents = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

impl Fetcher for FilesystemFetcher {
    fn fetch_categories(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(self.read_collection(CollectionKind::Categories))
    }

    fn fetch_groups(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(self.read_collection(CollectionKind::Groups))
    }

    fn fetch_filters(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(self.read_collection(CollectionKind::Filters))
    }
}
