use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::CollectionKind;

/// An error that happens when loading a collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// A fetch for this collection is already running.
    ///
    /// This is transient, callers may try again later but should not retry immediately.
    #[error("{0} are already loading")]
    AlreadyLoading(CollectionKind),
    /// The fetcher failed to deliver any data.
    ///
    /// The attached reason contains the rendered error chain of the fetcher.
    #[error("failed to fetch {kind}: {reason}")]
    FetchFailed {
        kind: CollectionKind,
        reason: String,
    },
    /// The fetcher delivered data that failed validation.
    #[error("invalid {kind} data: {reason}")]
    InvalidData {
        kind: CollectionKind,
        reason: String,
    },
    /// The fetch did not complete within the configured fetch timeout.
    #[error("fetching {kind} timed out after {after:?}")]
    Timeout {
        kind: CollectionKind,
        after: Duration,
    },
}

impl CollectionError {
    /// The collection this error is about.
    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::AlreadyLoading(kind) => *kind,
            Self::FetchFailed { kind, .. }
            | Self::InvalidData { kind, .. }
            | Self::Timeout { kind, .. } => *kind,
        }
    }

    /// A short name for metric tags.
    pub(crate) fn metrics_tag(&self) -> &'static str {
        match self {
            Self::AlreadyLoading(_) => "already_loading",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::InvalidData { .. } => "invalid_data",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// The combined failure of refreshing several collections at once.
///
/// Collections that refreshed successfully are committed regardless, so a `RefreshError` does
/// not mean that no state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshError {
    errors: Vec<CollectionError>,
}

impl RefreshError {
    pub(crate) fn new(errors: Vec<CollectionError>) -> Self {
        Self { errors }
    }

    /// The individual failures, ordered by [`CollectionKind::ALL`].
    pub fn errors(&self) -> &[CollectionError] {
        &self.errors
    }

    /// Returns `true` if the given collection failed to refresh.
    pub fn failed(&self, kind: CollectionKind) -> bool {
        self.errors.iter().any(|err| err.kind() == kind)
    }
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to refresh collections")?;
        for (idx, err) in self.errors.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RefreshError {}
