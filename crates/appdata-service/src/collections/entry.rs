use std::time::Duration;

use tokio::time::Instant;

use super::Collection;

/// The cached state of one collection.
#[derive(Debug, Clone)]
pub(super) struct CollectionEntry {
    /// The records of the last successful fetch, in the order they were received.
    pub data: Collection,
    /// When the last successful fetch completed.
    pub last_updated: Option<Instant>,
    /// Whether a fetch for this collection is currently running.
    pub in_flight: bool,
}

impl Default for CollectionEntry {
    fn default() -> Self {
        Self {
            data: Collection::from([]),
            last_updated: None,
            in_flight: false,
        }
    }
}

impl CollectionEntry {
    /// Whether the data may be served without fetching, i.e. it is younger than `threshold`.
    pub fn is_fresh(&self, threshold: Duration, now: Instant) -> bool {
        self.last_updated
            .is_some_and(|updated| now.saturating_duration_since(updated) < threshold)
    }

    /// Whether the data was never fetched or is older than `max_age`.
    pub fn is_stale(&self, max_age: Duration, now: Instant) -> bool {
        match self.last_updated {
            Some(updated) => now.saturating_duration_since(updated) > max_age,
            None => true,
        }
    }

    /// Forgets the data and when it was fetched. A running fetch is left alone.
    pub fn clear(&mut self) {
        self.data = Collection::from([]);
        self.last_updated = None;
    }

    pub fn commit(&mut self, data: Collection, now: Instant) {
        self.data = data;
        self.last_updated = Some(now);
    }
}
