use std::sync::Arc;

use tokio::sync::mpsc;

use super::{CollectionKind, CollectionManager};

impl CollectionManager {
    /// Marks the collection as stale without dropping its data.
    pub fn invalidate(&self, kind: CollectionKind) {
        self.entry(kind).last_updated = None;
    }

    /// Reacts to the collection having changed remotely.
    ///
    /// The collection is invalidated and force-refreshed right away. A failing refresh is only
    /// logged, the collection then stays stale until the next successful fetch.
    pub async fn handle_change(&self, kind: CollectionKind) {
        tracing::debug!(collection = %kind, "Collection changed, refreshing");
        self.invalidate(kind);

        if let Err(err) = self.get_collection(kind, true).await {
            tracing::error!(
                error = &err as &dyn std::error::Error,
                collection = %kind,
                "Failed to refresh changed collection",
            );
        }
    }

    /// Spawns a task that refreshes collections whenever a change is signaled through the
    /// returned handle.
    ///
    /// Each signal is handled on its own task, so signaling never waits for the refresh. The
    /// listener shuts down once every handle has been dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_invalidation_listener(self: &Arc<Self>) -> InvalidationHandle {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            while let Some(kind) = receiver.recv().await {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.handle_change(kind).await });
            }
            tracing::debug!("Invalidation listener shut down");
        });

        InvalidationHandle { sender }
    }
}

/// A handle for signaling that a collection changed out from under the cache.
///
/// Handles are cheap to clone and can be handed to any component that modifies collections.
#[derive(Debug, Clone)]
pub struct InvalidationHandle {
    sender: mpsc::UnboundedSender<CollectionKind>,
}

impl InvalidationHandle {
    /// Signals that the given collection changed.
    ///
    /// This returns immediately, the refresh happens in the background and its outcome is
    /// never reported back.
    pub fn notify_changed(&self, kind: CollectionKind) {
        if self.sender.send(kind).is_err() {
            tracing::debug!(collection = %kind, "Invalidation listener is gone, dropping signal");
        }
    }
}
