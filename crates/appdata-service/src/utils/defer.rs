/// Runs its closure exactly once, when it goes out of scope.
///
/// The collection manager uses this to clear the loading flag of a collection no matter how the
/// fetch ends, including when the fetching future is dropped before completion.
#[must_use = "the closure runs as soon as the guard is dropped"]
pub struct DeferGuard<F: FnOnce()> {
    on_drop: Option<F>,
}

impl<F: FnOnce()> Drop for DeferGuard<F> {
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

/// Returns a [`DeferGuard`] that runs `on_drop` when dropped.
pub fn defer<F: FnOnce()>(on_drop: F) -> DeferGuard<F> {
    DeferGuard {
        on_drop: Some(on_drop),
    }
}
