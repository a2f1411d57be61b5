use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future;
use tokio::time::MissedTickBehavior;

use appdata_service::collections::{CollectionKind, CollectionManager};

/// Refreshes all collections and prints what is cached afterwards.
///
/// Collections that fail to refresh are reported as warnings only, the command succeeds with
/// whatever could be loaded.
pub async fn refresh(manager: &CollectionManager) -> Result<()> {
    if let Err(err) = manager.refresh_all().await {
        tracing::warn!(
            error = &err as &dyn std::error::Error,
            "Not all collections could be refreshed"
        );
    }
    print!("{}", summary(manager));
    Ok(())
}

/// Prints a single collection as pretty JSON.
pub async fn show(manager: &CollectionManager, kind: CollectionKind, force: bool) -> Result<()> {
    let collection = manager.get_collection(kind, force).await?;
    let json = serde_json::to_string_pretty(&*collection).context("failed to serialize records")?;
    println!("{json}");
    Ok(())
}

/// Refreshes all collections, then keeps refreshing the stale ones every `interval` until
/// Ctrl-C is pressed.
pub async fn watch(manager: Arc<CollectionManager>, interval: Duration) -> Result<()> {
    refresh(&manager).await?;
    tracing::info!("Watching collections, checking every {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let refreshed = refresh_stale(&manager).await;
                if refreshed > 0 {
                    tracing::info!(refreshed, "Refreshed stale collections");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                tracing::info!("Stopping");
                return Ok(());
            }
        }
    }
}

/// Fetches every stale collection concurrently and returns how many were refreshed.
///
/// Failures are logged by the manager and otherwise ignored.
pub async fn refresh_stale(manager: &CollectionManager) -> usize {
    let stale = CollectionKind::ALL
        .into_iter()
        .filter(|&kind| manager.is_stale(kind));
    let results =
        future::join_all(stale.map(|kind| manager.get_collection(kind, false))).await;
    results.iter().filter(|result| result.is_ok()).count()
}

/// One line per collection with the number of cached records.
fn summary(manager: &CollectionManager) -> String {
    let mut out = String::new();
    for kind in CollectionKind::ALL {
        let records = manager.get_cached_collection(kind).len();
        let stale = if manager.is_stale(kind) { " (stale)" } else { "" };
        writeln!(out, "{kind:<10} {records} records{stale}").ok();
    }
    out
}
