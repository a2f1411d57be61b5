//! Exposes the command line application.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use appdata_service::collections::{CollectionKind, CollectionManager};
use appdata_service::config::Config;
use appdata_service::{fetch, metrics};

use crate::commands;
use crate::logging;

/// Appdata commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh all collections once and print a summary.
    Refresh,

    /// Print a single collection as JSON.
    Show {
        /// The collection to print: categories, groups or filters.
        kind: CollectionKind,

        /// Fetch the collection even if the cached data is still fresh.
        #[arg(long)]
        force: bool,
    },

    /// Keep the collections fresh until interrupted.
    Watch {
        /// How often to check for stale collections, e.g. `30s` or `5m`.
        ///
        /// Defaults to the configured freshness threshold.
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },
}

/// Command line interface parser.
#[derive(Debug, Parser)]
#[command(bin_name = "appdata", version, about)]
struct Cli {
    /// Path to your configuration file.
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Returns the path to the configuration file.
    fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Runs the main application.
pub fn execute() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::get(cli.config()).context("failed loading config")?;

    let _sentry = sentry::init(sentry::ClientOptions {
        dsn: config
            .sentry_dsn
            .as_deref()
            .map(|dsn| dsn.parse::<sentry::types::Dsn>())
            .transpose()
            .context("invalid sentry DSN")?,
        release: sentry::release_name!(),
        ..Default::default()
    });

    // SAFETY: The runtime has not been started yet, so we are still single-threaded.
    unsafe { logging::init_logging(&config) };

    if let Some(ref statsd) = config.metrics.statsd {
        let mut tags = config.metrics.custom_tags.clone();
        if let Some(tag) = config.metrics.hostname_tag.clone() {
            if let Some(name) = hostname::get().ok().and_then(|s| s.into_string().ok()) {
                tags.insert(tag, name);
            }
        }
        metrics::configure_statsd(&config.metrics.prefix, statsd.as_str(), tags)
            .context("failed to configure metrics")?;
    }

    let source = config
        .source
        .as_ref()
        .context("no collection `source` configured")?;
    let fetcher = fetch::from_config(source).context("failed to create fetcher")?;
    let manager = Arc::new(CollectionManager::from_config(fetcher, &config.collections));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("appdata")
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Command::Refresh => commands::refresh(&manager).await,
            Command::Show { kind, force } => commands::show(&manager, kind, force).await,
            Command::Watch { interval } => {
                let interval = interval.unwrap_or(manager.freshness_threshold());
                commands::watch(manager, interval).await
            }
        }
    })
}
