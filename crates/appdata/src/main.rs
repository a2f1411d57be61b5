//! Appdata.
//!
//! Appdata keeps the categories, groups and filters of the management API cached in memory
//! and fresh. The command line application refreshes, prints or watches these collections.

#![warn(
    missing_debug_implementations,
    unused_crate_dependencies,
    clippy::all
)]

mod cli;
mod commands;
mod logging;

fn main() {
    match cli::execute() {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            logging::ensure_log_error(&error);
            std::process::exit(1);
        }
    }
}
