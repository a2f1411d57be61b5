#[macro_use]
pub mod metrics;

pub mod collections;
pub mod config;
pub mod fetch;
pub mod utils;
