//! Engine configuration files.
//!
//! `skillstat.toml` (or `.json`) names the metrics to compute per pool, the
//! worker runtime, and the summary statistics to derive across pools.
mod apply;
mod loader;
mod parse;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::{load_config, load_config_file};
pub(crate) use parse::parse_duration_value;
pub use types::EngineConfig;
