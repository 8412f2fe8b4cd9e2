//! Forecast verification metrics over paired pools.
//!
//! A [`pool::Pool`] holds paired observations and predictions for one
//! feature and time window. [`collection::MetricCollection`] computes many
//! metrics over a pool concurrently, sharing intermediate statistics such as
//! the sum of square errors or the contingency table between the metrics
//! derived from them. [`summary::SummaryStatisticsCalculator`] accumulates
//! the statistics of many pools and reduces them to summary statistics
//! (mean, quantiles, histograms, box plots) across features or resamples.
//! [`config::EngineConfig`] wires all of it from a `skillstat.toml` file.
pub mod collection;
pub mod config;
pub mod error;
pub mod functions;
pub mod logger;
pub mod metrics;
pub mod pool;
pub mod statistics;
pub mod summary;
