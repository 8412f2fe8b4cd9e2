mod app;
mod config;
mod metric;
mod summary;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use metric::{CalculationError, MetricError, MetricResult, ParameterError, PoolError};
pub use summary::SummaryError;
