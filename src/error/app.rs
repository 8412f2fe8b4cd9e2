use thiserror::Error;

use super::{ConfigError, MetricError, ParameterError, SummaryError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),
    #[error("Summary statistics error: {0}")]
    Summary(#[from] SummaryError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }
}

impl From<ParameterError> for AppError {
    fn from(error: ParameterError) -> Self {
        AppError::Metric(error.into())
    }
}
