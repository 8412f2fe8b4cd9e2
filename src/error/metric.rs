use std::time::Duration;

use thiserror::Error;

use crate::pool::PairKind;
use crate::statistics::MetricName;

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

pub type MetricResult<T> = Result<T, MetricError>;

impl MetricError {
    /// The pool error behind this error, if any, looking through failed tasks.
    #[must_use]
    pub fn pool_error(&self) -> Option<&PoolError> {
        match self {
            MetricError::Pool(err) => Some(err),
            MetricError::Calculation(CalculationError::TaskFailed { source, .. }) => {
                source.pool_error()
            }
            MetricError::Calculation(_) | MetricError::Parameter(_) => None,
            #[cfg(test)]
            MetricError::TestExpectation { .. } | MetricError::TestExpectationValue { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("Metric {metric} could not start: the {input} it waits on was never produced.")]
    MissingInput {
        metric: MetricName,
        input: &'static str,
    },
    #[error("Metric {metric} failed: {source}")]
    TaskFailed {
        metric: MetricName,
        #[source]
        source: Box<MetricError>,
    },
    #[error("Task for metric {metric} did not complete: {source}")]
    Join {
        metric: MetricName,
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Metric collection timed out after {timeout:?}.")]
    Timeout { timeout: Duration },
    #[error("No tokio runtime available to schedule metric {metric}.")]
    NoRuntime { metric: MetricName },
    #[error("Metric {metric} expected intermediate {expected}, found {actual}.")]
    UnexpectedIntermediate {
        metric: MetricName,
        expected: MetricName,
        actual: MetricName,
    },
    #[error("Metric {metric} requires component {component} in its intermediate statistic.")]
    MissingComponent {
        metric: MetricName,
        component: crate::statistics::ComponentName,
    },
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Metric {metric} expects {expected} pairs, but the pool holds {actual} pairs.")]
    WrongPairKind {
        metric: MetricName,
        expected: PairKind,
        actual: PairKind,
    },
    #[error("Metric {metric} requires a baseline pool, but none was supplied.")]
    MissingBaseline { metric: MetricName },
    #[error("Baseline pairs must match the main pairs: expected {expected}, found {actual}.")]
    BaselineMismatch { expected: PairKind, actual: PairKind },
    #[error("Invalid pair at index {index}: {reason}")]
    InvalidPair { index: usize, reason: &'static str },
}

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Add one or more metrics to the collection.")]
    EmptyCollection,
    #[error("Metric {metric} does not produce {shape} statistics.")]
    WrongShape {
        metric: MetricName,
        shape: &'static str,
    },
    #[error("Metric {metric} is only produced by summary statistics, not from pools.")]
    SummaryOnly { metric: MetricName },
    #[error("Metric {metric} cannot be computed incrementally.")]
    NotIncremental { metric: MetricName },
    #[error("Probability {probability} is outside the unit interval.")]
    InvalidProbability { probability: f64 },
    #[error("A histogram requires at least two bins, found {bins}.")]
    TooFewBins { bins: u32 },
    #[error("Summary statistic {statistic} requires a {parameter}.")]
    MissingSummaryParameter {
        statistic: &'static str,
        parameter: &'static str,
    },
    #[error("Provide one or more summary statistics to calculate.")]
    NoSummaryStatistics,
}
