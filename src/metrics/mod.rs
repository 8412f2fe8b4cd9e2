//! Verification metrics: the traits every metric implements and the concrete
//! metric library.
//!
//! A [`Metric`] turns a pool into one statistic. A [`Collectable`] metric splits
//! that work in two so that metrics sharing a dependency can reuse one
//! intermediate statistic. An [`Incremental`] metric folds pools one at a time
//! into an intermediate that completes to the same result as a single pass.
mod categorical;
mod ensemble;
mod factory;
mod probability;
mod singlevalued;
mod timing;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::error::{CalculationError, MetricResult};
use crate::pool::{Pool, PoolMetadata};
use crate::statistics::{ComponentName, DoubleScoreStatistic, MetricName};

pub use categorical::{
    ContingencyTable, EquitableThreatScore, FrequencyBias, PeirceSkillScore,
    ProbabilityOfDetection, ProbabilityOfFalseDetection, ThreatScore,
};
pub use ensemble::ContinuousRankedProbabilityScore;
pub use factory::{DurationScoreEntry, MetricFactory, ResolvedMetric, ScoreEntry};
pub use probability::{BrierScore, BrierSkillScore, ReliabilityDiagram};
pub use singlevalued::{
    BiasFraction, BoxPlotOfErrors, CoefficientOfDetermination, MeanAbsoluteError, MeanError,
    MeanSquareError, MeanSquareErrorSkillScore, PearsonCorrelationCoefficient,
    QuantileQuantileDiagram, RootMeanSquareError, SampleSize, SumOfSquareError,
};
pub use timing::{TimeToPeakError, TimeToPeakErrorStatistic};

/// Computes one statistic from a pool. Implementations hold no mutable state.
pub trait Metric<S>: Send + Sync {
    fn name(&self) -> MetricName;

    /// # Errors
    ///
    /// Returns an error when the pool holds the wrong kind of pairs, lacks a
    /// required baseline, or the statistic cannot be computed.
    fn apply(&self, pool: &Pool) -> MetricResult<S>;
}

/// A metric computed in two phases around a shareable intermediate statistic.
///
/// `apply` must equal `aggregate(intermediate_statistic(pool), pool)`.
pub trait Collectable<I, S>: Metric<S> {
    /// # Errors
    ///
    /// Returns an error when the intermediate cannot be computed from the pool.
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<I>;

    /// # Errors
    ///
    /// Returns an error when the intermediate is not the one this metric
    /// consumes, or the pool lacks what aggregation needs (such as a baseline).
    fn aggregate(&self, intermediate: &I, pool: &Pool) -> MetricResult<S>;

    /// Metrics with the same identity share one intermediate.
    fn collection_of(&self) -> MetricName;
}

/// A metric whose intermediate can be combined across pools.
///
/// Combining is associative: completing successive combinations gives the
/// same statistic as completing one combination of the concatenated pools.
pub trait Incremental<I, S>: Metric<S> {
    /// Identity intermediate.
    fn initial(&self) -> I;

    /// # Errors
    ///
    /// Returns an error when the pool cannot be folded into the intermediate.
    fn combine(&self, pool: &Pool, intermediate: &I) -> MetricResult<I>;

    /// # Errors
    ///
    /// Returns an error when the intermediate is not the expected statistic.
    fn complete(&self, intermediate: &I) -> MetricResult<S>;
}

const DIMENSIONLESS: &str = "DIMENSIONLESS";
pub(crate) const COUNT: &str = "COUNT";

fn units_of(metric: MetricName, metadata: &PoolMetadata) -> &str {
    if metric.is_dimensionless() {
        DIMENSIONLESS
    } else {
        &metadata.measurement_unit
    }
}

/// Score with a single MAIN component.
fn main_score(
    metric: MetricName,
    metadata: Arc<PoolMetadata>,
    value: f64,
) -> DoubleScoreStatistic {
    let units = units_of(metric, &metadata).to_owned();
    DoubleScoreStatistic::new(metric, metadata).with_component(ComponentName::Main, value, &units)
}

/// Check an intermediate came from `expected` before reading it.
fn expect_intermediate(
    metric: MetricName,
    expected: MetricName,
    intermediate: &DoubleScoreStatistic,
) -> Result<(), CalculationError> {
    if intermediate.metric == expected {
        Ok(())
    } else {
        Err(CalculationError::UnexpectedIntermediate {
            metric,
            expected,
            actual: intermediate.metric,
        })
    }
}

fn component(
    metric: MetricName,
    intermediate: &DoubleScoreStatistic,
    component: ComponentName,
) -> Result<f64, CalculationError> {
    intermediate
        .value(component)
        .ok_or(CalculationError::MissingComponent { metric, component })
}
