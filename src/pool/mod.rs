//! Pools of paired observation/forecast values, the unit of input to every metric.
//!
//! A pool is immutable once built. Metrics borrow typed views of its pairs and
//! fail with a [`PoolError`] when the pool holds a different kind of pairs than
//! they consume, or lacks a baseline they require.
mod metadata;


use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::PoolError;
use crate::statistics::MetricName;

pub use metadata::{Feature, PoolMetadata, Threshold, ThresholdOperator, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleValuedPair {
    pub observed: f64,
    pub predicted: f64,
}

impl SingleValuedPair {
    #[must_use]
    pub const fn new(observed: f64, predicted: f64) -> Self {
        Self {
            observed,
            predicted,
        }
    }

    /// Predicted minus observed.
    #[must_use]
    pub fn error(&self) -> f64 {
        self.predicted - self.observed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsemblePair {
    pub observed: f64,
    pub members: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DichotomousPair {
    pub observed: bool,
    pub predicted: bool,
}

impl DichotomousPair {
    #[must_use]
    pub const fn new(observed: bool, predicted: bool) -> Self {
        Self {
            observed,
            predicted,
        }
    }
}

/// Binary outcome paired with the forecast probability of its occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityPair {
    pub observed: bool,
    pub probability: f64,
}

impl ProbabilityPair {
    #[must_use]
    pub const fn new(observed: bool, probability: f64) -> Self {
        Self {
            observed,
            probability,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> f64 {
        if self.observed { 1.0 } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPair {
    pub valid_time: DateTime<Utc>,
    pub observed: f64,
    pub predicted: f64,
}

/// One forecast issued at `reference_time`, paired event by event with observations.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPairs {
    pub reference_time: DateTime<Utc>,
    pub events: Vec<TimedPair>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pairs {
    SingleValued(Vec<SingleValuedPair>),
    Ensemble(Vec<EnsemblePair>),
    Dichotomous(Vec<DichotomousPair>),
    DiscreteProbability(Vec<ProbabilityPair>),
    TimeSeries(Vec<TimeSeriesPairs>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    SingleValued,
    Ensemble,
    Dichotomous,
    DiscreteProbability,
    TimeSeries,
}

impl PairKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PairKind::SingleValued => "single-valued",
            PairKind::Ensemble => "ensemble",
            PairKind::Dichotomous => "dichotomous",
            PairKind::DiscreteProbability => "discrete probability",
            PairKind::TimeSeries => "time-series",
        }
    }
}

impl fmt::Display for PairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Pairs {
    #[must_use]
    pub const fn kind(&self) -> PairKind {
        match self {
            Pairs::SingleValued(_) => PairKind::SingleValued,
            Pairs::Ensemble(_) => PairKind::Ensemble,
            Pairs::Dichotomous(_) => PairKind::Dichotomous,
            Pairs::DiscreteProbability(_) => PairKind::DiscreteProbability,
            Pairs::TimeSeries(_) => PairKind::TimeSeries,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Pairs::SingleValued(pairs) => pairs.len(),
            Pairs::Ensemble(pairs) => pairs.len(),
            Pairs::Dichotomous(pairs) => pairs.len(),
            Pairs::DiscreteProbability(pairs) => pairs.len(),
            Pairs::TimeSeries(series) => series.iter().map(|s| s.events.len()).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> Result<(), PoolError> {
        match self {
            Pairs::Ensemble(pairs) => {
                for (index, pair) in pairs.iter().enumerate() {
                    if pair.members.is_empty() {
                        return Err(PoolError::InvalidPair {
                            index,
                            reason: "ensemble pair has no members",
                        });
                    }
                }
                Ok(())
            }
            Pairs::DiscreteProbability(pairs) => {
                for (index, pair) in pairs.iter().enumerate() {
                    if !(0.0..=1.0).contains(&pair.probability) {
                        return Err(PoolError::InvalidPair {
                            index,
                            reason: "forecast probability is outside [0, 1]",
                        });
                    }
                }
                Ok(())
            }
            Pairs::SingleValued(_) | Pairs::Dichotomous(_) | Pairs::TimeSeries(_) => Ok(()),
        }
    }
}

/// Immutable pairs plus metadata, with an optional baseline of the same pair kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pairs: Pairs,
    metadata: Arc<PoolMetadata>,
    baseline: Option<Arc<Pool>>,
}

impl Pool {
    /// Build a pool without a baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if any pair is structurally invalid.
    pub fn new(pairs: Pairs, metadata: PoolMetadata) -> Result<Self, PoolError> {
        pairs.validate()?;
        Ok(Self {
            pairs,
            metadata: Arc::new(metadata),
            baseline: None,
        })
    }

    /// Attach a baseline pool, used by skill scores.
    ///
    /// # Errors
    ///
    /// Returns an error when the baseline holds a different kind of pairs.
    pub fn with_baseline(mut self, baseline: Pool) -> Result<Self, PoolError> {
        let expected = self.pairs.kind();
        let actual = baseline.pairs.kind();
        if expected != actual {
            return Err(PoolError::BaselineMismatch { expected, actual });
        }
        self.baseline = Some(Arc::new(baseline));
        Ok(self)
    }

    #[must_use]
    pub const fn pairs(&self) -> &Pairs {
        &self.pairs
    }

    #[must_use]
    pub fn metadata(&self) -> &PoolMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn shared_metadata(&self) -> Arc<PoolMetadata> {
        Arc::clone(&self.metadata)
    }

    #[must_use]
    pub fn baseline(&self) -> Option<&Pool> {
        self.baseline.as_deref()
    }

    /// The baseline pool, required by `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingBaseline`] when the pool has no baseline.
    pub fn baseline_for(&self, metric: MetricName) -> Result<&Pool, PoolError> {
        self.baseline()
            .ok_or(PoolError::MissingBaseline { metric })
    }

    #[must_use]
    pub const fn kind(&self) -> PairKind {
        self.pairs.kind()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn wrong_kind(&self, metric: MetricName, expected: PairKind) -> PoolError {
        PoolError::WrongPairKind {
            metric,
            expected,
            actual: self.kind(),
        }
    }

    /// # Errors
    ///
    /// Returns an error when the pool does not hold single-valued pairs.
    pub fn single_valued(&self, metric: MetricName) -> Result<&[SingleValuedPair], PoolError> {
        let Pairs::SingleValued(pairs) = &self.pairs else {
            return Err(self.wrong_kind(metric, PairKind::SingleValued));
        };
        Ok(pairs)
    }

    /// # Errors
    ///
    /// Returns an error when the pool does not hold ensemble pairs.
    pub fn ensemble(&self, metric: MetricName) -> Result<&[EnsemblePair], PoolError> {
        let Pairs::Ensemble(pairs) = &self.pairs else {
            return Err(self.wrong_kind(metric, PairKind::Ensemble));
        };
        Ok(pairs)
    }

    /// # Errors
    ///
    /// Returns an error when the pool does not hold dichotomous pairs.
    pub fn dichotomous(&self, metric: MetricName) -> Result<&[DichotomousPair], PoolError> {
        let Pairs::Dichotomous(pairs) = &self.pairs else {
            return Err(self.wrong_kind(metric, PairKind::Dichotomous));
        };
        Ok(pairs)
    }

    /// # Errors
    ///
    /// Returns an error when the pool does not hold discrete probability pairs.
    pub fn discrete_probability(
        &self,
        metric: MetricName,
    ) -> Result<&[ProbabilityPair], PoolError> {
        let Pairs::DiscreteProbability(pairs) = &self.pairs else {
            return Err(self.wrong_kind(metric, PairKind::DiscreteProbability));
        };
        Ok(pairs)
    }

    /// # Errors
    ///
    /// Returns an error when the pool does not hold time-series pairs.
    pub fn time_series(&self, metric: MetricName) -> Result<&[TimeSeriesPairs], PoolError> {
        let Pairs::TimeSeries(series) = &self.pairs else {
            return Err(self.wrong_kind(metric, PairKind::TimeSeries));
        };
        Ok(series)
    }
}
