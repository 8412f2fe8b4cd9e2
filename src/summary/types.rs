use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ParameterError;
use crate::pool::PoolMetadata;
use crate::statistics::{MetricName, Statistics};

/// Reduction applied to the samples of one statistic component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatisticName {
    Mean,
    Median,
    StandardDeviation,
    Minimum,
    Maximum,
    MeanAbsolute,
    SampleSize,
    Quantile,
    Histogram,
    BoxPlot,
}

impl SummaryStatisticName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SummaryStatisticName::Mean => "MEAN",
            SummaryStatisticName::Median => "MEDIAN",
            SummaryStatisticName::StandardDeviation => "STANDARD_DEVIATION",
            SummaryStatisticName::Minimum => "MINIMUM",
            SummaryStatisticName::Maximum => "MAXIMUM",
            SummaryStatisticName::MeanAbsolute => "MEAN_ABSOLUTE",
            SummaryStatisticName::SampleSize => "SAMPLE_SIZE",
            SummaryStatisticName::Quantile => "QUANTILE",
            SummaryStatisticName::Histogram => "HISTOGRAM",
            SummaryStatisticName::BoxPlot => "BOX_PLOT",
        }
    }
}

impl fmt::Display for SummaryStatisticName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the accumulated samples vary over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryDimension {
    #[default]
    Features,
    FeatureGroup,
    Resampled,
    ValidDatePools,
    IssueDatePools,
}

/// Unit of the decimal durations in duration histograms and box plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationUnit {
    Milliseconds,
    Seconds,
    Minutes,
    #[default]
    Hours,
    Days,
}

impl DurationUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Milliseconds => "MILLISECONDS",
            DurationUnit::Seconds => "SECONDS",
            DurationUnit::Minutes => "MINUTES",
            DurationUnit::Hours => "HOURS",
            DurationUnit::Days => "DAYS",
        }
    }

    /// Milliseconds in one unit.
    #[must_use]
    pub const fn millis(self) -> f64 {
        match self {
            DurationUnit::Milliseconds => 1.0,
            DurationUnit::Seconds => 1_000.0,
            DurationUnit::Minutes => 60_000.0,
            DurationUnit::Hours => 3_600_000.0,
            DurationUnit::Days => 86_400_000.0,
        }
    }
}

/// Which summary statistic to compute, across which dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistic {
    pub statistic: SummaryStatisticName,
    pub dimension: SummaryDimension,
    pub probability: Option<f64>,
    pub histogram_bins: Option<u32>,
}

impl SummaryStatistic {
    /// A summary statistic without parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for `QUANTILE` and `HISTOGRAM`, which need a
    /// probability or bin count.
    pub fn new(
        statistic: SummaryStatisticName,
        dimension: SummaryDimension,
    ) -> Result<Self, ParameterError> {
        Self::from_parts(statistic, dimension, None, None)
    }

    /// # Errors
    ///
    /// Returns an error when the probability is outside `[0, 1]`.
    pub fn quantile(probability: f64, dimension: SummaryDimension) -> Result<Self, ParameterError> {
        Self::from_parts(SummaryStatisticName::Quantile, dimension, Some(probability), None)
    }

    /// # Errors
    ///
    /// Returns an error for fewer than two bins.
    pub fn histogram(bins: u32, dimension: SummaryDimension) -> Result<Self, ParameterError> {
        Self::from_parts(SummaryStatisticName::Histogram, dimension, None, Some(bins))
    }

    /// Validate and assemble a definition.
    ///
    /// # Errors
    ///
    /// Returns an error when a required parameter is missing or invalid.
    pub fn from_parts(
        statistic: SummaryStatisticName,
        dimension: SummaryDimension,
        probability: Option<f64>,
        histogram_bins: Option<u32>,
    ) -> Result<Self, ParameterError> {
        match statistic {
            SummaryStatisticName::Quantile => {
                let p = probability.ok_or(ParameterError::MissingSummaryParameter {
                    statistic: statistic.as_str(),
                    parameter: "probability",
                })?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(ParameterError::InvalidProbability { probability: p });
                }
            }
            SummaryStatisticName::Histogram => {
                let bins = histogram_bins.ok_or(ParameterError::MissingSummaryParameter {
                    statistic: statistic.as_str(),
                    parameter: "bin count",
                })?;
                if bins < 2 {
                    return Err(ParameterError::TooFewBins { bins });
                }
            }
            SummaryStatisticName::Mean
            | SummaryStatisticName::Median
            | SummaryStatisticName::StandardDeviation
            | SummaryStatisticName::Minimum
            | SummaryStatisticName::Maximum
            | SummaryStatisticName::MeanAbsolute
            | SummaryStatisticName::SampleSize
            | SummaryStatisticName::BoxPlot => {}
        }
        Ok(Self {
            statistic,
            dimension,
            probability,
            histogram_bins,
        })
    }
}

impl fmt::Display for SummaryStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.probability, self.histogram_bins) {
            (Some(p), _) if self.statistic == SummaryStatisticName::Quantile => {
                write!(f, "{}({p})", self.statistic)
            }
            (_, Some(bins)) if self.statistic == SummaryStatisticName::Histogram => {
                write!(f, "{}({bins})", self.statistic)
            }
            _ => write!(f, "{}", self.statistic),
        }
    }
}

/// Which metrics may be summarized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SummaryPolicy {
    /// Each metric's own default, see [`MetricName::allows_summary_statistics`].
    #[default]
    MetricDefaults,
    /// Only the listed metrics.
    Allow(BTreeSet<MetricName>),
}

impl SummaryPolicy {
    #[must_use]
    pub fn allows(&self, metric: MetricName) -> bool {
        match self {
            SummaryPolicy::MetricDefaults => metric.allows_summary_statistics(),
            SummaryPolicy::Allow(metrics) => metrics.contains(&metric),
        }
    }
}

pub type StatisticsFilter = Arc<dyn Fn(&Statistics) -> bool + Send + Sync>;
pub type MetadataAggregator = Arc<dyn Fn(&PoolMetadata, &PoolMetadata) -> PoolMetadata + Send + Sync>;

/// Metadata aggregator for summaries across features: keeps the first
/// metadata and adds the features of the second.
#[must_use]
pub fn union_features(nominal: &PoolMetadata, next: &PoolMetadata) -> PoolMetadata {
    let mut merged = nominal.clone();
    merged.features.extend(next.features.iter().cloned());
    merged
}

/// Calculator settings beyond the list of summary statistics.
#[derive(Clone)]
pub struct SummaryOptions {
    pub(crate) filter: Option<StatisticsFilter>,
    pub(crate) metadata_aggregator: Option<MetadataAggregator>,
    pub(crate) duration_unit: DurationUnit,
    pub(crate) minimum_sample_size: usize,
    pub(crate) policy: SummaryPolicy,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            filter: None,
            metadata_aggregator: None,
            duration_unit: DurationUnit::default(),
            minimum_sample_size: 0,
            policy: SummaryPolicy::default(),
        }
    }
}

impl fmt::Debug for SummaryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryOptions")
            .field("filter", &self.filter.is_some())
            .field("metadata_aggregator", &self.metadata_aggregator.is_some())
            .field("duration_unit", &self.duration_unit)
            .field("minimum_sample_size", &self.minimum_sample_size)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SummaryOptions {
    /// Accept only blobs for which `filter` returns true.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Statistics) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Fold the metadata of each accepted blob into the nominal metadata.
    #[must_use]
    pub fn with_metadata_aggregator<F>(mut self, aggregator: F) -> Self
    where
        F: Fn(&PoolMetadata, &PoolMetadata) -> PoolMetadata + Send + Sync + 'static,
    {
        self.metadata_aggregator = Some(Arc::new(aggregator));
        self
    }

    #[must_use]
    pub const fn with_duration_unit(mut self, unit: DurationUnit) -> Self {
        self.duration_unit = unit;
        self
    }

    /// Scalar statistics of fewer non-missing samples are reported as missing.
    #[must_use]
    pub const fn with_minimum_sample_size(mut self, minimum: usize) -> Self {
        self.minimum_sample_size = minimum;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SummaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn duration_unit(&self) -> DurationUnit {
        self.duration_unit
    }

    #[must_use]
    pub const fn minimum_sample_size(&self) -> usize {
        self.minimum_sample_size
    }

    #[must_use]
    pub const fn policy(&self) -> &SummaryPolicy {
        &self.policy
    }
}
