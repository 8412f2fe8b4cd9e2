use chrono::TimeDelta;

use crate::error::ParameterError;
use crate::functions::{self, DEFAULT_BOX_PROBABILITIES, duration_to_millis, millis_to_duration};

use super::types::{DurationUnit, SummaryStatistic, SummaryStatisticName};

/// Decimal places kept in box plot quantiles.
const BOX_PLACES: i32 = 8;

/// Reduction of a sample to one number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Reduction {
    Mean,
    Median,
    StandardDeviation,
    Minimum,
    Maximum,
    MeanAbsolute,
    SampleSize,
    Quantile(f64),
}

impl Reduction {
    /// Missing values are dropped first; fewer than `minimum_sample_size`
    /// remaining values give NaN.
    pub(crate) fn apply(self, values: &[f64], minimum_sample_size: usize) -> f64 {
        let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.len() < minimum_sample_size {
            return f64::NAN;
        }
        match self {
            Reduction::Mean => functions::mean(&present),
            Reduction::Median => functions::median(&present),
            Reduction::StandardDeviation => functions::standard_deviation(&present),
            Reduction::Minimum => functions::minimum(&present),
            Reduction::Maximum => functions::maximum(&present),
            Reduction::MeanAbsolute => functions::mean_absolute(&present),
            Reduction::SampleSize => functions::sample_size(&present),
            Reduction::Quantile(probability) => {
                functions::quantile_of_sorted(probability, &functions::sorted_present(&present))
            }
        }
    }

    /// Reduce durations through decimal milliseconds. Missing durations are
    /// dropped, an undefined result is `None`.
    pub(crate) fn apply_durations(
        self,
        values: &[Option<TimeDelta>],
        minimum_sample_size: usize,
    ) -> Option<TimeDelta> {
        let millis: Vec<f64> = values.iter().flatten().copied().map(duration_to_millis).collect();
        millis_to_duration(self.apply(&millis, minimum_sample_size))
    }
}

/// A summary statistic resolved into the computation it performs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SummaryFunction {
    Scalar(Reduction),
    Histogram(u32),
    Boxplot,
}

impl SummaryFunction {
    /// # Errors
    ///
    /// Returns an error when a parameterised statistic lacks its parameter or
    /// the parameter is out of range. Definitions assembled field by field
    /// are checked here as well as in the constructors.
    pub(crate) fn of(statistic: &SummaryStatistic) -> Result<Self, ParameterError> {
        SummaryStatistic::from_parts(
            statistic.statistic,
            statistic.dimension,
            statistic.probability,
            statistic.histogram_bins,
        )?;
        let function = match statistic.statistic {
            SummaryStatisticName::Mean => SummaryFunction::Scalar(Reduction::Mean),
            SummaryStatisticName::Median => SummaryFunction::Scalar(Reduction::Median),
            SummaryStatisticName::StandardDeviation => {
                SummaryFunction::Scalar(Reduction::StandardDeviation)
            }
            SummaryStatisticName::Minimum => SummaryFunction::Scalar(Reduction::Minimum),
            SummaryStatisticName::Maximum => SummaryFunction::Scalar(Reduction::Maximum),
            SummaryStatisticName::MeanAbsolute => SummaryFunction::Scalar(Reduction::MeanAbsolute),
            SummaryStatisticName::SampleSize => SummaryFunction::Scalar(Reduction::SampleSize),
            SummaryStatisticName::Quantile => {
                let probability =
                    statistic
                        .probability
                        .ok_or(ParameterError::MissingSummaryParameter {
                            statistic: statistic.statistic.as_str(),
                            parameter: "probability",
                        })?;
                SummaryFunction::Scalar(Reduction::Quantile(probability))
            }
            SummaryStatisticName::Histogram => {
                let bins =
                    statistic
                        .histogram_bins
                        .ok_or(ParameterError::MissingSummaryParameter {
                            statistic: statistic.statistic.as_str(),
                            parameter: "bin count",
                        })?;
                SummaryFunction::Histogram(bins)
            }
            SummaryStatisticName::BoxPlot => SummaryFunction::Boxplot,
        };
        Ok(function)
    }
}

/// Whiskers, quartiles and median of the non-missing values.
pub(crate) fn box_quantiles(values: &[f64]) -> Vec<f64> {
    let sorted = functions::sorted_present(values);
    DEFAULT_BOX_PROBABILITIES
        .iter()
        .map(|&p| functions::round(functions::quantile_of_sorted(p, &sorted), BOX_PLACES))
        .collect()
}

/// Present durations as decimals of `unit`.
pub(crate) fn durations_in(unit: DurationUnit, values: &[Option<TimeDelta>]) -> Vec<f64> {
    values
        .iter()
        .flatten()
        .map(|d| duration_to_millis(*d) / unit.millis())
        .collect()
}
