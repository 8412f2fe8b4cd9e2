use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::MetricResult;
use crate::functions;
use crate::pool::{Pool, TimeSeriesPairs, TimedPair};
use crate::statistics::{
    ComponentName, DurationDiagramStatistic, DurationScoreComponent, DurationScoreStatistic,
    InstantDuration, MetricName,
};

use super::{Collectable, Metric};

/// Valid time of the largest value. Ties go to the earliest event.
fn peak_time(events: &[TimedPair], value: impl Fn(&TimedPair) -> f64) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter(|event| !value(event).is_nan())
        .fold(None, |peak: Option<&TimedPair>, event| match peak {
            Some(best) if value(best) >= value(event) => Some(best),
            Some(_) | None => Some(event),
        })
        .map(|event| event.valid_time)
}

fn peak_error(series: &TimeSeriesPairs) -> Option<InstantDuration> {
    let observed = peak_time(&series.events, |e| e.observed)?;
    let predicted = peak_time(&series.events, |e| e.predicted)?;
    Some(InstantDuration {
        instant: series.reference_time,
        duration: predicted - observed,
    })
}

/// Predicted peak time minus observed peak time, one entry per forecast,
/// keyed by the forecast's reference time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeToPeakError;

impl Metric<DurationDiagramStatistic> for TimeToPeakError {
    fn name(&self) -> MetricName {
        MetricName::TimeToPeakError
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DurationDiagramStatistic> {
        let series = pool.time_series(self.name())?;
        let mut statistic = DurationDiagramStatistic::new(self.name(), pool.shared_metadata());
        statistic.pairs = series.iter().filter_map(peak_error).collect();
        statistic.pairs.sort_by_key(|pair| pair.instant);
        Ok(statistic)
    }
}

/// Summary of the timing errors in a pool.
#[derive(Debug, Clone)]
pub struct TimeToPeakErrorStatistic {
    components: Vec<ComponentName>,
}

impl TimeToPeakErrorStatistic {
    pub const DEFAULT_COMPONENTS: [ComponentName; 6] = [
        ComponentName::Mean,
        ComponentName::Median,
        ComponentName::Minimum,
        ComponentName::Maximum,
        ComponentName::MeanAbsolute,
        ComponentName::StandardDeviation,
    ];

    /// Restrict the summary to `components`. Components other than the six
    /// summaries are ignored.
    #[must_use]
    pub const fn new(components: Vec<ComponentName>) -> Self {
        Self { components }
    }

    fn summarize(component: ComponentName, millis: &[f64]) -> Option<f64> {
        let value = match component {
            ComponentName::Mean => functions::mean(millis),
            ComponentName::Median => functions::median(millis),
            ComponentName::Minimum => functions::minimum(millis),
            ComponentName::Maximum => functions::maximum(millis),
            ComponentName::MeanAbsolute => functions::mean_absolute(millis),
            ComponentName::StandardDeviation => functions::standard_deviation(millis),
            ComponentName::Main
            | ComponentName::SampleSize
            | ComponentName::TruePositives
            | ComponentName::FalsePositives
            | ComponentName::FalseNegatives
            | ComponentName::TrueNegatives
            | ComponentName::ForecastProbability
            | ComponentName::ObservedRelativeFrequency
            | ComponentName::ObservedQuantiles
            | ComponentName::PredictedQuantiles
            | ComponentName::BinUpperBound
            | ComponentName::Count => return None,
        };
        Some(value)
    }
}

impl Default for TimeToPeakErrorStatistic {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COMPONENTS.to_vec())
    }
}

impl Metric<DurationScoreStatistic> for TimeToPeakErrorStatistic {
    fn name(&self) -> MetricName {
        MetricName::TimeToPeakErrorStatistic
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DurationScoreStatistic> {
        let errors = self.intermediate_statistic(pool)?;
        self.aggregate(&errors, pool)
    }
}

impl Collectable<DurationDiagramStatistic, DurationScoreStatistic> for TimeToPeakErrorStatistic {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DurationDiagramStatistic> {
        pool.time_series(self.name())?;
        TimeToPeakError.apply(pool)
    }

    fn aggregate(
        &self,
        intermediate: &DurationDiagramStatistic,
        _pool: &Pool,
    ) -> MetricResult<DurationScoreStatistic> {
        let millis: Vec<f64> = intermediate
            .pairs
            .iter()
            .map(|pair| functions::duration_to_millis(pair.duration))
            .collect();
        let mut statistic =
            DurationScoreStatistic::new(self.name(), Arc::clone(&intermediate.metadata));
        for &name in &self.components {
            let Some(value) = Self::summarize(name, &millis) else {
                continue;
            };
            let mut component =
                DurationScoreComponent::new(name, functions::millis_to_duration(value));
            if name == ComponentName::MeanAbsolute || name == ComponentName::StandardDeviation {
                component.minimum = Some(TimeDelta::zero());
            }
            statistic.components.push(component);
        }
        Ok(statistic)
    }

    fn collection_of(&self) -> MetricName {
        MetricName::TimeToPeakError
    }
}
