use std::sync::Arc;

use crate::error::MetricResult;
use crate::functions;
use crate::pool::{Pool, ProbabilityPair};
use crate::statistics::{
    ComponentName, DiagramComponent, DiagramStatistic, DoubleScoreStatistic, MetricName,
};

use super::{COUNT, Collectable, DIMENSIONLESS, Metric, component, expect_intermediate, main_score};

fn brier(pairs: &[ProbabilityPair]) -> f64 {
    let errors: Vec<f64> = pairs
        .iter()
        .map(|pair| (pair.probability - pair.outcome()).powi(2))
        .collect();
    functions::mean(&errors)
}

/// Mean square error of probability forecasts for a binary event.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrierScore;

impl Metric<DoubleScoreStatistic> for BrierScore {
    fn name(&self) -> MetricName {
        MetricName::BrierScore
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.discrete_probability(self.name())?;
        Ok(main_score(self.name(), pool.shared_metadata(), brier(pairs)))
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for BrierScore {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        self.apply(pool)
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        expect_intermediate(self.name(), MetricName::BrierScore, intermediate)?;
        Ok(intermediate.clone())
    }

    fn collection_of(&self) -> MetricName {
        MetricName::BrierScore
    }
}

/// Brier score relative to the Brier score of the baseline pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrierSkillScore;

impl Metric<DoubleScoreStatistic> for BrierSkillScore {
    fn name(&self) -> MetricName {
        MetricName::BrierSkillScore
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let score = self.intermediate_statistic(pool)?;
        self.aggregate(&score, pool)
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for BrierSkillScore {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        pool.discrete_probability(self.name())?;
        BrierScore.apply(pool)
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        expect_intermediate(self.name(), MetricName::BrierScore, intermediate)?;
        let baseline = pool.baseline_for(self.name())?;
        let main = component(self.name(), intermediate, ComponentName::Main)?;
        let reference = brier(baseline.discrete_probability(self.name())?);
        Ok(main_score(
            self.name(),
            Arc::clone(&intermediate.metadata),
            functions::skill(main, reference),
        ))
    }

    fn collection_of(&self) -> MetricName {
        MetricName::BrierScore
    }
}

/// Observed relative frequency against mean forecast probability in equal
/// probability bins.
#[derive(Debug, Clone, Copy)]
pub struct ReliabilityDiagram {
    bins: usize,
}

impl ReliabilityDiagram {
    pub const DEFAULT_BINS: usize = 10;

    #[must_use]
    pub const fn new(bins: usize) -> Self {
        Self { bins }
    }
}

impl Default for ReliabilityDiagram {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BINS)
    }
}

impl Metric<DiagramStatistic> for ReliabilityDiagram {
    fn name(&self) -> MetricName {
        MetricName::ReliabilityDiagram
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DiagramStatistic> {
        let pairs = pool.discrete_probability(self.name())?;
        let bins = self.bins.max(1);
        let mut probability_sums = vec![0.0; bins];
        let mut outcome_sums = vec![0.0; bins];
        let mut counts = vec![0.0; bins];
        for pair in pairs {
            let index = ((pair.probability * bins as f64).floor() as usize).min(bins - 1);
            if let (Some(probability), Some(outcome), Some(count)) = (
                probability_sums.get_mut(index),
                outcome_sums.get_mut(index),
                counts.get_mut(index),
            ) {
                *probability += pair.probability;
                *outcome += pair.outcome();
                *count += 1.0;
            }
        }
        let mean_in_bin = |sums: &[f64]| -> Vec<f64> {
            sums.iter()
                .zip(&counts)
                .map(|(sum, count)| if *count > 0.0 { sum / count } else { f64::NAN })
                .collect()
        };
        let forecast = mean_in_bin(&probability_sums);
        let observed = mean_in_bin(&outcome_sums);
        Ok(DiagramStatistic::new(self.name(), pool.shared_metadata())
            .with_component(
                DiagramComponent::new(ComponentName::ForecastProbability, forecast, DIMENSIONLESS)
                    .with_bounds(0.0, 1.0),
            )
            .with_component(
                DiagramComponent::new(
                    ComponentName::ObservedRelativeFrequency,
                    observed,
                    DIMENSIONLESS,
                )
                .with_bounds(0.0, 1.0),
            )
            .with_component(
                DiagramComponent::new(ComponentName::SampleSize, counts, COUNT)
                    .with_bounds(0.0, f64::INFINITY),
            ))
    }
}
