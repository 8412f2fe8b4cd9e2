use std::sync::Arc;

use crate::error::MetricResult;
use crate::functions::{self, DEFAULT_BOX_PROBABILITIES};
use crate::pool::{Pool, PoolMetadata, SingleValuedPair};
use crate::statistics::{
    BoxplotBox, BoxplotStatistic, ComponentName, DiagramComponent, DiagramStatistic,
    DoubleScoreStatistic, MetricName,
};

use super::{
    COUNT, Collectable, Incremental, Metric, component, expect_intermediate, main_score,
};

fn errors(pairs: &[SingleValuedPair]) -> impl Iterator<Item = f64> + '_ {
    pairs.iter().map(SingleValuedPair::error)
}

fn sum_of_square_error(pairs: &[SingleValuedPair]) -> f64 {
    errors(pairs).map(|e| e * e).sum()
}

/// Mean of predicted minus observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanError;

impl Metric<DoubleScoreStatistic> for MeanError {
    fn name(&self) -> MetricName {
        MetricName::MeanError
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.single_valued(self.name())?;
        let errors: Vec<f64> = errors(pairs).collect();
        Ok(main_score(
            self.name(),
            pool.shared_metadata(),
            functions::mean(&errors),
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAbsoluteError;

impl Metric<DoubleScoreStatistic> for MeanAbsoluteError {
    fn name(&self) -> MetricName {
        MetricName::MeanAbsoluteError
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.single_valued(self.name())?;
        let errors: Vec<f64> = errors(pairs).collect();
        Ok(main_score(
            self.name(),
            pool.shared_metadata(),
            functions::mean_absolute(&errors),
        ))
    }
}

/// Sum of errors over sum of observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiasFraction;

impl Metric<DoubleScoreStatistic> for BiasFraction {
    fn name(&self) -> MetricName {
        MetricName::BiasFraction
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.single_valued(self.name())?;
        let error: f64 = errors(pairs).sum();
        let observed: f64 = pairs.iter().map(|p| p.observed).sum();
        let value = error / observed;
        Ok(main_score(
            self.name(),
            pool.shared_metadata(),
            if value.is_finite() { value } else { f64::NAN },
        ))
    }
}

/// Number of pairs, for pools of any kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleSize;

impl Metric<DoubleScoreStatistic> for SampleSize {
    fn name(&self) -> MetricName {
        MetricName::SampleSize
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let metadata = pool.shared_metadata();
        Ok(DoubleScoreStatistic::new(self.name(), metadata).with_component(
            ComponentName::Main,
            pool.len() as f64,
            COUNT,
        ))
    }
}

/// Sum of squared errors with the sample size it was summed over. Serves as
/// the shared intermediate of the mean square error family.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOfSquareError;

impl SumOfSquareError {
    fn statistic(
        metadata: Arc<PoolMetadata>,
        sum: f64,
        sample_size: f64,
    ) -> DoubleScoreStatistic {
        let units = format!("{}^2", metadata.measurement_unit);
        DoubleScoreStatistic::new(MetricName::SumOfSquareError, metadata)
            .with_component(ComponentName::Main, sum, &units)
            .with_component(ComponentName::SampleSize, sample_size, COUNT)
    }

    fn of(pool: &Pool, metric: MetricName) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.single_valued(metric)?;
        Ok(Self::statistic(
            pool.shared_metadata(),
            sum_of_square_error(pairs),
            pairs.len() as f64,
        ))
    }
}

impl Metric<DoubleScoreStatistic> for SumOfSquareError {
    fn name(&self) -> MetricName {
        MetricName::SumOfSquareError
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        Self::of(pool, self.name())
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for SumOfSquareError {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        Self::of(pool, self.name())
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        expect_intermediate(self.name(), MetricName::SumOfSquareError, intermediate)?;
        Ok(intermediate.clone())
    }

    fn collection_of(&self) -> MetricName {
        MetricName::SumOfSquareError
    }
}

impl Incremental<DoubleScoreStatistic, DoubleScoreStatistic> for SumOfSquareError {
    fn initial(&self) -> DoubleScoreStatistic {
        Self::statistic(Arc::default(), 0.0, 0.0)
    }

    fn combine(
        &self,
        pool: &Pool,
        intermediate: &DoubleScoreStatistic,
    ) -> MetricResult<DoubleScoreStatistic> {
        combine_sums(self.name(), pool, intermediate)
    }

    fn complete(&self, intermediate: &DoubleScoreStatistic) -> MetricResult<DoubleScoreStatistic> {
        expect_intermediate(self.name(), MetricName::SumOfSquareError, intermediate)?;
        Ok(intermediate.clone())
    }
}

/// Fold a pool into a running sum of squared errors.
fn combine_sums(
    metric: MetricName,
    pool: &Pool,
    intermediate: &DoubleScoreStatistic,
) -> MetricResult<DoubleScoreStatistic> {
    expect_intermediate(metric, MetricName::SumOfSquareError, intermediate)?;
    let pairs = pool.single_valued(metric)?;
    let sum = component(metric, intermediate, ComponentName::Main)? + sum_of_square_error(pairs);
    let count =
        component(metric, intermediate, ComponentName::SampleSize)? + pairs.len() as f64;
    Ok(SumOfSquareError::statistic(pool.shared_metadata(), sum, count))
}

fn mean_square_error(metric: MetricName, sse: &DoubleScoreStatistic) -> MetricResult<f64> {
    expect_intermediate(metric, MetricName::SumOfSquareError, sse)?;
    let sum = component(metric, sse, ComponentName::Main)?;
    let count = component(metric, sse, ComponentName::SampleSize)?;
    if count > 0.0 {
        Ok(sum / count)
    } else {
        Ok(f64::NAN)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquareError;

impl MeanSquareError {
    fn from_sse(
        metric: MetricName,
        sse: &DoubleScoreStatistic,
    ) -> MetricResult<DoubleScoreStatistic> {
        let value = mean_square_error(metric, sse)?;
        let units = format!("{}^2", sse.metadata.measurement_unit);
        Ok(DoubleScoreStatistic::new(metric, Arc::clone(&sse.metadata)).with_component(
            ComponentName::Main,
            value,
            &units,
        ))
    }
}

impl Metric<DoubleScoreStatistic> for MeanSquareError {
    fn name(&self) -> MetricName {
        MetricName::MeanSquareError
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let sse = self.intermediate_statistic(pool)?;
        self.aggregate(&sse, pool)
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for MeanSquareError {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        SumOfSquareError::of(pool, self.name())
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        Self::from_sse(self.name(), intermediate)
    }

    fn collection_of(&self) -> MetricName {
        MetricName::SumOfSquareError
    }
}

impl Incremental<DoubleScoreStatistic, DoubleScoreStatistic> for MeanSquareError {
    fn initial(&self) -> DoubleScoreStatistic {
        SumOfSquareError::statistic(Arc::default(), 0.0, 0.0)
    }

    fn combine(
        &self,
        pool: &Pool,
        intermediate: &DoubleScoreStatistic,
    ) -> MetricResult<DoubleScoreStatistic> {
        combine_sums(self.name(), pool, intermediate)
    }

    fn complete(&self, intermediate: &DoubleScoreStatistic) -> MetricResult<DoubleScoreStatistic> {
        Self::from_sse(self.name(), intermediate)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RootMeanSquareError;

impl Metric<DoubleScoreStatistic> for RootMeanSquareError {
    fn name(&self) -> MetricName {
        MetricName::RootMeanSquareError
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let sse = self.intermediate_statistic(pool)?;
        self.aggregate(&sse, pool)
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for RootMeanSquareError {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        SumOfSquareError::of(pool, self.name())
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        let value = mean_square_error(self.name(), intermediate)?.sqrt();
        Ok(main_score(
            self.name(),
            Arc::clone(&intermediate.metadata),
            value,
        ))
    }

    fn collection_of(&self) -> MetricName {
        MetricName::SumOfSquareError
    }
}

/// Skill of the mean square error against the baseline pool's mean square error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquareErrorSkillScore;

impl Metric<DoubleScoreStatistic> for MeanSquareErrorSkillScore {
    fn name(&self) -> MetricName {
        MetricName::MeanSquareErrorSkillScore
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let sse = self.intermediate_statistic(pool)?;
        self.aggregate(&sse, pool)
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for MeanSquareErrorSkillScore {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        SumOfSquareError::of(pool, self.name())
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        let baseline = pool.baseline_for(self.name())?;
        let main = mean_square_error(self.name(), intermediate)?;
        let baseline_sse = SumOfSquareError::of(baseline, self.name())?;
        let reference = mean_square_error(self.name(), &baseline_sse)?;
        Ok(main_score(
            self.name(),
            Arc::clone(&intermediate.metadata),
            functions::skill(main, reference),
        ))
    }

    fn collection_of(&self) -> MetricName {
        MetricName::SumOfSquareError
    }
}

fn pearson(pairs: &[SingleValuedPair]) -> f64 {
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let count = pairs.len() as f64;
    let mean_observed = pairs.iter().map(|p| p.observed).sum::<f64>() / count;
    let mean_predicted = pairs.iter().map(|p| p.predicted).sum::<f64>() / count;
    let (covariance, var_observed, var_predicted) =
        pairs.iter().fold((0.0, 0.0, 0.0), |(cov, vo, vp), pair| {
            let o = pair.observed - mean_observed;
            let p = pair.predicted - mean_predicted;
            (o.mul_add(p, cov), o.mul_add(o, vo), p.mul_add(p, vp))
        });
    let value = covariance / (var_observed * var_predicted).sqrt();
    if value.is_finite() { value } else { f64::NAN }
}

/// Pearson's product-moment correlation between observed and predicted values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PearsonCorrelationCoefficient;

impl Metric<DoubleScoreStatistic> for PearsonCorrelationCoefficient {
    fn name(&self) -> MetricName {
        MetricName::PearsonCorrelationCoefficient
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.single_valued(self.name())?;
        Ok(main_score(self.name(), pool.shared_metadata(), pearson(pairs)))
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for PearsonCorrelationCoefficient {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        self.apply(pool)
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        expect_intermediate(self.name(), self.name(), intermediate)?;
        Ok(intermediate.clone())
    }

    fn collection_of(&self) -> MetricName {
        MetricName::PearsonCorrelationCoefficient
    }
}

/// Square of the correlation coefficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientOfDetermination;

impl Metric<DoubleScoreStatistic> for CoefficientOfDetermination {
    fn name(&self) -> MetricName {
        MetricName::CoefficientOfDetermination
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let correlation = self.intermediate_statistic(pool)?;
        self.aggregate(&correlation, pool)
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for CoefficientOfDetermination {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        PearsonCorrelationCoefficient.apply(pool)
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        expect_intermediate(
            self.name(),
            MetricName::PearsonCorrelationCoefficient,
            intermediate,
        )?;
        let correlation = component(self.name(), intermediate, ComponentName::Main)?;
        Ok(main_score(
            self.name(),
            Arc::clone(&intermediate.metadata),
            correlation.powi(2),
        ))
    }

    fn collection_of(&self) -> MetricName {
        MetricName::PearsonCorrelationCoefficient
    }
}

/// Observed against predicted quantiles at evenly spaced plotting positions.
#[derive(Debug, Clone, Copy)]
pub struct QuantileQuantileDiagram {
    probability_count: usize,
}

impl QuantileQuantileDiagram {
    pub const DEFAULT_PROBABILITY_COUNT: usize = 1000;

    #[must_use]
    pub const fn new(probability_count: usize) -> Self {
        Self { probability_count }
    }
}

impl Default for QuantileQuantileDiagram {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROBABILITY_COUNT)
    }
}

impl Metric<DiagramStatistic> for QuantileQuantileDiagram {
    fn name(&self) -> MetricName {
        MetricName::QuantileQuantileDiagram
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DiagramStatistic> {
        let pairs = pool.single_valued(self.name())?;
        let observed: Vec<f64> =
            functions::sorted_present(&pairs.iter().map(|p| p.observed).collect::<Vec<_>>());
        let predicted: Vec<f64> =
            functions::sorted_present(&pairs.iter().map(|p| p.predicted).collect::<Vec<_>>());
        let count = self.probability_count.min(pairs.len());
        let positions = (1..=count).map(|i| i as f64 / (count as f64 + 1.0));
        let (observed_quantiles, predicted_quantiles): (Vec<f64>, Vec<f64>) = positions
            .map(|p| {
                (
                    functions::quantile_of_sorted(p, &observed),
                    functions::quantile_of_sorted(p, &predicted),
                )
            })
            .unzip();
        let units = pool.metadata().measurement_unit.clone();
        Ok(DiagramStatistic::new(self.name(), pool.shared_metadata())
            .with_component(DiagramComponent::new(
                ComponentName::ObservedQuantiles,
                observed_quantiles,
                &units,
            ))
            .with_component(DiagramComponent::new(
                ComponentName::PredictedQuantiles,
                predicted_quantiles,
                &units,
            )))
    }
}

/// One box of errors per pool.
#[derive(Debug, Clone)]
pub struct BoxPlotOfErrors {
    probabilities: Vec<f64>,
}

impl BoxPlotOfErrors {
    #[must_use]
    pub const fn new(probabilities: Vec<f64>) -> Self {
        Self { probabilities }
    }
}

impl Default for BoxPlotOfErrors {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_PROBABILITIES.to_vec())
    }
}

impl Metric<BoxplotStatistic> for BoxPlotOfErrors {
    fn name(&self) -> MetricName {
        MetricName::BoxPlotOfErrors
    }

    fn apply(&self, pool: &Pool) -> MetricResult<BoxplotStatistic> {
        let pairs = pool.single_valued(self.name())?;
        let sorted = functions::sorted_present(&errors(pairs).collect::<Vec<_>>());
        let quantiles = self
            .probabilities
            .iter()
            .map(|&p| functions::round(functions::quantile_of_sorted(p, &sorted), 8))
            .collect();
        let mut statistic =
            BoxplotStatistic::new(self.name(), self.probabilities.clone(), pool.shared_metadata());
        statistic.boxes.push(BoxplotBox {
            linked_value: None,
            quantiles,
        });
        Ok(statistic)
    }
}
