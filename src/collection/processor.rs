use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{MetricResult, ParameterError};
use crate::metrics::MetricFactory;
use crate::pool::Pool;
use crate::statistics::{
    BoxplotStatistic, DiagramStatistic, DoubleScoreStatistic, DurationDiagramStatistic,
    DurationScoreStatistic, MetricName, StatisticShape, Statistics,
};

use super::{MetricCollection, MetricCollectionBuilder};

/// Every requested metric, split into one collection per statistic shape.
/// Produces one [`Statistics`] blob per pool.
pub struct StatisticsProcessor {
    scores: Option<MetricCollection<DoubleScoreStatistic, DoubleScoreStatistic>>,
    diagrams: Option<MetricCollection<DiagramStatistic, DiagramStatistic>>,
    boxplots: Option<MetricCollection<BoxplotStatistic, BoxplotStatistic>>,
    duration_diagrams: Option<MetricCollection<DurationDiagramStatistic, DurationDiagramStatistic>>,
    duration_scores: Option<MetricCollection<DurationDiagramStatistic, DurationScoreStatistic>>,
}

fn finish<I, S>(
    builder: MetricCollectionBuilder<I, S>,
    requested: bool,
    handle: Option<&Handle>,
    timeout: Option<Duration>,
) -> Result<Option<MetricCollection<I, S>>, ParameterError> {
    if !requested {
        return Ok(None);
    }
    let builder = match handle {
        Some(handle) => builder.with_handle(handle.clone()),
        None => builder,
    };
    let builder = match timeout {
        Some(timeout) => builder.with_timeout(timeout),
        None => builder,
    };
    builder.build().map(Some)
}

async fn apply_optional<I, S>(
    collection: Option<&MetricCollection<I, S>>,
    pool: &Arc<Pool>,
) -> MetricResult<Vec<S>>
where
    I: Send + Sync + 'static,
    S: Send + 'static,
{
    match collection {
        Some(collection) => collection.apply(Arc::clone(pool)).await,
        None => Ok(Vec::new()),
    }
}

impl StatisticsProcessor {
    /// # Errors
    ///
    /// Returns an error when no metric is requested or a metric cannot be
    /// computed from pools.
    pub fn new(
        metrics: &[MetricName],
        handle: Option<&Handle>,
        timeout: Option<Duration>,
    ) -> Result<Self, ParameterError> {
        if metrics.is_empty() {
            return Err(ParameterError::EmptyCollection);
        }
        let of_shape = |shape: StatisticShape| -> Vec<MetricName> {
            metrics
                .iter()
                .copied()
                .filter(|metric| metric.shape() == shape)
                .collect()
        };
        let scores = of_shape(StatisticShape::DoubleScore);
        let diagrams = of_shape(StatisticShape::Diagram);
        let boxplots = of_shape(StatisticShape::Boxplot);
        let duration_diagrams = of_shape(StatisticShape::DurationDiagram);
        let duration_scores = of_shape(StatisticShape::DurationScore);

        Ok(Self {
            scores: finish(
                MetricFactory::score_collection(&scores)?,
                !scores.is_empty(),
                handle,
                timeout,
            )?,
            diagrams: finish(
                MetricFactory::diagram_collection(&diagrams)?,
                !diagrams.is_empty(),
                handle,
                timeout,
            )?,
            boxplots: finish(
                MetricFactory::boxplot_collection(&boxplots)?,
                !boxplots.is_empty(),
                handle,
                timeout,
            )?,
            duration_diagrams: finish(
                MetricFactory::duration_diagram_collection(&duration_diagrams)?,
                !duration_diagrams.is_empty(),
                handle,
                timeout,
            )?,
            duration_scores: finish(
                MetricFactory::duration_score_collection(&duration_scores)?,
                !duration_scores.is_empty(),
                handle,
                timeout,
            )?,
        })
    }

    /// Compute every metric over the pool. The collections of each shape run
    /// together.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any collection.
    pub async fn apply(&self, pool: Arc<Pool>) -> MetricResult<Statistics> {
        let (double_scores, diagrams, boxplots, duration_diagrams, duration_scores) = tokio::try_join!(
            apply_optional(self.scores.as_ref(), &pool),
            apply_optional(self.diagrams.as_ref(), &pool),
            apply_optional(self.boxplots.as_ref(), &pool),
            apply_optional(self.duration_diagrams.as_ref(), &pool),
            apply_optional(self.duration_scores.as_ref(), &pool),
        )?;

        let mut statistics = Statistics::new(pool.shared_metadata());
        statistics.double_scores = double_scores;
        statistics.diagrams = diagrams;
        for boxplot in boxplots {
            statistics.push(boxplot.into());
        }
        statistics.duration_diagrams = duration_diagrams;
        statistics.duration_scores = duration_scores;
        Ok(statistics)
    }
}
