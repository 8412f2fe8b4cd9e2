use std::sync::Arc;

use crate::collection::{MetricCollectionBuilder, MetricEntry};
use crate::error::ParameterError;
use crate::statistics::{
    BoxplotStatistic, DiagramStatistic, DoubleScoreStatistic, DurationDiagramStatistic,
    DurationScoreStatistic, MetricName,
};

use super::{
    BiasFraction, BoxPlotOfErrors, BrierScore, BrierSkillScore, CoefficientOfDetermination,
    Collectable, ContingencyTable, ContinuousRankedProbabilityScore, EquitableThreatScore,
    FrequencyBias, Incremental, MeanAbsoluteError, MeanError, MeanSquareError,
    MeanSquareErrorSkillScore, Metric, PearsonCorrelationCoefficient, PeirceSkillScore,
    ProbabilityOfDetection, ProbabilityOfFalseDetection, QuantileQuantileDiagram,
    ReliabilityDiagram, RootMeanSquareError, SampleSize, SumOfSquareError, ThreatScore,
    TimeToPeakError, TimeToPeakErrorStatistic,
};

pub type ScoreEntry = MetricEntry<DoubleScoreStatistic, DoubleScoreStatistic>;
pub type DurationScoreEntry = MetricEntry<DurationDiagramStatistic, DurationScoreStatistic>;

/// A metric implementation, tagged by the shape of statistic it produces.
pub enum ResolvedMetric {
    DoubleScore(ScoreEntry),
    Diagram(Arc<dyn Metric<DiagramStatistic>>),
    Boxplot(Arc<dyn Metric<BoxplotStatistic>>),
    DurationDiagram(Arc<dyn Metric<DurationDiagramStatistic>>),
    DurationScore(DurationScoreEntry),
}

/// Resolves metric names into implementations. Resolution happens once, when
/// a collection is built; computing statistics never dispatches on names.
pub struct MetricFactory;

fn plain_score<M>(metric: M) -> ResolvedMetric
where
    M: Metric<DoubleScoreStatistic> + 'static,
{
    ResolvedMetric::DoubleScore(MetricEntry::Plain(Arc::new(metric)))
}

fn collectable_score<M>(metric: M) -> ResolvedMetric
where
    M: Collectable<DoubleScoreStatistic, DoubleScoreStatistic> + 'static,
{
    ResolvedMetric::DoubleScore(MetricEntry::Collectable(Arc::new(metric)))
}

fn wrong_shape(metric: MetricName, shape: &'static str) -> ParameterError {
    ParameterError::WrongShape { metric, shape }
}

impl MetricFactory {
    /// # Errors
    ///
    /// Returns [`ParameterError::SummaryOnly`] for metrics that only summary
    /// statistics produce.
    pub fn resolve(metric: MetricName) -> Result<ResolvedMetric, ParameterError> {
        let resolved = match metric {
            MetricName::MeanError => plain_score(MeanError),
            MetricName::MeanAbsoluteError => plain_score(MeanAbsoluteError),
            MetricName::BiasFraction => plain_score(BiasFraction),
            MetricName::SampleSize => plain_score(SampleSize),
            MetricName::ContingencyTable => collectable_score(ContingencyTable),
            MetricName::BrierScore => collectable_score(BrierScore),
            MetricName::ContinuousRankedProbabilityScore => {
                plain_score(ContinuousRankedProbabilityScore)
            }
            MetricName::SumOfSquareError => collectable_score(SumOfSquareError),
            MetricName::MeanSquareError => collectable_score(MeanSquareError),
            MetricName::RootMeanSquareError => collectable_score(RootMeanSquareError),
            MetricName::MeanSquareErrorSkillScore => collectable_score(MeanSquareErrorSkillScore),
            MetricName::PearsonCorrelationCoefficient => {
                collectable_score(PearsonCorrelationCoefficient)
            }
            MetricName::CoefficientOfDetermination => {
                collectable_score(CoefficientOfDetermination)
            }
            MetricName::ThreatScore => collectable_score(ThreatScore),
            MetricName::ProbabilityOfDetection => collectable_score(ProbabilityOfDetection),
            MetricName::ProbabilityOfFalseDetection => {
                collectable_score(ProbabilityOfFalseDetection)
            }
            MetricName::PeirceSkillScore => collectable_score(PeirceSkillScore),
            MetricName::EquitableThreatScore => collectable_score(EquitableThreatScore),
            MetricName::FrequencyBias => collectable_score(FrequencyBias),
            MetricName::BrierSkillScore => collectable_score(BrierSkillScore),
            MetricName::QuantileQuantileDiagram => {
                ResolvedMetric::Diagram(Arc::new(QuantileQuantileDiagram::default()))
            }
            MetricName::ReliabilityDiagram => {
                ResolvedMetric::Diagram(Arc::new(ReliabilityDiagram::default()))
            }
            MetricName::BoxPlotOfErrors => {
                ResolvedMetric::Boxplot(Arc::new(BoxPlotOfErrors::default()))
            }
            MetricName::TimeToPeakError => {
                ResolvedMetric::DurationDiagram(Arc::new(TimeToPeakError))
            }
            MetricName::TimeToPeakErrorStatistic => ResolvedMetric::DurationScore(
                MetricEntry::Collectable(Arc::new(TimeToPeakErrorStatistic::default())),
            ),
            MetricName::Histogram | MetricName::BoxPlot => {
                return Err(ParameterError::SummaryOnly { metric });
            }
        };
        Ok(resolved)
    }

    /// # Errors
    ///
    /// Returns an error when the metric does not produce double scores.
    pub fn double_score(metric: MetricName) -> Result<ScoreEntry, ParameterError> {
        let ResolvedMetric::DoubleScore(entry) = Self::resolve(metric)? else {
            return Err(wrong_shape(metric, "double score"));
        };
        Ok(entry)
    }

    /// # Errors
    ///
    /// Returns an error when the metric does not produce diagrams.
    pub fn diagram(
        metric: MetricName,
    ) -> Result<Arc<dyn Metric<DiagramStatistic>>, ParameterError> {
        let ResolvedMetric::Diagram(diagram) = Self::resolve(metric)? else {
            return Err(wrong_shape(metric, "diagram"));
        };
        Ok(diagram)
    }

    /// # Errors
    ///
    /// Returns an error when the metric does not produce box plots.
    pub fn boxplot(
        metric: MetricName,
    ) -> Result<Arc<dyn Metric<BoxplotStatistic>>, ParameterError> {
        let ResolvedMetric::Boxplot(boxplot) = Self::resolve(metric)? else {
            return Err(wrong_shape(metric, "box plot"));
        };
        Ok(boxplot)
    }

    /// # Errors
    ///
    /// Returns an error when the metric does not produce duration diagrams.
    pub fn duration_diagram(
        metric: MetricName,
    ) -> Result<Arc<dyn Metric<DurationDiagramStatistic>>, ParameterError> {
        let ResolvedMetric::DurationDiagram(diagram) = Self::resolve(metric)? else {
            return Err(wrong_shape(metric, "duration diagram"));
        };
        Ok(diagram)
    }

    /// # Errors
    ///
    /// Returns an error when the metric does not produce duration scores.
    pub fn duration_score(metric: MetricName) -> Result<DurationScoreEntry, ParameterError> {
        let ResolvedMetric::DurationScore(entry) = Self::resolve(metric)? else {
            return Err(wrong_shape(metric, "duration score"));
        };
        Ok(entry)
    }

    /// # Errors
    ///
    /// Returns [`ParameterError::NotIncremental`] for metrics whose
    /// intermediate cannot be combined across pools.
    pub fn incremental(
        metric: MetricName,
    ) -> Result<Arc<dyn Incremental<DoubleScoreStatistic, DoubleScoreStatistic>>, ParameterError>
    {
        match metric {
            MetricName::SumOfSquareError => Ok(Arc::new(SumOfSquareError)),
            MetricName::MeanSquareError => Ok(Arc::new(MeanSquareError)),
            MetricName::ContingencyTable => Ok(Arc::new(ContingencyTable)),
            MetricName::MeanError
            | MetricName::MeanAbsoluteError
            | MetricName::BiasFraction
            | MetricName::SampleSize
            | MetricName::RootMeanSquareError
            | MetricName::MeanSquareErrorSkillScore
            | MetricName::PearsonCorrelationCoefficient
            | MetricName::CoefficientOfDetermination
            | MetricName::QuantileQuantileDiagram
            | MetricName::BoxPlotOfErrors
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::PeirceSkillScore
            | MetricName::EquitableThreatScore
            | MetricName::FrequencyBias
            | MetricName::BrierScore
            | MetricName::BrierSkillScore
            | MetricName::ReliabilityDiagram
            | MetricName::ContinuousRankedProbabilityScore
            | MetricName::TimeToPeakError
            | MetricName::TimeToPeakErrorStatistic
            | MetricName::Histogram
            | MetricName::BoxPlot => Err(ParameterError::NotIncremental { metric }),
        }
    }

    /// Collection of double-score metrics, grouped by shared intermediate.
    ///
    /// # Errors
    ///
    /// Returns an error when any metric does not produce double scores.
    pub fn score_collection(
        metrics: &[MetricName],
    ) -> Result<MetricCollectionBuilder<DoubleScoreStatistic, DoubleScoreStatistic>, ParameterError>
    {
        metrics
            .iter()
            .try_fold(MetricCollectionBuilder::default(), |builder, &metric| {
                Ok(builder.with_entry(Self::double_score(metric)?))
            })
    }

    /// # Errors
    ///
    /// Returns an error when any metric does not produce diagrams.
    pub fn diagram_collection(
        metrics: &[MetricName],
    ) -> Result<MetricCollectionBuilder<DiagramStatistic, DiagramStatistic>, ParameterError> {
        metrics
            .iter()
            .try_fold(MetricCollectionBuilder::default(), |builder, &metric| {
                Ok(builder.with_metric(Self::diagram(metric)?))
            })
    }

    /// # Errors
    ///
    /// Returns an error when any metric does not produce box plots.
    pub fn boxplot_collection(
        metrics: &[MetricName],
    ) -> Result<MetricCollectionBuilder<BoxplotStatistic, BoxplotStatistic>, ParameterError> {
        metrics
            .iter()
            .try_fold(MetricCollectionBuilder::default(), |builder, &metric| {
                Ok(builder.with_metric(Self::boxplot(metric)?))
            })
    }

    /// # Errors
    ///
    /// Returns an error when any metric does not produce duration diagrams.
    pub fn duration_diagram_collection(
        metrics: &[MetricName],
    ) -> Result<
        MetricCollectionBuilder<DurationDiagramStatistic, DurationDiagramStatistic>,
        ParameterError,
    > {
        metrics
            .iter()
            .try_fold(MetricCollectionBuilder::default(), |builder, &metric| {
                Ok(builder.with_metric(Self::duration_diagram(metric)?))
            })
    }

    /// # Errors
    ///
    /// Returns an error when any metric does not produce duration scores.
    pub fn duration_score_collection(
        metrics: &[MetricName],
    ) -> Result<
        MetricCollectionBuilder<DurationDiagramStatistic, DurationScoreStatistic>,
        ParameterError,
    > {
        metrics
            .iter()
            .try_fold(MetricCollectionBuilder::default(), |builder, &metric| {
                Ok(builder.with_entry(Self::duration_score(metric)?))
            })
    }
}
