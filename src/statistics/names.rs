use std::fmt;

use serde::Deserialize;

use crate::pool::PairKind;

/// Shape of the statistic a metric produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticShape {
    DoubleScore,
    Diagram,
    DurationScore,
    DurationDiagram,
    Boxplot,
}

impl StatisticShape {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StatisticShape::DoubleScore => "double score",
            StatisticShape::Diagram => "diagram",
            StatisticShape::DurationScore => "duration score",
            StatisticShape::DurationDiagram => "duration diagram",
            StatisticShape::Boxplot => "box plot",
        }
    }
}

/// Every metric the engine can compute, plus the metrics that only appear as
/// summary statistic outputs (`Histogram`, `BoxPlot`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricName {
    MeanError,
    MeanAbsoluteError,
    BiasFraction,
    SampleSize,
    SumOfSquareError,
    MeanSquareError,
    RootMeanSquareError,
    MeanSquareErrorSkillScore,
    PearsonCorrelationCoefficient,
    CoefficientOfDetermination,
    QuantileQuantileDiagram,
    BoxPlotOfErrors,
    ContingencyTable,
    ThreatScore,
    ProbabilityOfDetection,
    ProbabilityOfFalseDetection,
    PeirceSkillScore,
    EquitableThreatScore,
    FrequencyBias,
    BrierScore,
    BrierSkillScore,
    ReliabilityDiagram,
    ContinuousRankedProbabilityScore,
    TimeToPeakError,
    TimeToPeakErrorStatistic,
    Histogram,
    BoxPlot,
}

impl MetricName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricName::MeanError => "MEAN_ERROR",
            MetricName::MeanAbsoluteError => "MEAN_ABSOLUTE_ERROR",
            MetricName::BiasFraction => "BIAS_FRACTION",
            MetricName::SampleSize => "SAMPLE_SIZE",
            MetricName::SumOfSquareError => "SUM_OF_SQUARE_ERROR",
            MetricName::MeanSquareError => "MEAN_SQUARE_ERROR",
            MetricName::RootMeanSquareError => "ROOT_MEAN_SQUARE_ERROR",
            MetricName::MeanSquareErrorSkillScore => "MEAN_SQUARE_ERROR_SKILL_SCORE",
            MetricName::PearsonCorrelationCoefficient => "PEARSON_CORRELATION_COEFFICIENT",
            MetricName::CoefficientOfDetermination => "COEFFICIENT_OF_DETERMINATION",
            MetricName::QuantileQuantileDiagram => "QUANTILE_QUANTILE_DIAGRAM",
            MetricName::BoxPlotOfErrors => "BOX_PLOT_OF_ERRORS",
            MetricName::ContingencyTable => "CONTINGENCY_TABLE",
            MetricName::ThreatScore => "THREAT_SCORE",
            MetricName::ProbabilityOfDetection => "PROBABILITY_OF_DETECTION",
            MetricName::ProbabilityOfFalseDetection => "PROBABILITY_OF_FALSE_DETECTION",
            MetricName::PeirceSkillScore => "PEIRCE_SKILL_SCORE",
            MetricName::EquitableThreatScore => "EQUITABLE_THREAT_SCORE",
            MetricName::FrequencyBias => "FREQUENCY_BIAS",
            MetricName::BrierScore => "BRIER_SCORE",
            MetricName::BrierSkillScore => "BRIER_SKILL_SCORE",
            MetricName::ReliabilityDiagram => "RELIABILITY_DIAGRAM",
            MetricName::ContinuousRankedProbabilityScore => "CONTINUOUS_RANKED_PROBABILITY_SCORE",
            MetricName::TimeToPeakError => "TIME_TO_PEAK_ERROR",
            MetricName::TimeToPeakErrorStatistic => "TIME_TO_PEAK_ERROR_STATISTIC",
            MetricName::Histogram => "HISTOGRAM",
            MetricName::BoxPlot => "BOX_PLOT",
        }
    }

    #[must_use]
    pub const fn minimum(self) -> f64 {
        match self {
            MetricName::MeanError
            | MetricName::BiasFraction
            | MetricName::MeanSquareErrorSkillScore
            | MetricName::QuantileQuantileDiagram
            | MetricName::BoxPlotOfErrors
            | MetricName::BrierSkillScore
            | MetricName::TimeToPeakError
            | MetricName::TimeToPeakErrorStatistic
            | MetricName::Histogram
            | MetricName::BoxPlot => f64::NEG_INFINITY,
            MetricName::PearsonCorrelationCoefficient | MetricName::PeirceSkillScore => -1.0,
            MetricName::EquitableThreatScore => -1.0 / 3.0,
            MetricName::MeanAbsoluteError
            | MetricName::SampleSize
            | MetricName::SumOfSquareError
            | MetricName::MeanSquareError
            | MetricName::RootMeanSquareError
            | MetricName::CoefficientOfDetermination
            | MetricName::ContingencyTable
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::FrequencyBias
            | MetricName::BrierScore
            | MetricName::ReliabilityDiagram
            | MetricName::ContinuousRankedProbabilityScore => 0.0,
        }
    }

    #[must_use]
    pub const fn maximum(self) -> f64 {
        match self {
            MetricName::MeanSquareErrorSkillScore
            | MetricName::PearsonCorrelationCoefficient
            | MetricName::CoefficientOfDetermination
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::PeirceSkillScore
            | MetricName::EquitableThreatScore
            | MetricName::BrierScore
            | MetricName::BrierSkillScore
            | MetricName::ReliabilityDiagram => 1.0,
            MetricName::MeanError
            | MetricName::MeanAbsoluteError
            | MetricName::BiasFraction
            | MetricName::SampleSize
            | MetricName::SumOfSquareError
            | MetricName::MeanSquareError
            | MetricName::RootMeanSquareError
            | MetricName::QuantileQuantileDiagram
            | MetricName::BoxPlotOfErrors
            | MetricName::ContingencyTable
            | MetricName::FrequencyBias
            | MetricName::ContinuousRankedProbabilityScore
            | MetricName::TimeToPeakError
            | MetricName::TimeToPeakErrorStatistic
            | MetricName::Histogram
            | MetricName::BoxPlot => f64::INFINITY,
        }
    }

    /// Perfect score. NaN where the metric has no optimum.
    #[must_use]
    pub const fn optimum(self) -> f64 {
        match self {
            MetricName::MeanError
            | MetricName::MeanAbsoluteError
            | MetricName::BiasFraction
            | MetricName::SumOfSquareError
            | MetricName::MeanSquareError
            | MetricName::RootMeanSquareError
            | MetricName::BoxPlotOfErrors
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::BrierScore
            | MetricName::ContinuousRankedProbabilityScore
            | MetricName::TimeToPeakError
            | MetricName::TimeToPeakErrorStatistic => 0.0,
            MetricName::MeanSquareErrorSkillScore
            | MetricName::PearsonCorrelationCoefficient
            | MetricName::CoefficientOfDetermination
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::PeirceSkillScore
            | MetricName::EquitableThreatScore
            | MetricName::FrequencyBias
            | MetricName::BrierSkillScore => 1.0,
            MetricName::SampleSize => f64::INFINITY,
            MetricName::QuantileQuantileDiagram
            | MetricName::ContingencyTable
            | MetricName::ReliabilityDiagram
            | MetricName::Histogram
            | MetricName::BoxPlot => f64::NAN,
        }
    }

    #[must_use]
    pub const fn shape(self) -> StatisticShape {
        match self {
            MetricName::QuantileQuantileDiagram
            | MetricName::ReliabilityDiagram
            | MetricName::Histogram => StatisticShape::Diagram,
            MetricName::BoxPlotOfErrors | MetricName::BoxPlot => StatisticShape::Boxplot,
            MetricName::TimeToPeakError => StatisticShape::DurationDiagram,
            MetricName::TimeToPeakErrorStatistic => StatisticShape::DurationScore,
            MetricName::MeanError
            | MetricName::MeanAbsoluteError
            | MetricName::BiasFraction
            | MetricName::SampleSize
            | MetricName::SumOfSquareError
            | MetricName::MeanSquareError
            | MetricName::RootMeanSquareError
            | MetricName::MeanSquareErrorSkillScore
            | MetricName::PearsonCorrelationCoefficient
            | MetricName::CoefficientOfDetermination
            | MetricName::ContingencyTable
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::PeirceSkillScore
            | MetricName::EquitableThreatScore
            | MetricName::FrequencyBias
            | MetricName::BrierScore
            | MetricName::BrierSkillScore
            | MetricName::ContinuousRankedProbabilityScore => StatisticShape::DoubleScore,
        }
    }

    /// Kind of pairs the metric consumes. `None` for summary outputs and metrics
    /// that accept any pool.
    #[must_use]
    pub const fn pair_kind(self) -> Option<PairKind> {
        match self {
            MetricName::MeanError
            | MetricName::MeanAbsoluteError
            | MetricName::BiasFraction
            | MetricName::SumOfSquareError
            | MetricName::MeanSquareError
            | MetricName::RootMeanSquareError
            | MetricName::MeanSquareErrorSkillScore
            | MetricName::PearsonCorrelationCoefficient
            | MetricName::CoefficientOfDetermination
            | MetricName::QuantileQuantileDiagram
            | MetricName::BoxPlotOfErrors => Some(PairKind::SingleValued),
            MetricName::ContingencyTable
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::PeirceSkillScore
            | MetricName::EquitableThreatScore
            | MetricName::FrequencyBias => Some(PairKind::Dichotomous),
            MetricName::BrierScore
            | MetricName::BrierSkillScore
            | MetricName::ReliabilityDiagram => Some(PairKind::DiscreteProbability),
            MetricName::ContinuousRankedProbabilityScore => Some(PairKind::Ensemble),
            MetricName::TimeToPeakError | MetricName::TimeToPeakErrorStatistic => {
                Some(PairKind::TimeSeries)
            }
            MetricName::SampleSize | MetricName::Histogram | MetricName::BoxPlot => None,
        }
    }

    /// The intermediate statistic a collectable metric consumes.
    #[must_use]
    pub const fn collection_of(self) -> Option<MetricName> {
        match self {
            MetricName::SumOfSquareError
            | MetricName::MeanSquareError
            | MetricName::RootMeanSquareError
            | MetricName::MeanSquareErrorSkillScore => Some(MetricName::SumOfSquareError),
            MetricName::PearsonCorrelationCoefficient | MetricName::CoefficientOfDetermination => {
                Some(MetricName::PearsonCorrelationCoefficient)
            }
            MetricName::ContingencyTable
            | MetricName::ThreatScore
            | MetricName::ProbabilityOfDetection
            | MetricName::ProbabilityOfFalseDetection
            | MetricName::PeirceSkillScore
            | MetricName::EquitableThreatScore
            | MetricName::FrequencyBias => Some(MetricName::ContingencyTable),
            MetricName::BrierScore | MetricName::BrierSkillScore => Some(MetricName::BrierScore),
            MetricName::TimeToPeakErrorStatistic => Some(MetricName::TimeToPeakError),
            MetricName::MeanError
            | MetricName::MeanAbsoluteError
            | MetricName::BiasFraction
            | MetricName::SampleSize
            | MetricName::QuantileQuantileDiagram
            | MetricName::BoxPlotOfErrors
            | MetricName::ReliabilityDiagram
            | MetricName::ContinuousRankedProbabilityScore
            | MetricName::TimeToPeakError
            | MetricName::Histogram
            | MetricName::BoxPlot => None,
        }
    }

    /// Default policy for summary statistics (sampling uncertainty, feature
    /// summaries). Counts and box plots are excluded.
    #[must_use]
    pub const fn allows_summary_statistics(self) -> bool {
        !matches!(
            self,
            MetricName::SampleSize
                | MetricName::ContingencyTable
                | MetricName::BoxPlotOfErrors
                | MetricName::Histogram
                | MetricName::BoxPlot
        )
    }

    /// True for skill scores and ratios that carry no measurement unit.
    #[must_use]
    pub const fn is_dimensionless(self) -> bool {
        matches!(
            self,
            MetricName::BiasFraction
                | MetricName::MeanSquareErrorSkillScore
                | MetricName::PearsonCorrelationCoefficient
                | MetricName::CoefficientOfDetermination
                | MetricName::ThreatScore
                | MetricName::ProbabilityOfDetection
                | MetricName::ProbabilityOfFalseDetection
                | MetricName::PeirceSkillScore
                | MetricName::EquitableThreatScore
                | MetricName::FrequencyBias
                | MetricName::BrierScore
                | MetricName::BrierSkillScore
                | MetricName::ReliabilityDiagram
        )
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of one component inside a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentName {
    Main,
    SampleSize,
    TruePositives,
    FalsePositives,
    FalseNegatives,
    TrueNegatives,
    ForecastProbability,
    ObservedRelativeFrequency,
    ObservedQuantiles,
    PredictedQuantiles,
    Mean,
    Median,
    Minimum,
    Maximum,
    MeanAbsolute,
    StandardDeviation,
    BinUpperBound,
    Count,
}

impl ComponentName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ComponentName::Main => "MAIN",
            ComponentName::SampleSize => "SAMPLE_SIZE",
            ComponentName::TruePositives => "TRUE_POSITIVES",
            ComponentName::FalsePositives => "FALSE_POSITIVES",
            ComponentName::FalseNegatives => "FALSE_NEGATIVES",
            ComponentName::TrueNegatives => "TRUE_NEGATIVES",
            ComponentName::ForecastProbability => "FORECAST_PROBABILITY",
            ComponentName::ObservedRelativeFrequency => "OBSERVED_RELATIVE_FREQUENCY",
            ComponentName::ObservedQuantiles => "OBSERVED_QUANTILES",
            ComponentName::PredictedQuantiles => "PREDICTED_QUANTILES",
            ComponentName::Mean => "MEAN",
            ComponentName::Median => "MEDIAN",
            ComponentName::Minimum => "MINIMUM",
            ComponentName::Maximum => "MAXIMUM",
            ComponentName::MeanAbsolute => "MEAN_ABSOLUTE",
            ComponentName::StandardDeviation => "STANDARD_DEVIATION",
            ComponentName::BinUpperBound => "BIN_UPPER_BOUND",
            ComponentName::Count => "COUNT",
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
