use std::sync::Arc;

use crate::error::MetricResult;
use crate::pool::{DichotomousPair, Pool, PoolMetadata};
use crate::statistics::{ComponentName, DoubleScoreStatistic, MetricName};

use super::{COUNT, Collectable, Incremental, Metric, component, expect_intermediate, main_score};

/// Cells of a 2x2 contingency table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Cells {
    true_positives: f64,
    false_positives: f64,
    false_negatives: f64,
    true_negatives: f64,
}

impl Cells {
    fn count(pairs: &[DichotomousPair]) -> Self {
        pairs.iter().fold(Self::default(), |mut cells, pair| {
            match (pair.observed, pair.predicted) {
                (true, true) => cells.true_positives += 1.0,
                (false, true) => cells.false_positives += 1.0,
                (true, false) => cells.false_negatives += 1.0,
                (false, false) => cells.true_negatives += 1.0,
            }
            cells
        })
    }

    fn read(metric: MetricName, table: &DoubleScoreStatistic) -> MetricResult<Self> {
        expect_intermediate(metric, MetricName::ContingencyTable, table)?;
        Ok(Self {
            true_positives: component(metric, table, ComponentName::TruePositives)?,
            false_positives: component(metric, table, ComponentName::FalsePositives)?,
            false_negatives: component(metric, table, ComponentName::FalseNegatives)?,
            true_negatives: component(metric, table, ComponentName::TrueNegatives)?,
        })
    }

    fn add(self, other: Self) -> Self {
        Self {
            true_positives: self.true_positives + other.true_positives,
            false_positives: self.false_positives + other.false_positives,
            false_negatives: self.false_negatives + other.false_negatives,
            true_negatives: self.true_negatives + other.true_negatives,
        }
    }

    fn total(self) -> f64 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    fn statistic(self, metadata: Arc<PoolMetadata>) -> DoubleScoreStatistic {
        DoubleScoreStatistic::new(MetricName::ContingencyTable, metadata)
            .with_component(ComponentName::TruePositives, self.true_positives, COUNT)
            .with_component(ComponentName::FalsePositives, self.false_positives, COUNT)
            .with_component(ComponentName::FalseNegatives, self.false_negatives, COUNT)
            .with_component(ComponentName::TrueNegatives, self.true_negatives, COUNT)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    let value = numerator / denominator;
    if value.is_finite() { value } else { f64::NAN }
}

/// Counts of hits, false alarms, misses and correct negatives. Shared
/// intermediate of the dichotomous scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContingencyTable;

impl Metric<DoubleScoreStatistic> for ContingencyTable {
    fn name(&self) -> MetricName {
        MetricName::ContingencyTable
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.dichotomous(self.name())?;
        Ok(Cells::count(pairs).statistic(pool.shared_metadata()))
    }
}

impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for ContingencyTable {
    fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        self.apply(pool)
    }

    fn aggregate(
        &self,
        intermediate: &DoubleScoreStatistic,
        _pool: &Pool,
    ) -> MetricResult<DoubleScoreStatistic> {
        Cells::read(self.name(), intermediate)?;
        Ok(intermediate.clone())
    }

    fn collection_of(&self) -> MetricName {
        MetricName::ContingencyTable
    }
}

impl Incremental<DoubleScoreStatistic, DoubleScoreStatistic> for ContingencyTable {
    fn initial(&self) -> DoubleScoreStatistic {
        Cells::default().statistic(Arc::default())
    }

    fn combine(
        &self,
        pool: &Pool,
        intermediate: &DoubleScoreStatistic,
    ) -> MetricResult<DoubleScoreStatistic> {
        let running = Cells::read(self.name(), intermediate)?;
        let pairs = pool.dichotomous(self.name())?;
        Ok(running
            .add(Cells::count(pairs))
            .statistic(pool.shared_metadata()))
    }

    fn complete(&self, intermediate: &DoubleScoreStatistic) -> MetricResult<DoubleScoreStatistic> {
        Cells::read(self.name(), intermediate)?;
        Ok(intermediate.clone())
    }
}

/// Implements a dichotomous score as an aggregation of the contingency table.
macro_rules! contingency_score {
    ($(#[$doc:meta])* $name:ident, $metric:expr, |$cells:ident| $score:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Metric<DoubleScoreStatistic> for $name {
            fn name(&self) -> MetricName {
                $metric
            }

            fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
                let table = self.intermediate_statistic(pool)?;
                self.aggregate(&table, pool)
            }
        }

        impl Collectable<DoubleScoreStatistic, DoubleScoreStatistic> for $name {
            fn intermediate_statistic(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
                let pairs = pool.dichotomous(self.name())?;
                Ok(Cells::count(pairs).statistic(pool.shared_metadata()))
            }

            fn aggregate(
                &self,
                intermediate: &DoubleScoreStatistic,
                _pool: &Pool,
            ) -> MetricResult<DoubleScoreStatistic> {
                let $cells = Cells::read(self.name(), intermediate)?;
                Ok(main_score(
                    self.name(),
                    Arc::clone(&intermediate.metadata),
                    $score,
                ))
            }

            fn collection_of(&self) -> MetricName {
                MetricName::ContingencyTable
            }
        }
    };
}

contingency_score!(
    /// Critical success index: hits over hits, misses and false alarms.
    ThreatScore,
    MetricName::ThreatScore,
    |cells| ratio(
        cells.true_positives,
        cells.true_positives + cells.false_positives + cells.false_negatives,
    )
);

contingency_score!(
    /// Hit rate.
    ProbabilityOfDetection,
    MetricName::ProbabilityOfDetection,
    |cells| ratio(cells.true_positives, cells.true_positives + cells.false_negatives)
);

contingency_score!(
    /// False alarm rate.
    ProbabilityOfFalseDetection,
    MetricName::ProbabilityOfFalseDetection,
    |cells| ratio(cells.false_positives, cells.false_positives + cells.true_negatives)
);

contingency_score!(
    /// Hit rate minus false alarm rate.
    PeirceSkillScore,
    MetricName::PeirceSkillScore,
    |cells| {
        ratio(cells.true_positives, cells.true_positives + cells.false_negatives)
            - ratio(cells.false_positives, cells.false_positives + cells.true_negatives)
    }
);

contingency_score!(
    /// Threat score corrected for hits expected by chance.
    EquitableThreatScore,
    MetricName::EquitableThreatScore,
    |cells| {
        let chance = (cells.true_positives + cells.false_positives)
            * (cells.true_positives + cells.false_negatives)
            / cells.total();
        ratio(
            cells.true_positives - chance,
            cells.true_positives + cells.false_positives + cells.false_negatives - chance,
        )
    }
);

contingency_score!(
    /// Forecast event frequency over observed event frequency.
    FrequencyBias,
    MetricName::FrequencyBias,
    |cells| ratio(
        cells.true_positives + cells.false_positives,
        cells.true_positives + cells.false_negatives,
    )
);

