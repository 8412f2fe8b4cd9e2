use std::sync::Arc;

use crate::pool::PoolMetadata;
use crate::summary::SummaryStatistic;

use super::names::MetricName;
use super::types::{
    BoxplotStatistic, DiagramStatistic, DoubleScoreStatistic, DurationDiagramStatistic,
    DurationScoreStatistic, Statistic,
};

/// Every statistic computed for one pool, or one summary statistic across pools.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    pub metadata: Arc<PoolMetadata>,
    pub summary_statistic: Option<SummaryStatistic>,
    pub double_scores: Vec<DoubleScoreStatistic>,
    pub diagrams: Vec<DiagramStatistic>,
    pub duration_scores: Vec<DurationScoreStatistic>,
    pub duration_diagrams: Vec<DurationDiagramStatistic>,
    /// One box per pair.
    pub boxplots_per_pair: Vec<BoxplotStatistic>,
    /// One box per pool.
    pub boxplots_per_pool: Vec<BoxplotStatistic>,
}

impl Statistics {
    #[must_use]
    pub fn new(metadata: Arc<PoolMetadata>) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Collect statistics of any shape into one blob. Box plots with one box
    /// per pair land in the per-pair list, the rest in the per-pool list.
    #[must_use]
    pub fn from_statistics<I>(metadata: Arc<PoolMetadata>, statistics: I) -> Self
    where
        I: IntoIterator<Item = Statistic>,
    {
        let mut blob = Self::new(metadata);
        for statistic in statistics {
            blob.push(statistic);
        }
        blob
    }

    pub fn push(&mut self, statistic: Statistic) {
        match statistic {
            Statistic::DoubleScore(s) => self.double_scores.push(s),
            Statistic::Diagram(s) => self.diagrams.push(s),
            Statistic::DurationScore(s) => self.duration_scores.push(s),
            Statistic::DurationDiagram(s) => self.duration_diagrams.push(s),
            Statistic::Boxplot(s) => {
                if s.boxes.iter().any(|b| b.linked_value.is_some()) {
                    self.boxplots_per_pair.push(s);
                } else {
                    self.boxplots_per_pool.push(s);
                }
            }
        }
    }

    #[must_use]
    pub fn with_summary_statistic(mut self, summary_statistic: SummaryStatistic) -> Self {
        self.summary_statistic = Some(summary_statistic);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.double_scores.is_empty()
            && self.diagrams.is_empty()
            && self.duration_scores.is_empty()
            && self.duration_diagrams.is_empty()
            && self.boxplots_per_pair.is_empty()
            && self.boxplots_per_pool.is_empty()
    }

    /// Number of statistics across all shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.double_scores.len()
            + self.diagrams.len()
            + self.duration_scores.len()
            + self.duration_diagrams.len()
            + self.boxplots_per_pair.len()
            + self.boxplots_per_pool.len()
    }

    #[must_use]
    pub fn double_score(&self, metric: MetricName) -> Option<&DoubleScoreStatistic> {
        self.double_scores.iter().find(|s| s.metric == metric)
    }

    #[must_use]
    pub fn diagram(&self, metric: MetricName) -> Option<&DiagramStatistic> {
        self.diagrams.iter().find(|s| s.metric == metric)
    }
}
