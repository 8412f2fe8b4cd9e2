use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::pool::PoolMetadata;
use crate::summary::SummaryStatistic;

use super::names::{ComponentName, MetricName};

/// Range and perfect value of a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    pub minimum: f64,
    pub maximum: f64,
    pub optimum: f64,
}

impl ScoreBounds {
    #[must_use]
    pub const fn of(metric: MetricName) -> Self {
        Self {
            minimum: metric.minimum(),
            maximum: metric.maximum(),
            optimum: metric.optimum(),
        }
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            minimum: f64::NEG_INFINITY,
            maximum: f64::INFINITY,
            optimum: f64::NAN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleScoreComponent {
    pub name: ComponentName,
    pub value: f64,
    pub bounds: ScoreBounds,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleScoreStatistic {
    pub metric: MetricName,
    pub components: Vec<DoubleScoreComponent>,
    pub metadata: Arc<PoolMetadata>,
    pub summary_statistic: Option<SummaryStatistic>,
}

impl DoubleScoreStatistic {
    #[must_use]
    pub const fn new(metric: MetricName, metadata: Arc<PoolMetadata>) -> Self {
        Self {
            metric,
            components: Vec::new(),
            metadata,
            summary_statistic: None,
        }
    }

    /// Add a component bounded like the statistic's metric.
    #[must_use]
    pub fn with_component(mut self, name: ComponentName, value: f64, units: &str) -> Self {
        let bounds = if name == ComponentName::SampleSize {
            ScoreBounds::of(MetricName::SampleSize)
        } else {
            ScoreBounds::of(self.metric)
        };
        self.components.push(DoubleScoreComponent {
            name,
            value,
            bounds,
            units: units.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn component(&self, name: ComponentName) -> Option<&DoubleScoreComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn value(&self, name: ComponentName) -> Option<f64> {
        self.component(name).map(|c| c.value)
    }

    #[must_use]
    pub fn main(&self) -> Option<f64> {
        self.value(ComponentName::Main)
    }
}

/// One axis of a diagram. The qualifier tells apart repeated component names,
/// such as the quantile rows of an ensemble diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramComponent {
    pub name: ComponentName,
    pub qualifier: Option<String>,
    pub values: Vec<f64>,
    pub minimum: f64,
    pub maximum: f64,
    pub units: String,
}

impl DiagramComponent {
    #[must_use]
    pub fn new(name: ComponentName, values: Vec<f64>, units: &str) -> Self {
        Self {
            name,
            qualifier: None,
            values,
            minimum: f64::NEG_INFINITY,
            maximum: f64::INFINITY,
            units: units.to_owned(),
        }
    }

    #[must_use]
    pub const fn with_bounds(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    #[must_use]
    pub fn with_qualifier(mut self, qualifier: &str) -> Self {
        self.qualifier = Some(qualifier.to_owned());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramStatistic {
    pub metric: MetricName,
    pub components: Vec<DiagramComponent>,
    pub metadata: Arc<PoolMetadata>,
    pub summary_statistic: Option<SummaryStatistic>,
    /// Metric whose statistic this diagram describes, for summary histograms.
    pub statistic_name: Option<MetricName>,
    pub statistic_component: Option<ComponentName>,
}

impl DiagramStatistic {
    #[must_use]
    pub const fn new(metric: MetricName, metadata: Arc<PoolMetadata>) -> Self {
        Self {
            metric,
            components: Vec::new(),
            metadata,
            summary_statistic: None,
            statistic_name: None,
            statistic_component: None,
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: DiagramComponent) -> Self {
        self.components.push(component);
        self
    }

    #[must_use]
    pub fn component(&self, name: ComponentName) -> Option<&DiagramComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationScoreComponent {
    pub name: ComponentName,
    /// Absent when the pool produced no durations.
    pub value: Option<TimeDelta>,
    pub minimum: Option<TimeDelta>,
    pub maximum: Option<TimeDelta>,
    pub optimum: TimeDelta,
}

impl DurationScoreComponent {
    #[must_use]
    pub const fn new(name: ComponentName, value: Option<TimeDelta>) -> Self {
        Self {
            name,
            value,
            minimum: None,
            maximum: None,
            optimum: TimeDelta::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DurationScoreStatistic {
    pub metric: MetricName,
    pub components: Vec<DurationScoreComponent>,
    pub metadata: Arc<PoolMetadata>,
    pub summary_statistic: Option<SummaryStatistic>,
}

impl DurationScoreStatistic {
    #[must_use]
    pub const fn new(metric: MetricName, metadata: Arc<PoolMetadata>) -> Self {
        Self {
            metric,
            components: Vec::new(),
            metadata,
            summary_statistic: None,
        }
    }

    #[must_use]
    pub fn value(&self, name: ComponentName) -> Option<TimeDelta> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantDuration {
    pub instant: DateTime<Utc>,
    pub duration: TimeDelta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DurationDiagramStatistic {
    pub metric: MetricName,
    pub pairs: Vec<InstantDuration>,
    pub metadata: Arc<PoolMetadata>,
    pub summary_statistic: Option<SummaryStatistic>,
}

impl DurationDiagramStatistic {
    #[must_use]
    pub const fn new(metric: MetricName, metadata: Arc<PoolMetadata>) -> Self {
        Self {
            metric,
            pairs: Vec::new(),
            metadata,
            summary_statistic: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotBox {
    pub linked_value: Option<f64>,
    pub quantiles: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotStatistic {
    pub metric: MetricName,
    pub probabilities: Vec<f64>,
    pub boxes: Vec<BoxplotBox>,
    pub units: String,
    pub metadata: Arc<PoolMetadata>,
    pub summary_statistic: Option<SummaryStatistic>,
    pub statistic_name: Option<MetricName>,
    pub statistic_component: Option<ComponentName>,
}

impl BoxplotStatistic {
    #[must_use]
    pub fn new(metric: MetricName, probabilities: Vec<f64>, metadata: Arc<PoolMetadata>) -> Self {
        Self {
            metric,
            probabilities,
            boxes: Vec::new(),
            units: metadata.measurement_unit.clone(),
            metadata,
            summary_statistic: None,
            statistic_name: None,
            statistic_component: None,
        }
    }
}

/// A single verification statistic of any shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistic {
    DoubleScore(DoubleScoreStatistic),
    Diagram(DiagramStatistic),
    DurationScore(DurationScoreStatistic),
    DurationDiagram(DurationDiagramStatistic),
    Boxplot(BoxplotStatistic),
}

impl Statistic {
    #[must_use]
    pub const fn metric(&self) -> MetricName {
        match self {
            Statistic::DoubleScore(s) => s.metric,
            Statistic::Diagram(s) => s.metric,
            Statistic::DurationScore(s) => s.metric,
            Statistic::DurationDiagram(s) => s.metric,
            Statistic::Boxplot(s) => s.metric,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &PoolMetadata {
        match self {
            Statistic::DoubleScore(s) => &s.metadata,
            Statistic::Diagram(s) => &s.metadata,
            Statistic::DurationScore(s) => &s.metadata,
            Statistic::DurationDiagram(s) => &s.metadata,
            Statistic::Boxplot(s) => &s.metadata,
        }
    }
}

impl From<DoubleScoreStatistic> for Statistic {
    fn from(value: DoubleScoreStatistic) -> Self {
        Statistic::DoubleScore(value)
    }
}

impl From<DiagramStatistic> for Statistic {
    fn from(value: DiagramStatistic) -> Self {
        Statistic::Diagram(value)
    }
}

impl From<DurationScoreStatistic> for Statistic {
    fn from(value: DurationScoreStatistic) -> Self {
        Statistic::DurationScore(value)
    }
}

impl From<DurationDiagramStatistic> for Statistic {
    fn from(value: DurationDiagramStatistic) -> Self {
        Statistic::DurationDiagram(value)
    }
}

impl From<BoxplotStatistic> for Statistic {
    fn from(value: BoxplotStatistic) -> Self {
        Statistic::Boxplot(value)
    }
}
