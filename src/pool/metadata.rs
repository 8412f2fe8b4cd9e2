use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

/// Geographic feature (location) identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Feature(pub String);

impl Feature {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounds on reference times, valid times and lead durations. `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub earliest_reference_time: Option<DateTime<Utc>>,
    pub latest_reference_time: Option<DateTime<Utc>>,
    pub earliest_valid_time: Option<DateTime<Utc>>,
    pub latest_valid_time: Option<DateTime<Utc>>,
    pub earliest_lead: Option<TimeDelta>,
    pub latest_lead: Option<TimeDelta>,
}

impl TimeWindow {
    #[must_use]
    pub fn with_leads(earliest: TimeDelta, latest: TimeDelta) -> Self {
        Self {
            earliest_lead: Some(earliest),
            latest_lead: Some(latest),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOperator {
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
}

impl ThresholdOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ThresholdOperator::Greater => ">",
            ThresholdOperator::GreaterEqual => ">=",
            ThresholdOperator::Less => "<",
            ThresholdOperator::LessEqual => "<=",
            ThresholdOperator::Equal => "==",
        }
    }
}

/// Event threshold that conditioned the pool, in real units and/or as a probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub value: Option<f64>,
    pub probability: Option<f64>,
    pub operator: ThresholdOperator,
    pub units: String,
}

impl Threshold {
    #[must_use]
    pub fn value(value: f64, operator: ThresholdOperator, units: &str) -> Self {
        Self {
            value: Some(value),
            probability: None,
            operator,
            units: units.to_owned(),
        }
    }

    /// True when `left` satisfies the threshold. Probability-only thresholds never match.
    #[must_use]
    pub fn test(&self, left: f64) -> bool {
        let Some(value) = self.value else {
            return false;
        };
        match self.operator {
            ThresholdOperator::Greater => left > value,
            ThresholdOperator::GreaterEqual => left >= value,
            ThresholdOperator::Less => left < value,
            ThresholdOperator::LessEqual => left <= value,
            ThresholdOperator::Equal => (left - value).abs() < f64::EPSILON,
        }
    }
}

/// Describes where a pool came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoolMetadata {
    pub features: BTreeSet<Feature>,
    pub time_window: TimeWindow,
    pub threshold: Option<Threshold>,
    pub measurement_unit: String,
    pub pool_id: Option<u64>,
}

impl PoolMetadata {
    #[must_use]
    pub fn for_feature(feature: &str, measurement_unit: &str) -> Self {
        let mut features = BTreeSet::new();
        features.insert(Feature::new(feature));
        Self {
            features,
            measurement_unit: measurement_unit.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_time_window(mut self, time_window: TimeWindow) -> Self {
        self.time_window = time_window;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub const fn with_pool_id(mut self, pool_id: u64) -> Self {
        self.pool_id = Some(pool_id);
        self
    }
}
