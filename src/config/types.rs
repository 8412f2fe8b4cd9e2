use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::statistics::MetricName;
use crate::summary::{DurationUnit, SummaryDimension, SummaryStatisticName};

/// Engine configuration as read from `skillstat.toml` or `skillstat.json`.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    pub engine: Option<EngineSection>,
    pub metrics: Option<Vec<MetricName>>,
    pub summary: Option<SummarySection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineSection {
    #[serde(alias = "workers")]
    pub worker_threads: Option<usize>,
    pub task_timeout: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummarySection {
    pub statistics: Option<Vec<SummaryStatisticConfig>>,
    pub duration_unit: Option<DurationUnit>,
    pub minimum_sample_size: Option<usize>,
    /// When present, only these metrics are summarized.
    pub allow: Option<Vec<MetricName>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryStatisticConfig {
    pub name: SummaryStatisticName,
    #[serde(default)]
    pub dimension: SummaryDimension,
    pub probability: Option<f64>,
    #[serde(alias = "bins")]
    pub histogram_bins: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ConfigError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
