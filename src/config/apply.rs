use std::collections::BTreeSet;
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};

use crate::collection::StatisticsProcessor;
use crate::error::{AppResult, ConfigError};
use crate::statistics::MetricName;
use crate::summary::{
    SummaryOptions, SummaryPolicy, SummaryStatistic, SummaryStatisticsCalculator,
};

use super::types::EngineConfig;

const WORKER_THREAD_NAME: &str = "skillstat-worker";

impl EngineConfig {
    /// Multi-thread runtime for metric tasks, sized by `engine.worker_threads`
    /// when set.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker count is zero or the runtime cannot
    /// be built.
    pub fn build_runtime(&self) -> Result<Runtime, ConfigError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name(WORKER_THREAD_NAME);
        if let Some(workers) = self.engine.as_ref().and_then(|engine| engine.worker_threads) {
            if workers == 0 {
                return Err(ConfigError::FieldMustBePositive {
                    field: "engine.worker_threads",
                });
            }
            builder.worker_threads(workers);
        }
        builder
            .build()
            .map_err(|err| ConfigError::Runtime { source: err })
    }

    /// # Errors
    ///
    /// Returns an error when `engine.task_timeout` is zero or malformed.
    pub fn task_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.engine
            .as_ref()
            .and_then(|engine| engine.task_timeout.as_ref())
            .map(|value| value.to_duration())
            .transpose()
    }

    #[must_use]
    pub fn metric_names(&self) -> &[MetricName] {
        self.metrics.as_deref().unwrap_or_default()
    }

    /// Validated summary statistic definitions, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first definition with a missing or
    /// invalid parameter.
    pub fn summary_statistics(&self) -> Result<Vec<SummaryStatistic>, ConfigError> {
        let Some(definitions) = self
            .summary
            .as_ref()
            .and_then(|summary| summary.statistics.as_ref())
        else {
            return Ok(Vec::new());
        };
        definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                SummaryStatistic::from_parts(
                    definition.name,
                    definition.dimension,
                    definition.probability,
                    definition.histogram_bins,
                )
                .map_err(|err| ConfigError::InvalidSummaryStatistic { index, source: err })
            })
            .collect()
    }

    #[must_use]
    pub fn summary_options(&self) -> SummaryOptions {
        let options = SummaryOptions::default();
        let Some(summary) = self.summary.as_ref() else {
            return options;
        };
        let options = match summary.duration_unit {
            Some(unit) => options.with_duration_unit(unit),
            None => options,
        };
        let options = match summary.minimum_sample_size {
            Some(minimum) => options.with_minimum_sample_size(minimum),
            None => options,
        };
        match summary.allow.as_ref() {
            Some(allow) => options.with_policy(SummaryPolicy::Allow(
                allow.iter().copied().collect::<BTreeSet<_>>(),
            )),
            None => options,
        }
    }

    /// Processor for the configured metrics, scheduled on `handle` or on the
    /// caller's runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when the timeout is invalid, no metric is configured,
    /// or a configured metric cannot be computed from pools.
    pub fn processor(&self, handle: Option<&Handle>) -> AppResult<StatisticsProcessor> {
        let timeout = self.task_timeout()?;
        Ok(StatisticsProcessor::new(
            self.metric_names(),
            handle,
            timeout,
        )?)
    }

    /// Calculator for the configured summary statistics.
    ///
    /// # Errors
    ///
    /// Returns an error when a definition is invalid or none is configured.
    pub fn calculator(&self) -> AppResult<SummaryStatisticsCalculator> {
        let statistics = self.summary_statistics()?;
        Ok(SummaryStatisticsCalculator::new(
            &statistics,
            self.summary_options(),
        )?)
    }
}
