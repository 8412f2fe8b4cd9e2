use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::TimeDelta;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::error::{ParameterError, SummaryError};
use crate::functions::{self, DEFAULT_BOX_PROBABILITIES};
use crate::metrics::COUNT;
use crate::pool::PoolMetadata;
use crate::statistics::{
    BoxplotBox, BoxplotStatistic, ComponentName, DiagramComponent, DiagramStatistic,
    DoubleScoreStatistic, DurationDiagramStatistic, DurationScoreStatistic, InstantDuration,
    MetricName, Statistics,
};

use super::function::{Reduction, SummaryFunction, box_quantiles, durations_in};
use super::store::{InstantStore, RowStore, SampleKey, SampleStore};
use super::types::{SummaryOptions, SummaryStatistic};

/// Statistics recorded on first sight, used to shape the summaries.
#[derive(Default)]
struct Templates {
    double_scores: DashMap<MetricName, DoubleScoreStatistic>,
    diagrams: DashMap<MetricName, DiagramStatistic>,
    duration_scores: DashMap<MetricName, DurationScoreStatistic>,
    duration_diagrams: DashMap<MetricName, DurationDiagramStatistic>,
}

/// Values of one component, ready for a histogram or box plot.
struct ComponentSamples {
    metric: MetricName,
    component: ComponentName,
    units: String,
    values: Vec<f64>,
}

/// Reduces statistics accumulated across many pools (features, resamples or
/// date pools) into one blob per summary statistic.
///
/// [`accept`](Self::accept) may be called from any number of threads. The
/// first call to [`get`](Self::get) closes the calculator: later accepts fail
/// with [`SummaryError::Closed`] and later gets return the cached result.
pub struct SummaryStatisticsCalculator {
    statistics: Vec<(SummaryStatistic, SummaryFunction)>,
    options: SummaryOptions,
    gate: RwLock<()>,
    closed: AtomicBool,
    result: OnceLock<Result<Vec<Statistics>, SummaryError>>,
    nominal: Mutex<Option<Arc<PoolMetadata>>>,
    templates: Templates,
    scores: SampleStore<f64>,
    diagrams: RowStore,
    durations: SampleStore<Option<TimeDelta>>,
    instants: InstantStore,
}

fn sorted_templates<T: Clone>(templates: &DashMap<MetricName, T>) -> Vec<T> {
    let mut sorted: Vec<(MetricName, T)> = templates
        .iter()
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();
    sorted.sort_by_key(|(metric, _)| *metric);
    sorted.into_iter().map(|(_, template)| template).collect()
}

fn missing(key: &SampleKey) -> SummaryError {
    SummaryError::MissingSamples {
        metric: key.metric,
        component: key.component,
        qualifier: key.describe_qualifier(),
    }
}

fn unique(seen: &mut HashSet<SampleKey>, key: SampleKey) -> Result<(), SummaryError> {
    if seen.contains(&key) {
        return Err(SummaryError::DuplicateComponent {
            metric: key.metric,
            component: key.component,
            qualifier: key.describe_qualifier(),
        });
    }
    seen.insert(key);
    Ok(())
}

/// Every statistic in the blob must name each component once.
fn check_components(statistics: &Statistics) -> Result<(), SummaryError> {
    for score in &statistics.double_scores {
        let mut seen = HashSet::new();
        for component in &score.components {
            unique(&mut seen, SampleKey::new(score.metric, component.name))?;
        }
    }
    for diagram in &statistics.diagrams {
        let mut seen = HashSet::new();
        for component in &diagram.components {
            let key = SampleKey::qualified(
                diagram.metric,
                component.name,
                component.qualifier.as_deref(),
            );
            unique(&mut seen, key)?;
        }
    }
    for score in &statistics.duration_scores {
        let mut seen = HashSet::new();
        for component in &score.components {
            unique(&mut seen, SampleKey::new(score.metric, component.name))?;
        }
    }
    Ok(())
}

impl SummaryStatisticsCalculator {
    /// # Errors
    ///
    /// Returns an error when no summary statistic is given or one lacks a
    /// required parameter.
    pub fn new(
        statistics: &[SummaryStatistic],
        options: SummaryOptions,
    ) -> Result<Self, ParameterError> {
        if statistics.is_empty() {
            return Err(ParameterError::NoSummaryStatistics);
        }
        let statistics = statistics
            .iter()
            .map(|statistic| Ok((*statistic, SummaryFunction::of(statistic)?)))
            .collect::<Result<Vec<_>, ParameterError>>()?;
        Ok(Self {
            statistics,
            options,
            gate: RwLock::new(()),
            closed: AtomicBool::new(false),
            result: OnceLock::new(),
            nominal: Mutex::new(None),
            templates: Templates::default(),
            scores: SampleStore::default(),
            diagrams: RowStore::default(),
            durations: SampleStore::default(),
            instants: InstantStore::default(),
        })
    }

    #[must_use]
    pub fn summary_statistics(&self) -> Vec<SummaryStatistic> {
        self.statistics.iter().map(|(statistic, _)| *statistic).collect()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn allows(&self, metric: MetricName) -> bool {
        let allowed = self.options.policy.allows(metric);
        if !allowed {
            tracing::debug!("Not summarizing statistics for metric {}", metric);
        }
        allowed
    }

    fn fold_metadata(&self, metadata: &Arc<PoolMetadata>) {
        let mut nominal = self.nominal.lock();
        let next = match (nominal.take(), &self.options.metadata_aggregator) {
            (None, _) => Arc::clone(metadata),
            (Some(current), Some(aggregate)) => Arc::new(aggregate(&current, metadata)),
            (Some(current), None) => current,
        };
        *nominal = Some(next);
    }

    /// Add the statistics of one pool to the samples.
    ///
    /// Returns `Ok(false)` when the filter rejects the blob.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Closed`] after [`get`](Self::get) was called,
    /// and [`SummaryError::DuplicateComponent`] when a statistic repeats a
    /// component. Nothing is added when an error is returned.
    pub fn accept(&self, statistics: &Statistics) -> Result<bool, SummaryError> {
        let _gate = self.gate.read();
        if self.is_closed() {
            return Err(SummaryError::Closed);
        }
        if self
            .options
            .filter
            .as_ref()
            .is_some_and(|filter| !filter(statistics))
        {
            tracing::trace!(
                "Summary filter rejected statistics for {:?}",
                statistics.metadata.features
            );
            return Ok(false);
        }
        check_components(statistics)?;
        self.fold_metadata(&statistics.metadata);

        for score in statistics.double_scores.iter().filter(|s| self.allows(s.metric)) {
            self.templates
                .double_scores
                .entry(score.metric)
                .or_insert_with(|| score.clone());
            for component in &score.components {
                let key = SampleKey::new(score.metric, component.name);
                self.scores.append(&key, component.value);
            }
        }
        for diagram in statistics.diagrams.iter().filter(|d| self.allows(d.metric)) {
            self.templates
                .diagrams
                .entry(diagram.metric)
                .or_insert_with(|| diagram.clone());
            for component in &diagram.components {
                let key = SampleKey::qualified(
                    diagram.metric,
                    component.name,
                    component.qualifier.as_deref(),
                );
                self.diagrams.append(&key, &component.values);
            }
        }
        for score in statistics.duration_scores.iter().filter(|s| self.allows(s.metric)) {
            self.templates
                .duration_scores
                .entry(score.metric)
                .or_insert_with(|| score.clone());
            for component in &score.components {
                let key = SampleKey::new(score.metric, component.name);
                self.durations.append(&key, component.value);
            }
        }
        for diagram in statistics
            .duration_diagrams
            .iter()
            .filter(|d| self.allows(d.metric))
        {
            self.templates
                .duration_diagrams
                .entry(diagram.metric)
                .or_insert_with(|| diagram.clone());
            for pair in &diagram.pairs {
                self.instants.append(diagram.metric, pair.instant, pair.duration);
            }
        }

        let boxplots = statistics.boxplots_per_pair.len() + statistics.boxplots_per_pool.len();
        if boxplots > 0 {
            tracing::debug!("Not summarizing {} box plot statistics", boxplots);
        }
        Ok(true)
    }

    /// Close the calculator and compute the summaries. Waits for accepts in
    /// progress; computes once and returns the same result on later calls.
    ///
    /// # Errors
    ///
    /// Returns an error when the accumulated samples do not match the
    /// recorded statistic shapes.
    pub fn get(&self) -> Result<Vec<Statistics>, SummaryError> {
        self.result
            .get_or_init(|| {
                {
                    let _gate = self.gate.write();
                    self.closed.store(true, Ordering::Release);
                }
                self.calculate()
            })
            .clone()
    }

    fn calculate(&self) -> Result<Vec<Statistics>, SummaryError> {
        let Some(nominal) = self.nominal.lock().clone() else {
            tracing::debug!("No statistics were accepted, nothing to summarize");
            return Ok(Vec::new());
        };
        let mut blobs = Vec::with_capacity(self.statistics.len());
        for (statistic, function) in &self.statistics {
            let mut blob = Statistics::new(Arc::clone(&nominal)).with_summary_statistic(*statistic);
            match function {
                SummaryFunction::Scalar(reduction) => {
                    self.reduce(*reduction, &mut blob)?;
                }
                SummaryFunction::Histogram(bins) => {
                    for samples in self.component_samples()? {
                        blob.diagrams.push(histogram_of(*bins, &blob, &samples)?);
                    }
                }
                SummaryFunction::Boxplot => {
                    for samples in self.component_samples()? {
                        blob.boxplots_per_pool.push(boxplot_of(&blob, samples));
                    }
                }
            }
            if blob.is_empty() {
                tracing::debug!("Summary statistic {} produced no statistics", statistic);
                continue;
            }
            blobs.push(blob);
        }
        Ok(blobs)
    }

    /// Apply a scalar reduction to every accumulated component.
    fn reduce(&self, reduction: Reduction, blob: &mut Statistics) -> Result<(), SummaryError> {
        let minimum = self.options.minimum_sample_size;
        let summary_statistic = blob.summary_statistic;

        for mut score in sorted_templates(&self.templates.double_scores) {
            score.metadata = Arc::clone(&blob.metadata);
            score.summary_statistic = summary_statistic;
            for component in &mut score.components {
                let key = SampleKey::new(score.metric, component.name);
                let samples = self.scores.samples(&key).ok_or_else(|| missing(&key))?;
                component.value = reduction.apply(&samples, minimum);
            }
            blob.double_scores.push(score);
        }

        for mut diagram in sorted_templates(&self.templates.diagrams) {
            diagram.metadata = Arc::clone(&blob.metadata);
            diagram.summary_statistic = summary_statistic;
            for component in &mut diagram.components {
                let key = SampleKey::qualified(
                    diagram.metric,
                    component.name,
                    component.qualifier.as_deref(),
                );
                let rows = self.diagrams.rows(&key).ok_or_else(|| missing(&key))?;
                component.values = rows
                    .iter()
                    .map(|row| reduction.apply(row, minimum))
                    .collect();
            }
            blob.diagrams.push(diagram);
        }

        for mut score in sorted_templates(&self.templates.duration_scores) {
            score.metadata = Arc::clone(&blob.metadata);
            score.summary_statistic = summary_statistic;
            for component in &mut score.components {
                let key = SampleKey::new(score.metric, component.name);
                let samples = self.durations.samples(&key).ok_or_else(|| missing(&key))?;
                component.value = reduction.apply_durations(&samples, minimum);
            }
            blob.duration_scores.push(score);
        }

        for mut diagram in sorted_templates(&self.templates.duration_diagrams) {
            diagram.metadata = Arc::clone(&blob.metadata);
            diagram.summary_statistic = summary_statistic;
            diagram.pairs = self
                .instants
                .instants(diagram.metric)
                .into_iter()
                .filter_map(|(instant, durations)| {
                    let durations: Vec<Option<TimeDelta>> = durations.into_iter().map(Some).collect();
                    reduction
                        .apply_durations(&durations, minimum)
                        .map(|duration| InstantDuration { instant, duration })
                })
                .collect();
            blob.duration_diagrams.push(diagram);
        }
        Ok(())
    }

    /// Samples of every double-score and duration-score component with at
    /// least one present value, in metric order. Durations are expressed in
    /// the configured unit.
    fn component_samples(&self) -> Result<Vec<ComponentSamples>, SummaryError> {
        let mut all = Vec::new();
        for score in sorted_templates(&self.templates.double_scores) {
            for component in &score.components {
                let key = SampleKey::new(score.metric, component.name);
                let values = self.scores.samples(&key).ok_or_else(|| missing(&key))?;
                all.push(ComponentSamples {
                    metric: score.metric,
                    component: component.name,
                    units: component.units.clone(),
                    values,
                });
            }
        }
        let unit = self.options.duration_unit;
        for score in sorted_templates(&self.templates.duration_scores) {
            for component in &score.components {
                let key = SampleKey::new(score.metric, component.name);
                let samples = self.durations.samples(&key).ok_or_else(|| missing(&key))?;
                all.push(ComponentSamples {
                    metric: score.metric,
                    component: component.name,
                    units: unit.as_str().to_owned(),
                    values: durations_in(unit, &samples),
                });
            }
        }
        all.retain(|samples| samples.values.iter().any(|v| !v.is_nan()));
        Ok(all)
    }
}

fn histogram_of(
    bins: u32,
    blob: &Statistics,
    samples: &ComponentSamples,
) -> Result<DiagramStatistic, SummaryError> {
    let histogram = functions::histogram(bins, &samples.values).map_err(|err| {
        SummaryError::Calculation {
            message: err.to_string(),
        }
    })?;
    let mut diagram = DiagramStatistic::new(MetricName::Histogram, Arc::clone(&blob.metadata))
        .with_component(DiagramComponent::new(
            ComponentName::BinUpperBound,
            histogram.upper_bounds,
            &samples.units,
        ))
        .with_component(
            DiagramComponent::new(ComponentName::Count, histogram.counts, COUNT)
                .with_bounds(0.0, f64::INFINITY),
        );
    diagram.summary_statistic = blob.summary_statistic;
    diagram.statistic_name = Some(samples.metric);
    diagram.statistic_component = Some(samples.component);
    Ok(diagram)
}

fn boxplot_of(blob: &Statistics, samples: ComponentSamples) -> BoxplotStatistic {
    let mut boxplot = BoxplotStatistic::new(
        MetricName::BoxPlot,
        DEFAULT_BOX_PROBABILITIES.to_vec(),
        Arc::clone(&blob.metadata),
    );
    boxplot.boxes.push(BoxplotBox {
        linked_value: None,
        quantiles: box_quantiles(&samples.values),
    });
    boxplot.units = samples.units;
    boxplot.summary_statistic = blob.summary_statistic;
    boxplot.statistic_name = Some(samples.metric);
    boxplot.statistic_component = Some(samples.component);
    boxplot
}
