//! Concurrent computation of many metrics over one pool.
//!
//! A [`MetricCollection`] runs every plain metric as its own task. Collectable
//! metrics are grouped by the intermediate they consume: each group computes
//! its intermediate once and broadcasts it to one aggregation task per member.
mod processor;
mod task;


use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinError, JoinHandle};

use crate::error::{CalculationError, MetricResult, ParameterError};
use crate::metrics::{Collectable, Metric};
use crate::pool::Pool;
use crate::statistics::MetricName;

pub use processor::StatisticsProcessor;
pub use task::{CollectableTask, InputPublisher, IntermediateTask, MetricTask, PendingInput};

const POOL_INPUT: &str = "pool";
const INTERMEDIATE_INPUT: &str = "intermediate statistic";

/// A metric as the collection schedules it.
pub enum MetricEntry<I, S> {
    Plain(Arc<dyn Metric<S>>),
    Collectable(Arc<dyn Collectable<I, S>>),
}

impl<I, S> MetricEntry<I, S> {
    #[must_use]
    pub fn name(&self) -> MetricName {
        match self {
            MetricEntry::Plain(metric) => metric.name(),
            MetricEntry::Collectable(metric) => metric.name(),
        }
    }
}

enum Outcome<S> {
    Statistic { slot: usize, statistic: S },
    Intermediate,
}

fn labelled<T>(
    metric: MetricName,
    task: JoinHandle<T>,
) -> impl Future<Output = (MetricName, Result<T, JoinError>)> {
    task.map(move |joined| (metric, joined))
}

/// Immutable set of metrics computed together over each pool.
pub struct MetricCollection<I, S> {
    metrics: Vec<Arc<dyn Metric<S>>>,
    collectables: BTreeMap<MetricName, Vec<Arc<dyn Collectable<I, S>>>>,
    handle: Option<Handle>,
    timeout: Option<Duration>,
}

/// Builds a [`MetricCollection`].
pub struct MetricCollectionBuilder<I, S> {
    metrics: Vec<Arc<dyn Metric<S>>>,
    collectables: BTreeMap<MetricName, Vec<Arc<dyn Collectable<I, S>>>>,
    handle: Option<Handle>,
    timeout: Option<Duration>,
}

impl<I, S> Default for MetricCollectionBuilder<I, S> {
    fn default() -> Self {
        Self {
            metrics: Vec::new(),
            collectables: BTreeMap::new(),
            handle: None,
            timeout: None,
        }
    }
}

impl<I, S> MetricCollectionBuilder<I, S> {
    #[must_use]
    pub fn with_metric(mut self, metric: Arc<dyn Metric<S>>) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Add a collectable metric to the group of its `collection_of` identity.
    #[must_use]
    pub fn with_collectable(mut self, metric: Arc<dyn Collectable<I, S>>) -> Self {
        self.collectables
            .entry(metric.collection_of())
            .or_default()
            .push(metric);
        self
    }

    #[must_use]
    pub fn with_entry(self, entry: MetricEntry<I, S>) -> Self {
        match entry {
            MetricEntry::Plain(metric) => self.with_metric(metric),
            MetricEntry::Collectable(metric) => self.with_collectable(metric),
        }
    }

    /// Runtime to schedule tasks on. Defaults to the runtime of the caller.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Fail an invocation that takes longer than `timeout`.
    ///
    /// The timer runs on the runtime that awaits the invocation, which must
    /// have its time driver enabled (`enable_time` or `enable_all`); tokio
    /// panics otherwise.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// # Errors
    ///
    /// Returns [`ParameterError::EmptyCollection`] when no metric was added.
    pub fn build(self) -> Result<MetricCollection<I, S>, ParameterError> {
        if self.metrics.is_empty() && self.collectables.is_empty() {
            return Err(ParameterError::EmptyCollection);
        }
        Ok(MetricCollection {
            metrics: self.metrics,
            collectables: self.collectables,
            handle: self.handle,
            timeout: self.timeout,
        })
    }
}

impl<I, S> MetricCollection<I, S>
where
    I: Send + Sync + 'static,
    S: Send + 'static,
{
    #[must_use]
    pub fn builder() -> MetricCollectionBuilder<I, S> {
        MetricCollectionBuilder::default()
    }

    /// Names of every metric, plain metrics first, then each group in
    /// identity order.
    #[must_use]
    pub fn metric_names(&self) -> Vec<MetricName> {
        self.metrics
            .iter()
            .map(|m| m.name())
            .chain(self.collectables.values().flatten().map(|m| m.name()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len() + self.collectables.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn runtime(&self) -> Result<Handle, CalculationError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }
        Handle::try_current().map_err(|_err| CalculationError::NoRuntime {
            metric: self
                .metric_names()
                .first()
                .copied()
                .unwrap_or(MetricName::SampleSize),
        })
    }

    /// Compute one statistic per metric.
    ///
    /// # Errors
    ///
    /// Returns a calculation error naming the first metric that failed. When a
    /// shared intermediate fails, its error is reported rather than the
    /// missing-input errors of the metrics waiting on it.
    pub async fn apply(&self, pool: Arc<Pool>) -> MetricResult<Vec<S>> {
        self.run(PendingInput::ready(POOL_INPUT, pool), &BTreeSet::new(), None)
            .await
    }

    /// Like [`MetricCollection::apply`], skipping the named metrics.
    ///
    /// # Errors
    ///
    /// Returns a calculation error naming the first metric that failed.
    pub async fn apply_ignoring(
        &self,
        pool: Arc<Pool>,
        ignore: &BTreeSet<MetricName>,
    ) -> MetricResult<Vec<S>> {
        self.run(PendingInput::ready(POOL_INPUT, pool), ignore, None)
            .await
    }

    /// Schedule every task at once and let them wait for a pool still being
    /// assembled. A future that yields `None` fails every metric with a
    /// missing input.
    ///
    /// # Errors
    ///
    /// Returns a calculation error naming the first metric that failed.
    pub async fn apply_pending<F>(&self, pool: F) -> MetricResult<Vec<S>>
    where
        F: Future<Output = Option<Arc<Pool>>> + Send + 'static,
    {
        let handle = self.runtime()?;
        let (publisher, pending) = PendingInput::channel(POOL_INPUT);
        let feeder = handle.spawn(async move {
            if let Some(pool) = pool.await {
                publisher.publish(pool);
            }
        });
        self.run(pending, &BTreeSet::new(), Some(feeder.abort_handle()))
            .await
    }

    /// Blocking form of [`MetricCollection::apply`] for callers outside the
    /// runtime. Must not be called from within an async context.
    ///
    /// # Errors
    ///
    /// Returns a calculation error naming the first metric that failed, or
    /// when no runtime is available.
    pub fn apply_blocking(&self, pool: Arc<Pool>) -> MetricResult<Vec<S>> {
        let handle = self.runtime()?;
        handle.block_on(self.apply(pool))
    }

    async fn run(
        &self,
        pool: PendingInput<Pool>,
        ignore: &BTreeSet<MetricName>,
        feeder: Option<AbortHandle>,
    ) -> MetricResult<Vec<S>> {
        let handle = self.runtime()?;
        let mut running = FuturesUnordered::new();
        let mut aborts: Vec<AbortHandle> = feeder.into_iter().collect();
        let mut expected = 0_usize;

        for metric in self.metrics.iter().filter(|m| !ignore.contains(&m.name())) {
            let slot = expected;
            expected += 1;
            let task = MetricTask::new(Arc::clone(metric), pool.clone());
            let spawned = handle.spawn(async move {
                let statistic = task.run().await?;
                Ok::<_, CalculationError>(Outcome::Statistic { slot, statistic })
            });
            aborts.push(spawned.abort_handle());
            running.push(labelled(metric.name(), spawned));
        }

        for (identity, group) in &self.collectables {
            let members: Vec<&Arc<dyn Collectable<I, S>>> = group
                .iter()
                .filter(|m| !ignore.contains(&m.name()))
                .collect();
            let Some(producer) = members.first() else {
                continue;
            };
            tracing::debug!(
                "Sharing intermediate {} across {} metrics",
                identity,
                members.len()
            );
            let (publisher, intermediate) = PendingInput::channel(INTERMEDIATE_INPUT);
            let task = IntermediateTask::new(Arc::clone(producer), pool.clone(), publisher);
            let spawned = handle.spawn(async move {
                task.run().await?;
                Ok::<_, CalculationError>(Outcome::Intermediate)
            });
            aborts.push(spawned.abort_handle());
            running.push(labelled(producer.name(), spawned));

            for member in members {
                let slot = expected;
                expected += 1;
                let task =
                    CollectableTask::new(Arc::clone(member), intermediate.clone(), pool.clone());
                let spawned = handle.spawn(async move {
                    let statistic = task.run().await?;
                    Ok::<_, CalculationError>(Outcome::Statistic { slot, statistic })
                });
                aborts.push(spawned.abort_handle());
                running.push(labelled(member.name(), spawned));
            }
        }
        drop(pool);

        let drain = async {
            let mut slots: Vec<Option<S>> =
                std::iter::repeat_with(|| None).take(expected).collect();
            let mut failure: Option<CalculationError> = None;
            while let Some((metric, joined)) = running.next().await {
                let result = match joined {
                    Ok(result) => result,
                    Err(source) if source.is_cancelled() && failure.is_some() => continue,
                    Err(source) => Err(CalculationError::Join { metric, source }),
                };
                match result {
                    Ok(Outcome::Statistic { slot, statistic }) => {
                        if let Some(entry) = slots.get_mut(slot) {
                            *entry = Some(statistic);
                        }
                    }
                    Ok(Outcome::Intermediate) => {}
                    Err(err) => {
                        if failure.is_none() {
                            aborts.iter().for_each(AbortHandle::abort);
                        }
                        failure = Some(prefer(failure, err));
                    }
                }
            }
            match failure {
                Some(err) => Err(err),
                None => Ok(slots.into_iter().flatten().collect()),
            }
        };

        let outcome = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, drain).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(CalculationError::Timeout { timeout }),
            },
            None => drain.await,
        };
        if outcome.is_err() {
            aborts.iter().for_each(AbortHandle::abort);
        }
        outcome.map_err(Into::into)
    }
}

/// Keep the more informative of two failures: a missing input only explains
/// that something upstream failed, so any other error replaces it.
fn prefer(current: Option<CalculationError>, next: CalculationError) -> CalculationError {
    match current {
        None => next,
        Some(CalculationError::MissingInput { .. })
            if !matches!(next, CalculationError::MissingInput { .. }) =>
        {
            next
        }
        Some(current) => current,
    }
}
