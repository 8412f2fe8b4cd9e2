use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{CalculationError, MetricError};
use crate::metrics::{Collectable, Metric};
use crate::pool::Pool;
use crate::statistics::MetricName;

/// A value some other task will produce. Resolves once the producer publishes,
/// or fails if the producer goes away without publishing.
pub struct PendingInput<T> {
    receiver: watch::Receiver<Option<Arc<T>>>,
    input: &'static str,
}

impl<T> Clone for PendingInput<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            input: self.input,
        }
    }
}

/// Producer side of a [`PendingInput`].
pub struct InputPublisher<T> {
    sender: watch::Sender<Option<Arc<T>>>,
}

impl<T> InputPublisher<T> {
    /// Publish the value to every waiting and future reader.
    pub fn publish(self, value: Arc<T>) {
        let _previous = self.sender.send_replace(Some(value));
    }
}

impl<T> PendingInput<T> {
    /// An unpublished slot named `input` in errors.
    #[must_use]
    pub fn channel(input: &'static str) -> (InputPublisher<T>, Self) {
        let (sender, receiver) = watch::channel(None);
        (InputPublisher { sender }, Self { receiver, input })
    }

    /// A slot that already holds its value.
    #[must_use]
    pub fn ready(input: &'static str, value: Arc<T>) -> Self {
        let (_sender, receiver) = watch::channel(Some(value));
        Self { receiver, input }
    }

    /// Wait for the value on behalf of `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::MissingInput`] if the producer was dropped
    /// without publishing.
    pub async fn resolve(mut self, metric: MetricName) -> Result<Arc<T>, CalculationError> {
        let missing = CalculationError::MissingInput {
            metric,
            input: self.input,
        };
        let value = self.receiver.wait_for(Option::is_some).await;
        match value {
            Ok(guard) => guard.as_ref().map(Arc::clone).ok_or(missing),
            Err(_closed) => Err(missing),
        }
    }
}

fn failed(metric: MetricName, source: MetricError) -> CalculationError {
    CalculationError::TaskFailed {
        metric,
        source: Box::new(source),
    }
}

/// Computes one plain metric once its pool arrives.
pub struct MetricTask<S> {
    metric: Arc<dyn Metric<S>>,
    pool: PendingInput<Pool>,
}

impl<S> MetricTask<S> {
    #[must_use]
    pub fn new(metric: Arc<dyn Metric<S>>, pool: PendingInput<Pool>) -> Self {
        Self { metric, pool }
    }

    /// # Errors
    ///
    /// Returns an error naming the metric when the pool never arrives or the
    /// metric fails.
    pub async fn run(self) -> Result<S, CalculationError> {
        let name = self.metric.name();
        let pool = self.pool.resolve(name).await?;
        tracing::debug!("Computing {} over {} pairs", name, pool.len());
        self.metric.apply(&pool).map_err(|err| failed(name, err))
    }
}

/// Computes the intermediate statistic of a collectable group and publishes it
/// to the group's aggregation tasks.
pub struct IntermediateTask<I, S> {
    metric: Arc<dyn Collectable<I, S>>,
    pool: PendingInput<Pool>,
    publisher: InputPublisher<I>,
}

impl<I, S> IntermediateTask<I, S> {
    #[must_use]
    pub fn new(
        metric: Arc<dyn Collectable<I, S>>,
        pool: PendingInput<Pool>,
        publisher: InputPublisher<I>,
    ) -> Self {
        Self {
            metric,
            pool,
            publisher,
        }
    }

    /// # Errors
    ///
    /// Returns an error naming the metric that computed the intermediate. The
    /// publisher is dropped unpublished, so dependents fail with a missing input.
    pub async fn run(self) -> Result<(), CalculationError> {
        let name = self.metric.name();
        let pool = self.pool.resolve(name).await?;
        tracing::debug!(
            "Computing intermediate {} via {}",
            self.metric.collection_of(),
            name
        );
        let intermediate = self
            .metric
            .intermediate_statistic(&pool)
            .map_err(|err| failed(name, err))?;
        self.publisher.publish(Arc::new(intermediate));
        Ok(())
    }
}

/// Aggregates a shared intermediate into one collectable metric's statistic.
pub struct CollectableTask<I, S> {
    metric: Arc<dyn Collectable<I, S>>,
    intermediate: PendingInput<I>,
    pool: PendingInput<Pool>,
}

impl<I, S> CollectableTask<I, S> {
    #[must_use]
    pub fn new(
        metric: Arc<dyn Collectable<I, S>>,
        intermediate: PendingInput<I>,
        pool: PendingInput<Pool>,
    ) -> Self {
        Self {
            metric,
            intermediate,
            pool,
        }
    }

    /// # Errors
    ///
    /// Returns an error naming the metric when its inputs never arrive or
    /// aggregation fails.
    pub async fn run(self) -> Result<S, CalculationError> {
        let name = self.metric.name();
        let intermediate = self.intermediate.resolve(name).await?;
        let pool = self.pool.resolve(name).await?;
        self.metric
            .aggregate(&intermediate, &pool)
            .map_err(|err| failed(name, err))
    }
}
