use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::statistics::{ComponentName, MetricName};

/// Identifies the samples of one statistic component across accepted blobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SampleKey {
    pub(crate) metric: MetricName,
    pub(crate) component: ComponentName,
    pub(crate) qualifier: Option<String>,
}

impl SampleKey {
    pub(crate) const fn new(metric: MetricName, component: ComponentName) -> Self {
        Self {
            metric,
            component,
            qualifier: None,
        }
    }

    pub(crate) fn qualified(
        metric: MetricName,
        component: ComponentName,
        qualifier: Option<&str>,
    ) -> Self {
        Self {
            metric,
            component,
            qualifier: qualifier.map(str::to_owned),
        }
    }

    /// Qualifier as it appears in error messages.
    pub(crate) fn describe_qualifier(&self) -> String {
        self.qualifier
            .as_deref()
            .map(|q| format!(" ({q})"))
            .unwrap_or_default()
    }
}

type Samples<T> = Arc<Mutex<Vec<T>>>;

/// Growable sample vectors, one per key. Appends for different keys never
/// contend: the map shard is released before the vector is locked.
pub(crate) struct SampleStore<T> {
    samples: DashMap<SampleKey, Samples<T>>,
}

impl<T> Default for SampleStore<T> {
    fn default() -> Self {
        Self {
            samples: DashMap::new(),
        }
    }
}

impl<T: Clone> SampleStore<T> {
    fn slot(&self, key: &SampleKey) -> Samples<T> {
        if let Some(existing) = self.samples.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.samples.entry(key.clone()).or_default().value())
    }

    pub(crate) fn append(&self, key: &SampleKey, value: T) {
        self.slot(key).lock().push(value);
    }

    pub(crate) fn samples(&self, key: &SampleKey) -> Option<Vec<T>> {
        let slot = self.samples.get(key).map(|entry| Arc::clone(entry.value()))?;
        let samples = slot.lock().clone();
        Some(samples)
    }
}

/// One sample vector per row of a diagram component. Rows are created on
/// first sight under the write lock; appends only need the read lock.
#[derive(Default)]
struct Rows {
    rows: RwLock<Vec<Mutex<Vec<f64>>>>,
}

impl Rows {
    fn append(&self, values: &[f64]) {
        {
            let rows = self.rows.read();
            if rows.len() >= values.len() {
                for (row, value) in rows.iter().zip(values) {
                    row.lock().push(*value);
                }
                return;
            }
        }
        let mut rows = self.rows.write();
        while rows.len() < values.len() {
            rows.push(Mutex::new(Vec::new()));
        }
        for (row, value) in rows.iter().zip(values) {
            row.lock().push(*value);
        }
    }

    fn snapshot(&self) -> Vec<Vec<f64>> {
        self.rows.read().iter().map(|row| row.lock().clone()).collect()
    }
}

/// Diagram samples, one set of rows per component.
#[derive(Default)]
pub(crate) struct RowStore {
    components: DashMap<SampleKey, Arc<Rows>>,
}

impl RowStore {
    pub(crate) fn append(&self, key: &SampleKey, values: &[f64]) {
        let rows = Arc::clone(self.components.entry(key.clone()).or_default().value());
        rows.append(values);
    }

    pub(crate) fn rows(&self, key: &SampleKey) -> Option<Vec<Vec<f64>>> {
        let rows = self
            .components
            .get(key)
            .map(|entry| Arc::clone(entry.value()))?;
        Some(rows.snapshot())
    }
}

type InstantSamples = Arc<DashMap<DateTime<Utc>, Samples<TimeDelta>>>;

/// Duration diagram samples, grouped by instant within each metric.
#[derive(Default)]
pub(crate) struct InstantStore {
    metrics: DashMap<MetricName, InstantSamples>,
}

impl InstantStore {
    pub(crate) fn append(&self, metric: MetricName, instant: DateTime<Utc>, duration: TimeDelta) {
        let instants = Arc::clone(self.metrics.entry(metric).or_default().value());
        let samples = Arc::clone(instants.entry(instant).or_default().value());
        samples.lock().push(duration);
    }

    /// Samples per instant, in time order.
    pub(crate) fn instants(&self, metric: MetricName) -> BTreeMap<DateTime<Utc>, Vec<TimeDelta>> {
        let Some(instants) = self
            .metrics
            .get(&metric)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return BTreeMap::new();
        };
        instants
            .iter()
            .map(|entry| (*entry.key(), entry.value().lock().clone()))
            .collect()
    }
}
