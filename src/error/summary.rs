use thiserror::Error;

use crate::statistics::{ComponentName, MetricName};

#[derive(Debug, Clone, Error)]
pub enum SummaryError {
    #[error("No further statistics can be added: the calculator has been closed.")]
    Closed,
    #[error("No samples were accumulated for {metric} component {component}{qualifier}.")]
    MissingSamples {
        metric: MetricName,
        component: ComponentName,
        qualifier: String,
    },
    #[error("Statistic {metric} repeats component {component}{qualifier}; shapes are inconsistent.")]
    DuplicateComponent {
        metric: MetricName,
        component: ComponentName,
        qualifier: String,
    },
    #[error("Summary statistic could not be calculated: {message}")]
    Calculation { message: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
