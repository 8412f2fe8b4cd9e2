use super::{ConfigError, MetricError, SummaryError};

impl From<&'static str> for MetricError {
    fn from(message: &'static str) -> Self {
        MetricError::TestExpectation { message }
    }
}

impl From<String> for MetricError {
    fn from(value: String) -> Self {
        MetricError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for SummaryError {
    fn from(message: &'static str) -> Self {
        SummaryError::TestExpectation { message }
    }
}

impl From<String> for SummaryError {
    fn from(value: String) -> Self {
        SummaryError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ConfigError {
    fn from(message: &'static str) -> Self {
        ConfigError::TestExpectation { message }
    }
}

impl From<String> for ConfigError {
    fn from(value: String) -> Self {
        ConfigError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
