//! Analytics error model.

use thiserror::Error;

/// Result type used across the analytics engine.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Engine-level error.
///
/// Every failure is deterministic: the same batch and configuration always
/// produce the same error, so nothing here is worth retrying.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Configuration values violate their invariants (e.g. ABC thresholds out of order).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The batch is too small for the requested analysis.
    #[error("insufficient data for {analysis}: need at least {required} record(s), got {actual}")]
    InsufficientData {
        analysis: &'static str,
        required: usize,
        actual: usize,
    },

    /// A call parameter is out of range (e.g. `k` or anomaly sensitivity).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalyticsError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn insufficient_data(analysis: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            analysis,
            required,
            actual,
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Whether the caller can keep going by disabling the affected analysis.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_insufficient_data_is_recoverable() {
        assert!(AnalyticsError::insufficient_data("clustering", 3, 1).is_recoverable());
        assert!(!AnalyticsError::configuration("bad thresholds").is_recoverable());
        assert!(!AnalyticsError::invalid_parameter("k").is_recoverable());
    }

    #[test]
    fn insufficient_data_message_names_the_analysis() {
        let err = AnalyticsError::insufficient_data("anomaly detection", 3, 2);
        assert_eq!(
            err.to_string(),
            "insufficient data for anomaly detection: need at least 3 record(s), got 2"
        );
    }
}
