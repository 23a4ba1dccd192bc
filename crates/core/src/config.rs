//! ABC classification policy.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

/// Two-threshold ABC policy, in cumulative value percent.
///
/// Invariant: `0 < class_a_threshold < class_b_threshold < 100`. The struct is
/// plain data because it usually comes from a configuration store; call
/// [`AbcConfiguration::validate`] before trusting it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcConfiguration {
    pub class_a_threshold: f64,
    pub class_b_threshold: f64,
}

impl AbcConfiguration {
    pub const DEFAULT_CLASS_A: f64 = 80.0;
    pub const DEFAULT_CLASS_B: f64 = 95.0;

    /// Build and validate in one step.
    pub fn new(class_a_threshold: f64, class_b_threshold: f64) -> AnalyticsResult<Self> {
        let config = Self {
            class_a_threshold,
            class_b_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        let (a, b) = (self.class_a_threshold, self.class_b_threshold);
        if !(a.is_finite() && b.is_finite()) {
            return Err(AnalyticsError::configuration(
                "ABC thresholds must be finite numbers",
            ));
        }
        if !(0.0 < a && a < b && b < 100.0) {
            return Err(AnalyticsError::configuration(format!(
                "ABC thresholds must satisfy 0 < A < B < 100 (got A={a}, B={b})"
            )));
        }
        Ok(())
    }
}

impl Default for AbcConfiguration {
    fn default() -> Self {
        Self {
            class_a_threshold: Self::DEFAULT_CLASS_A,
            class_b_threshold: Self::DEFAULT_CLASS_B,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_80_95_and_valid() {
        let c = AbcConfiguration::default();
        assert_eq!(c.class_a_threshold, 80.0);
        assert_eq!(c.class_b_threshold, 95.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_order_or_out_of_range_thresholds() {
        for (a, b) in [(95.0, 80.0), (80.0, 80.0), (0.0, 50.0), (50.0, 100.0), (f64::NAN, 90.0)] {
            let err = AbcConfiguration::new(a, b).unwrap_err();
            assert!(matches!(err, AnalyticsError::Configuration(_)), "A={a} B={b}");
        }
    }
}
