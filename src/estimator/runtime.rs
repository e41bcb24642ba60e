//! Remaining-runtime estimation from charge counter and filtered current.

use serde::{Deserialize, Serialize};

/// Bounds for the runtime calculation.
///
/// Both values guard the division against a near-zero denominator. They are
/// deliberate, tunable cutoffs rather than physical constants, which is why
/// they live in configuration instead of being baked in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Discharge currents below this magnitude (in A) are treated as "not
    /// really discharging".
    pub min_current_a: f64,
    /// Sentinel reported when the discharge current is below the cutoff.
    pub long_runtime_hours: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            min_current_a: 0.001,
            long_runtime_hours: 999.9,
        }
    }
}

/// Pure mapping from (charge counter, filtered current) to hours remaining.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeEstimator {
    config: RuntimeConfig,
}

impl RuntimeEstimator {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Estimates remaining runtime in hours.
    ///
    /// Total over all inputs: charging or empty yields `0.0`, a discharge
    /// current below the configured cutoff yields the long-runtime sentinel,
    /// everything else is plain `charge / current`.
    pub fn estimate(&self, charge_counter_uah: f64, filtered_current_ua: f64) -> f64 {
        if filtered_current_ua >= 0.0 || charge_counter_uah <= 0.0 {
            return 0.0;
        }

        // µAh -> Ah, µA -> A with the discharge sign dropped
        let charge_ah = charge_counter_uah / 1_000_000.0;
        let current_a = -filtered_current_ua / 1_000_000.0;

        if current_a < self.config.min_current_a {
            return self.config.long_runtime_hours;
        }

        charge_ah / current_a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> RuntimeEstimator {
        RuntimeEstimator::new(RuntimeConfig::default())
    }

    #[test]
    fn empty_battery_yields_zero() {
        assert_eq!(estimator().estimate(0.0, -100_000.0), 0.0);
        assert_eq!(estimator().estimate(-5.0, -100_000.0), 0.0);
    }

    #[test]
    fn charging_yields_zero() {
        assert_eq!(estimator().estimate(100.0, 50.0), 0.0);
        assert_eq!(estimator().estimate(100.0, 0.0), 0.0);
    }

    #[test]
    fn half_amp_hour_at_hundred_milliamps_is_five_hours() {
        assert_eq!(estimator().estimate(500_000.0, -100_000.0), 5.0);
    }

    #[test]
    fn tiny_discharge_current_hits_sentinel() {
        assert_eq!(estimator().estimate(100.0, -0.5), 999.9);
    }

    #[test]
    fn sentinel_and_cutoff_are_overridable() {
        let estimator = RuntimeEstimator::new(RuntimeConfig {
            min_current_a: 0.5,
            long_runtime_hours: 48.0,
        });
        // 0.1 A is below the raised cutoff
        assert_eq!(estimator.estimate(500_000.0, -100_000.0), 48.0);
    }
}
