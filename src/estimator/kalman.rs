//! Scalar Kalman filter for the average-current channel.
//!
//! The fuel gauge's average-current reading is noisy enough to make the raw
//! runtime estimate jump around. A one-dimensional Kalman filter with no
//! control input smooths it: the filter keeps a running estimate `x` and its
//! error covariance `p`, and every update blends the new measurement in with
//! gain `k = p / (p + r)`.
//!
//! One filter instance serves exactly one physical channel. Mixing channels
//! through a shared instance contaminates the estimate, so the pipeline owns
//! its filter directly and tests construct their own.

use serde::{Deserialize, Serialize};

/// Filter tuning. The defaults are the experimentally chosen values for the
/// battery current channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Process noise `q`: how much the true value is assumed to drift
    /// between samples.
    pub process_noise: f64,
    /// Measurement noise `r`: how much a single reading is distrusted.
    pub measurement_noise: f64,
    /// Initial estimate `x`.
    pub initial_estimate: f64,
    /// Initial error covariance `p`.
    pub initial_covariance: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 10.0,
            initial_estimate: 0.0,
            initial_covariance: 1.0,
        }
    }
}

/// Recursive single-channel estimator. Mutated in place on every update and
/// never reset during normal operation.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    q: f64,
    r: f64,
    x: f64,
    p: f64,
    k: f64,
}

impl KalmanFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            q: config.process_noise,
            r: config.measurement_noise,
            x: config.initial_estimate,
            p: config.initial_covariance,
            k: 0.0,
        }
    }

    /// Feeds one measurement through the predict/update step and returns the
    /// new estimate.
    ///
    /// Invariants: `p` stays non-negative, `k` stays in `[0, 1]`, and the
    /// estimate only ever moves toward the measurement, never past it.
    pub fn update(&mut self, measurement: f64) -> f64 {
        // predict
        self.p += self.q;

        // update
        self.k = self.p / (self.p + self.r);
        self.x += self.k * (measurement - self.x);
        self.p = (1.0 - self.k) * self.p;

        self.x
    }

    pub fn estimate(&self) -> f64 {
        self.x
    }

    pub fn covariance(&self) -> f64 {
        self.p
    }

    pub fn gain(&self) -> f64 {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning_matches_documented_values() {
        let config = FilterConfig::default();
        assert_eq!(config.process_noise, 0.01);
        assert_eq!(config.measurement_noise, 10.0);
        assert_eq!(config.initial_estimate, 0.0);
        assert_eq!(config.initial_covariance, 1.0);
    }

    #[test]
    fn converges_toward_constant_measurement() {
        let mut filter = KalmanFilter::new(FilterConfig::default());
        let mut out = 0.0;
        for _ in 0..500 {
            out = filter.update(-120_000.0);
        }
        assert!((out - -120_000.0).abs() < 1_000.0, "estimate was {out}");
    }

    #[test]
    fn update_stays_between_prior_and_measurement() {
        let mut filter = KalmanFilter::new(FilterConfig::default());
        for measurement in [-100.0, 250.0, 250.0, -400.0, 0.0] {
            let prior = filter.estimate();
            let out = filter.update(measurement);
            let (lo, hi) = if prior <= measurement {
                (prior, measurement)
            } else {
                (measurement, prior)
            };
            assert!(out >= lo && out <= hi, "{out} escaped [{lo}, {hi}]");
        }
    }

    #[test]
    fn gain_and_covariance_stay_bounded() {
        let mut filter = KalmanFilter::new(FilterConfig::default());
        for i in 0..100 {
            filter.update((i as f64) * 17.0 - 300.0);
            assert!(filter.covariance() >= 0.0);
            assert!((0.0..=1.0).contains(&filter.gain()));
        }
    }

    #[test]
    fn heavy_smoothing_reacts_slowly() {
        // with r >> q a single outlier barely moves the estimate
        let mut filter = KalmanFilter::new(FilterConfig::default());
        for _ in 0..200 {
            filter.update(-100.0);
        }
        let settled = filter.estimate();
        let after_spike = filter.update(10_000.0);
        assert!((after_spike - settled).abs() < 0.2 * (10_000.0 - settled).abs());
    }
}
