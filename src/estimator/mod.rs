//! Estimation stage: current denoising and remaining-runtime derivation.

pub mod kalman;
pub mod runtime;

pub use kalman::{FilterConfig, KalmanFilter};
pub use runtime::{RuntimeConfig, RuntimeEstimator};
