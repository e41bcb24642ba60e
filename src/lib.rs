//! Battery telemetry estimation and resilient-delivery pipeline.
//!
//! Raw battery samples (level, charge counter, currents) come in either
//! through the HTTP shim or from the synthetic source, get their average
//! current denoised by a scalar Kalman filter, are turned into a remaining
//! runtime estimate, and leave as a fixed-schema JSON message over an MQTT
//! session that survives broker outages by retrying on a fixed delay.

pub mod config;
pub mod estimator;
pub mod http;
pub mod mqtt;
pub mod pipeline;
pub mod sim;
pub mod telemetry;
