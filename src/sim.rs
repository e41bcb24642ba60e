//! Synthetic telemetry for running the pipeline without a device.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::mqtt::{PublishSession, Transport};
use crate::telemetry::Sample;

/// Randomized but plausible battery samples for the timer-driven flow.
pub struct SyntheticSource {
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_sample(&mut self) -> Sample {
        // a discharging battery: negative average current, the instantaneous
        // reading jittering around it
        let current_avg = self.rng.gen_range(-500_000.0..-10_000.0);
        Sample {
            battery_level: self.rng.gen_range(0.0..100.0),
            charge_counter: self.rng.gen_range(100_000.0..4_000_000.0),
            current_avg,
            current_now: current_avg + self.rng.gen_range(-20_000.0..20_000.0),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulation wire schema: integer millivolts and percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimPayload {
    pub battery_voltage_mv: u32,
    pub battery_percentage: u8,
}

impl SimPayload {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            battery_voltage_mv: rng.gen_range(3000..=4200),
            battery_percentage: rng.gen_range(0..=100),
        }
    }
}

/// Timer-driven simulation loop.
///
/// Publishes a random reading on a fixed interval with the retained flag set,
/// so late subscribers immediately see the last value, and services the
/// session in between. Runs until the process is terminated.
pub async fn run_simulation<T: Transport>(mut session: PublishSession<T>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "simulation mode");
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        session.ensure_connected().await;

        let payload = SimPayload::random(&mut rng);
        match serde_json::to_string(&payload) {
            Ok(body) => match session.publish(&body, true).await {
                Ok(()) => info!(%body, "simulated reading published"),
                Err(err) => warn!("publish failed: {err}"),
            },
            Err(err) => error!("failed to serialize reading: {err}"),
        }

        session.maintain().await;
    }
}
