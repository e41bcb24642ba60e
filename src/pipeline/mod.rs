//! Pipeline orchestration.
//!
//! One control loop drives everything: inbound triggers from the HTTP shim,
//! the optional timer-driven synthetic source, and the session maintenance
//! that keeps the broker connection alive. Filter state and connection state
//! are owned by the orchestrator and touched only from this loop, so no
//! locking is involved; a second channel would get its own filter instance.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::estimator::{KalmanFilter, RuntimeEstimator};
use crate::mqtt::{PublishSession, Transport};
use crate::sim::SyntheticSource;
use crate::telemetry::{codec, Sample};

/// Raw named parameters of one inbound update request.
pub type TriggerParams = HashMap<String, String>;

/// How often the session is serviced when no telemetry is flowing.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(1);

/// Session diagnostics are logged every this many cycles.
const DIAG_EVERY_CYCLES: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Interval of the timer-driven flow.
    pub publish_interval_secs: u64,
    /// Enables the timer-driven flow alongside inbound triggers.
    pub timer_source: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            publish_interval_secs: 5,
            timer_source: false,
        }
    }
}

impl PipelineConfig {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs)
    }
}

/// Wires sample intake, estimation and delivery into one loop.
pub struct Orchestrator<T> {
    filter: KalmanFilter,
    runtime: RuntimeEstimator,
    session: PublishSession<T>,
    source: SyntheticSource,
    settings: PipelineConfig,
    triggers: mpsc::Receiver<TriggerParams>,
    cycles: u64,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(
        session: PublishSession<T>,
        filter: KalmanFilter,
        runtime: RuntimeEstimator,
        source: SyntheticSource,
        settings: PipelineConfig,
        triggers: mpsc::Receiver<TriggerParams>,
    ) -> Self {
        Self {
            filter,
            runtime,
            session,
            source,
            settings,
            triggers,
            cycles: 0,
        }
    }

    pub fn session(&self) -> &PublishSession<T> {
        &self.session
    }

    /// Runs until every trigger sender is gone.
    ///
    /// Each cycle handles at most one event and always ends with
    /// `PublishSession::maintain`, so keep-alive and disconnect detection
    /// happen regardless of which flow fired.
    pub async fn run(&mut self) {
        info!(
            timer_source = self.settings.timer_source,
            interval_secs = self.settings.publish_interval_secs,
            "pipeline started"
        );
        let mut publish_tick = tokio::time::interval(self.settings.publish_interval());
        let mut maintenance_tick = tokio::time::interval(MAINTENANCE_INTERVAL);

        loop {
            tokio::select! {
                trigger = self.triggers.recv() => match trigger {
                    Some(params) => self.handle_trigger(params).await,
                    None => break,
                },
                _ = publish_tick.tick(), if self.settings.timer_source => {
                    let sample = self.source.next_sample();
                    self.process(sample).await;
                }
                _ = maintenance_tick.tick() => {}
            }

            self.session.maintain().await;
            self.cycles += 1;
            if self.cycles % DIAG_EVERY_CYCLES == 0 {
                let stats = self.session.stats();
                debug!(
                    state = ?self.session.state(),
                    sent = stats.messages_sent,
                    received = stats.messages_received,
                    connect_failures = stats.connect_failures,
                    "session diagnostics"
                );
            }
        }
        info!("pipeline stopped");
    }

    async fn handle_trigger(&mut self, params: TriggerParams) {
        let decoded = codec::decode(&params);
        let defaulted = decoded.defaulted_fields();
        if !defaulted.is_empty() {
            debug!(fields = ?defaulted, "inbound parameters defaulted to zero");
        }
        self.process(decoded.sample()).await;
    }

    /// One estimation-and-publish pass over a sample.
    ///
    /// Publishing re-drives the connection first, so a broker outage stalls
    /// this flow (and only this flow) until the retry loop wins. The publish
    /// result itself is only logged; the triggering caller was answered long
    /// before this runs.
    pub async fn process(&mut self, sample: Sample) {
        let filtered = self.filter.update(sample.current_avg);
        let hours = self.runtime.estimate(sample.charge_counter, filtered);
        let payload = codec::encode(&sample, filtered, hours).render();

        self.session.ensure_connected().await;
        match self.session.publish(&payload, false).await {
            Ok(()) => info!(%payload, "telemetry published"),
            Err(err) => warn!("publish failed: {err}"),
        }
    }
}
