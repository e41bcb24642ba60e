//! Battery telemetry data model.
//!
//! A [`Sample`] is one raw reading as reported by the fuel gauge: battery
//! level in percent, remaining-capacity charge counter in µAh and the two
//! current channels in µA (negative current means discharge). Samples are
//! plain values and never mutated after construction.
//!
//! A [`TelemetryMessage`] is the outbound record after the estimation stage
//! ran: the four raw fields plus the filtered average current and the derived
//! runtime estimate. Field order and the two-decimal rendering are part of
//! the wire contract, see [`codec`].

pub mod codec;

/// One raw battery reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Battery level in percent.
    pub battery_level: f64,
    /// Remaining capacity in µAh, signed.
    pub charge_counter: f64,
    /// Average current in µA, negative while discharging.
    pub current_avg: f64,
    /// Instantaneous current in µA.
    pub current_now: f64,
}

/// Outbound telemetry record with the estimation results attached.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryMessage {
    pub battery_level: f64,
    pub charge_counter: f64,
    pub current_avg: f64,
    pub current_now: f64,
    pub current_avg_filtered: f64,
    pub runtime_hours: f64,
}

impl TelemetryMessage {
    /// Renders the fixed six-field JSON payload.
    ///
    /// Field order is stable and every value carries exactly two decimal
    /// digits, so downstream consumers can rely on a byte-stable layout for
    /// identical inputs.
    pub fn render(&self) -> String {
        format!(
            "{{\"battery_level\": {:.2},\"charge_counter\": {:.2},\"current_avg\": {:.2},\"current_now\": {:.2},\"current_avg_filtered\": {:.2},\"runtime_hours\": {:.2}}}",
            self.battery_level,
            self.charge_counter,
            self.current_avg,
            self.current_now,
            self.current_avg_filtered,
            self.runtime_hours,
        )
    }
}
