//! Encoding and decoding of telemetry payloads.
//!
//! Decoding takes the raw named parameters of an inbound update request and
//! turns them into a [`Sample`]. It never fails: a missing or unparseable
//! field is substituted with zero, but the substitution is kept visible as
//! [`FieldValue::Defaulted`] so callers can log what was dropped instead of
//! silently swallowing it.

use std::collections::HashMap;

use super::{Sample, TelemetryMessage};

pub const PARAM_BATTERY_LEVEL: &str = "battery_level";
pub const PARAM_CHARGE_COUNTER: &str = "charge_counter";
pub const PARAM_CURRENT_AVG: &str = "current_avg";
pub const PARAM_CURRENT_NOW: &str = "current_now";

/// Result of decoding a single inbound field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// The parameter was present and parsed as a number.
    Parsed(f64),
    /// The parameter was missing or malformed; zero is used in its place.
    Defaulted,
}

impl FieldValue {
    pub fn value(self) -> f64 {
        match self {
            FieldValue::Parsed(v) => v,
            FieldValue::Defaulted => 0.0,
        }
    }

    pub fn is_defaulted(self) -> bool {
        matches!(self, FieldValue::Defaulted)
    }
}

/// A decoded sample that remembers which fields were defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSample {
    pub battery_level: FieldValue,
    pub charge_counter: FieldValue,
    pub current_avg: FieldValue,
    pub current_now: FieldValue,
}

impl DecodedSample {
    pub fn sample(&self) -> Sample {
        Sample {
            battery_level: self.battery_level.value(),
            charge_counter: self.charge_counter.value(),
            current_avg: self.current_avg.value(),
            current_now: self.current_now.value(),
        }
    }

    /// Names of the fields that fell back to zero.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.battery_level.is_defaulted() {
            names.push(PARAM_BATTERY_LEVEL);
        }
        if self.charge_counter.is_defaulted() {
            names.push(PARAM_CHARGE_COUNTER);
        }
        if self.current_avg.is_defaulted() {
            names.push(PARAM_CURRENT_AVG);
        }
        if self.current_now.is_defaulted() {
            names.push(PARAM_CURRENT_NOW);
        }
        names
    }
}

/// Decodes the four named parameters of an update request. Total: malformed
/// input can only produce defaulted fields, never an error.
pub fn decode(params: &HashMap<String, String>) -> DecodedSample {
    DecodedSample {
        battery_level: field(params, PARAM_BATTERY_LEVEL),
        charge_counter: field(params, PARAM_CHARGE_COUNTER),
        current_avg: field(params, PARAM_CURRENT_AVG),
        current_now: field(params, PARAM_CURRENT_NOW),
    }
}

fn field(params: &HashMap<String, String>, name: &str) -> FieldValue {
    params
        .get(name)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .map(FieldValue::Parsed)
        .unwrap_or(FieldValue::Defaulted)
}

/// Builds the outbound message from a sample and the estimation results.
pub fn encode(sample: &Sample, filtered_current: f64, runtime_hours: f64) -> TelemetryMessage {
    TelemetryMessage {
        battery_level: sample.battery_level,
        charge_counter: sample.charge_counter,
        current_avg: sample.current_avg,
        current_now: sample.current_now,
        current_avg_filtered: filtered_current,
        runtime_hours,
    }
}
