//! Application configuration.
//!
//! Everything tunable comes from one TOML file: broker address and topic,
//! run mode, publish interval, filter tuning and the runtime cutoffs. Every
//! section has working defaults, so a missing file or a partial file is
//! fine. Credentials live here too; nothing is baked into the binary.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::estimator::{FilterConfig, RuntimeConfig};
use crate::mqtt::MqttConfig;
use crate::pipeline::PipelineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How the process is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Request-driven pipeline behind the HTTP shim.
    #[default]
    Serve,
    /// Timer-driven generator publishing the simulation schema.
    Simulate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub http: HttpConfig,
    pub broker: MqttConfig,
    pub pipeline: PipelineConfig,
    pub filter: FilterConfig,
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Loads from `path`, or from the platform config directory when no path
    /// is given. A missing file is not an error: defaults apply.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(default_path);
        if !path.exists() {
            info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cellmon")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_parses() {
        let config: Config = toml::from_str(
            r#"
            mode = "simulate"

            [http]
            bind_addr = "127.0.0.1:9000"

            [broker]
            host = "broker.local"
            port = 1884
            client_id = "bench-rig"
            topic = "lab/battery"
            subscribe = true
            reconnect_delay_secs = 5

            [pipeline]
            publish_interval_secs = 1
            timer_source = true

            [filter]
            process_noise = 0.02
            measurement_noise = 8.0

            [runtime]
            min_current_a = 0.002
            long_runtime_hours = 500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Simulate);
        assert_eq!(config.http.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.port, 1884);
        assert!(config.broker.subscribe);
        assert_eq!(config.broker.reconnect_delay_secs, 5);
        assert_eq!(config.pipeline.publish_interval_secs, 1);
        assert!(config.pipeline.timer_source);
        assert_eq!(config.filter.process_noise, 0.02);
        assert_eq!(config.filter.measurement_noise, 8.0);
        // untouched fields keep their defaults
        assert_eq!(config.filter.initial_covariance, 1.0);
        assert_eq!(config.runtime.min_current_a, 0.002);
        assert_eq!(config.runtime.long_runtime_hours, 500.0);
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mode, Mode::Serve);
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.reconnect_delay_secs, 2);
        assert_eq!(config.pipeline.publish_interval_secs, 5);
        assert!(!config.pipeline.timer_source);
        assert_eq!(config.runtime.long_runtime_hours, 999.9);
    }

    #[test]
    fn partial_section_keeps_sibling_defaults() {
        let config: Config = toml::from_str(
            r#"
            [broker]
            host = "10.0.0.5"
            "#,
        )
        .unwrap();
        assert_eq!(config.broker.host, "10.0.0.5");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.topic, "cellmon/battery");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(toml::from_str::<Config>("mode = \"replay\"").is_err());
    }
}
