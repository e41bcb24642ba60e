use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Broker connection settings.
///
/// Credentials are optional and come from the configuration file, never from
/// the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic all outbound telemetry is published to.
    pub topic: String,
    /// Subscribe to the publish topic after connecting.
    pub subscribe: bool,
    pub keep_alive_secs: u64,
    /// Bound on a single connect attempt.
    pub connect_timeout_secs: u64,
    /// Fixed delay between connect attempts. Deliberately non-exponential.
    pub reconnect_delay_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "cellmon".to_string(),
            username: None,
            password: None,
            topic: "cellmon/battery".to_string(),
            subscribe: false,
            keep_alive_secs: 5,
            connect_timeout_secs: 10,
            reconnect_delay_secs: 2,
        }
    }
}

impl MqttConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
