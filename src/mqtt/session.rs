//! Publish session state machine.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::MqttConfig;
use super::transport::{SessionError, Transport, TransportEvent};

/// Connection lifecycle of one broker session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Running counters for diagnostics. Mirrors what the session has actually
/// done, not what the broker thinks.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub messages_sent: usize,
    pub messages_received: usize,
    pub connect_failures: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
}

impl SessionStats {
    fn touch(&mut self) {
        self.last_activity = Some(chrono::Local::now());
    }
}

/// Fixed-delay retry, driven by the scheduler rather than embedded sleeps in
/// control flow, so paused-clock tests can step through elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Owns the broker connection lifecycle for one topic.
///
/// The session never retries a publish on its own and never treats a broker
/// failure as fatal: a lost connection drops the state back to
/// `Disconnected` and the next `ensure_connected` drives the retry loop.
pub struct PublishSession<T> {
    transport: T,
    config: MqttConfig,
    state: ConnectionState,
    retry: RetryPolicy,
    stats: SessionStats,
}

impl<T: Transport> PublishSession<T> {
    pub fn new(transport: T, config: MqttConfig) -> Self {
        let retry = RetryPolicy::new(config.reconnect_delay());
        Self {
            transport,
            config,
            state: ConnectionState::Disconnected,
            retry,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One connect attempt. On failure the session stays `Disconnected` and
    /// the fixed retry delay has already elapsed when this returns.
    pub async fn connect(&mut self) -> bool {
        self.state = ConnectionState::Connecting;
        match self.transport.connect().await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.stats.touch();
                info!(
                    host = %self.config.host,
                    port = self.config.port,
                    "connected to broker"
                );
                if self.config.subscribe {
                    match self.transport.subscribe(&self.config.topic).await {
                        Ok(()) => debug!(topic = %self.config.topic, "subscribed"),
                        Err(err) => warn!("subscribe failed: {err}"),
                    }
                }
                true
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                self.stats.connect_failures += 1;
                warn!(
                    "broker connect failed: {err}; retrying in {:?}",
                    self.retry.delay()
                );
                self.retry.wait().await;
                false
            }
        }
    }

    /// Retries `connect` until the session is `Connected`. Each attempt is
    /// bounded by the transport's connect timeout; the loop itself is not.
    pub async fn ensure_connected(&mut self) {
        while self.state != ConnectionState::Connected {
            self.connect().await;
        }
    }

    /// Publishes one payload. Valid only while `Connected`; the caller drives
    /// `ensure_connected` on the next cycle instead of this retrying.
    pub async fn publish(&mut self, payload: &str, retain: bool) -> Result<(), SessionError> {
        if self.state != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }
        self.transport
            .publish(&self.config.topic, payload.as_bytes(), retain)
            .await?;
        self.stats.messages_sent += 1;
        self.stats.touch();
        Ok(())
    }

    /// Services the connection once per cycle: keep-alive, inbound traffic,
    /// and detection of broker-initiated disconnects.
    pub async fn maintain(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }
        match self.transport.poll().await {
            Ok(TransportEvent::Inbound { topic, payload }) => {
                self.stats.messages_received += 1;
                self.stats.touch();
                debug!(
                    topic = %topic,
                    bytes = payload.len(),
                    "inbound message"
                );
            }
            Ok(TransportEvent::Idle) => {}
            Err(err) => {
                warn!("connection lost: {err}");
                self.state = ConnectionState::Disconnected;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockTransport;
    use super::*;

    fn config() -> MqttConfig {
        MqttConfig {
            reconnect_delay_secs: 2,
            ..MqttConfig::default()
        }
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let session = PublishSession::new(MockTransport::new(), config());
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn publish_while_disconnected_is_rejected() {
        let mut session = PublishSession::new(MockTransport::new(), config());
        let err = session.publish("{}", false).await.unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
        assert!(session.transport().published.is_empty());
    }

    #[tokio::test]
    async fn connect_subscribes_when_configured() {
        let mut session = PublishSession::new(
            MockTransport::new(),
            MqttConfig {
                subscribe: true,
                ..config()
            },
        );
        session.ensure_connected().await;
        assert!(session.is_connected());
        assert_eq!(session.transport().subscriptions, vec!["cellmon/battery"]);
    }

    #[tokio::test]
    async fn connect_skips_subscribe_by_default() {
        let mut session = PublishSession::new(MockTransport::new(), config());
        session.ensure_connected().await;
        assert!(session.transport().subscriptions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connects_wait_the_fixed_delay() {
        let start = tokio::time::Instant::now();
        let mut session = PublishSession::new(MockTransport::failing_first(3), config());
        session.ensure_connected().await;

        assert!(session.is_connected());
        assert_eq!(session.transport().connect_attempts, 4);
        assert_eq!(session.stats().connect_failures, 3);
        // three failures, each followed by the fixed 2 s delay
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn maintain_detects_broker_disconnect() {
        let mut transport = MockTransport::new();
        transport.push_poll(Err(SessionError::ConnectionLost(
            "broker sent disconnect".to_string(),
        )));
        let mut session = PublishSession::new(transport, config());

        session.ensure_connected().await;
        assert!(session.is_connected());

        session.maintain().await;
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn maintain_counts_inbound_messages() {
        let mut transport = MockTransport::new();
        transport.push_poll(Ok(TransportEvent::Inbound {
            topic: "cellmon/battery".to_string(),
            payload: b"{}".to_vec(),
        }));
        let mut session = PublishSession::new(transport, config());

        session.ensure_connected().await;
        session.maintain().await;
        assert_eq!(session.stats().messages_received, 1);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn publish_records_payload_and_stats() {
        let mut session = PublishSession::new(MockTransport::new(), config());
        session.ensure_connected().await;
        session.publish("{\"x\": 1.00}", true).await.unwrap();

        let record = &session.transport().published[0];
        assert_eq!(record.topic, "cellmon/battery");
        assert_eq!(record.payload, "{\"x\": 1.00}");
        assert!(record.retain);
        assert_eq!(session.stats().messages_sent, 1);
        assert!(session.stats().last_activity.is_some());
    }
}
