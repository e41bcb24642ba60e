//! Transport seam between the publish session and the wire.
//!
//! [`Transport`] is the narrow interface the session state machine needs:
//! connect, subscribe, publish, and a single bounded poll step. The
//! production implementation wraps `rumqttc`; tests swap in a scripted mock.

use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use thiserror::Error;
use tracing::debug;

use super::config::MqttConfig;

/// Upper bound on a single maintenance poll so the control loop never stalls
/// on a quiet connection.
const POLL_BUDGET: Duration = Duration::from_millis(250);

/// Failures surfaced by the delivery layer. All of them are recoverable; the
/// session decides whether to retry or report.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("broker connect failed: {0}")]
    ConnectFailed(String),
    #[error("broker connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("not connected to broker")]
    NotConnected,
}

/// Outcome of one maintenance poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A message arrived on a subscribed topic.
    Inbound { topic: String, payload: Vec<u8> },
    /// Keep-alive or protocol chatter was serviced; nothing to hand up.
    Idle,
}

/// The wire operations the session state machine depends on.
pub trait Transport {
    /// One bounded connection attempt.
    async fn connect(&mut self) -> Result<(), SessionError>;

    async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), SessionError>;

    /// Services the connection once. An `Err` means the connection is gone.
    async fn poll(&mut self) -> Result<TransportEvent, SessionError>;
}

/// `rumqttc`-backed transport. Every connect attempt builds a fresh client
/// and event loop so stale session state from a dropped connection cannot
/// leak into the next one.
pub struct RumqttcTransport {
    config: MqttConfig,
    link: Option<(AsyncClient, EventLoop)>,
}

impl RumqttcTransport {
    pub fn new(config: MqttConfig) -> Self {
        Self { config, link: None }
    }
}

impl Transport for RumqttcTransport {
    async fn connect(&mut self) -> Result<(), SessionError> {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(self.config.keep_alive());
        if let (Some(user), Some(password)) = (&self.config.username, &self.config.password) {
            options.set_credentials(user.clone(), password.clone());
        }

        let (client, mut eventloop) = AsyncClient::new(options, 16);

        // drive the event loop until the broker acknowledges the connection
        let handshake = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            return Ok(());
                        }
                        return Err(SessionError::ConnectFailed(format!("{:?}", ack.code)));
                    }
                    Ok(event) => debug!("pre-connack event: {:?}", event),
                    Err(err) => return Err(SessionError::ConnectFailed(err.to_string())),
                }
            }
        };

        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, handshake).await {
            Ok(Ok(())) => {
                self.link = Some((client, eventloop));
                Ok(())
            }
            Ok(Err(err)) => {
                self.link = None;
                Err(err)
            }
            Err(_) => {
                self.link = None;
                Err(SessionError::ConnectTimeout(timeout))
            }
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        let (client, _) = self.link.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|err| SessionError::SubscribeFailed(err.to_string()))
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), SessionError> {
        let (client, _) = self.link.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .publish(topic, QoS::AtLeastOnce, retain, payload.to_vec())
            .await
            .map_err(|err| SessionError::PublishFailed(err.to_string()))
    }

    async fn poll(&mut self) -> Result<TransportEvent, SessionError> {
        let (_, eventloop) = self.link.as_mut().ok_or(SessionError::NotConnected)?;
        match tokio::time::timeout(POLL_BUDGET, eventloop.poll()).await {
            // nothing pending within the budget; the connection is fine
            Err(_) => Ok(TransportEvent::Idle),
            Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => Ok(TransportEvent::Inbound {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
            }),
            Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                self.link = None;
                Err(SessionError::ConnectionLost(
                    "broker sent disconnect".to_string(),
                ))
            }
            Ok(Ok(_)) => Ok(TransportEvent::Idle),
            Ok(Err(err)) => {
                self.link = None;
                Err(SessionError::ConnectionLost(err.to_string()))
            }
        }
    }
}
