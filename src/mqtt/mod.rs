//! MQTT delivery layer.
//!
//! The pipeline's outbound messages leave through a [`session::PublishSession`],
//! a small state machine over `{Disconnected, Connecting, Connected}` that owns
//! the broker connection lifecycle: connect with a bounded per-attempt timeout,
//! retry forever on a fixed delay, publish while connected, and poll the
//! transport every cycle to service keep-alive and notice broker-initiated
//! disconnects.
//!
//! The session is generic over [`transport::Transport`] so the state machine
//! can be driven deterministically in tests with [`mock::MockTransport`];
//! production uses [`transport::RumqttcTransport`].
//!
//! Connection loss is never fatal here. A failed connect is logged and
//! retried, a failed publish is reported to the caller, and nothing panics.

pub mod config;
pub mod mock;
pub mod session;
pub mod transport;

pub use config::MqttConfig;
pub use session::{ConnectionState, PublishSession, RetryPolicy, SessionStats};
pub use transport::{RumqttcTransport, SessionError, Transport, TransportEvent};
