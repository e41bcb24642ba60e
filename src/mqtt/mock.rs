//! Scripted transport for driving the session state machine in tests.
//!
//! Behaves like a broker that accepts everything: connects succeed (after an
//! optional number of scripted refusals), publishes are recorded, and polls
//! replay a queue of prepared outcomes before settling on `Idle`.

use std::collections::VecDeque;

use super::transport::{SessionError, Transport, TransportEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRecord {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    refusals_remaining: usize,
    connected: bool,
    pub connect_attempts: usize,
    pub published: Vec<PublishedRecord>,
    pub subscriptions: Vec<String>,
    poll_script: VecDeque<Result<TransportEvent, SessionError>>,
}

impl MockTransport {
    /// A transport whose connects always succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that refuses the first `n` connect attempts.
    pub fn failing_first(n: usize) -> Self {
        Self {
            refusals_remaining: n,
            ..Self::default()
        }
    }

    /// Queues the outcome of a future `poll` call.
    pub fn push_poll(&mut self, outcome: Result<TransportEvent, SessionError>) {
        self.poll_script.push_back(outcome);
    }
}

impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), SessionError> {
        self.connect_attempts += 1;
        if self.refusals_remaining > 0 {
            self.refusals_remaining -= 1;
            return Err(SessionError::ConnectFailed(
                "mock transport refused".to_string(),
            ));
        }
        self.connected = true;
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.published.push(PublishedRecord {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            retain,
        });
        Ok(())
    }

    async fn poll(&mut self) -> Result<TransportEvent, SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        match self.poll_script.pop_front() {
            Some(Err(err)) => {
                self.connected = false;
                Err(err)
            }
            Some(ok) => ok,
            None => Ok(TransportEvent::Idle),
        }
    }
}
