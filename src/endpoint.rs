//! Connector boundary: the engine exchanges messages through these traits and
//! never learns transport details.
//!
//! The only place a timeout exists in the core is `Consumer::receive`: a
//! slow or absent response surfaces as [`EngineError::Timeout`]. Once
//! validation of a received message begins it runs to completion or failure
//! synchronously.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::message::Message;

/// Sends one message to wherever the endpoint points.
pub trait Producer: Send {
    fn send(&mut self, message: Message, ctx: &mut TestContext) -> Result<(), EngineError>;
}

/// Blocks for up to `timeout` waiting for the next message.
pub trait Consumer: Send {
    fn receive(&mut self, ctx: &mut TestContext, timeout: Duration)
        -> Result<Message, EngineError>;
}

/// A named place messages go to and come from.
pub trait Endpoint: Send + Sync {
    fn name(&self) -> &str;

    /// Default receive timeout, used when the receiving action does not
    /// override it.
    fn timeout(&self) -> Duration;

    fn create_producer(&self) -> Box<dyn Producer>;

    fn create_consumer(&self) -> Box<dyn Consumer>;
}

/// In-memory queue endpoint. Producer and consumer share one queue, which
/// makes it the natural endpoint for engine tests and same-process request
/// loops.
pub struct DirectEndpoint {
    name: String,
    timeout: Duration,
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl DirectEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: Duration::from_millis(5000),
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queue length; mostly useful in assertions.
    pub fn pending(&self) -> usize {
        self.queue.lock().expect("endpoint queue lock").len()
    }
}

impl Endpoint for DirectEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn create_producer(&self) -> Box<dyn Producer> {
        Box::new(DirectProducer {
            endpoint_name: self.name.clone(),
            queue: Arc::clone(&self.queue),
        })
    }

    fn create_consumer(&self) -> Box<dyn Consumer> {
        Box::new(DirectConsumer {
            endpoint_name: self.name.clone(),
            queue: Arc::clone(&self.queue),
        })
    }
}

struct DirectProducer {
    endpoint_name: String,
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl Producer for DirectProducer {
    fn send(&mut self, message: Message, _ctx: &mut TestContext) -> Result<(), EngineError> {
        debug!(endpoint = %self.endpoint_name, "delivering message to direct queue");
        self.queue
            .lock()
            .expect("endpoint queue lock")
            .push_back(message);
        Ok(())
    }
}

struct DirectConsumer {
    endpoint_name: String,
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl Consumer for DirectConsumer {
    fn receive(
        &mut self,
        _ctx: &mut TestContext,
        timeout: Duration,
    ) -> Result<Message, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(message) = self.queue.lock().expect("endpoint queue lock").pop_front() {
                debug!(endpoint = %self.endpoint_name, "consumed message from direct queue");
                return Ok(message);
            }
            if Instant::now() >= deadline {
                return Err(EngineError::Timeout {
                    endpoint: self.endpoint_name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            std::thread::sleep(Duration::from_millis(10).min(timeout));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_endpoint_round_trips_messages() {
        let endpoint = DirectEndpoint::new("loopback");
        let mut ctx = TestContext::default();
        endpoint
            .create_producer()
            .send(Message::text("<Ping/>"), &mut ctx)
            .unwrap();
        let received = endpoint
            .create_consumer()
            .receive(&mut ctx, Duration::from_millis(100))
            .unwrap();
        assert_eq!(received.payload_text().unwrap(), "<Ping/>");
    }

    #[test]
    fn empty_queue_times_out_with_endpoint_name() {
        let endpoint = DirectEndpoint::new("silent");
        let mut ctx = TestContext::default();
        let err = endpoint
            .create_consumer()
            .receive(&mut ctx, Duration::from_millis(30))
            .unwrap_err();
        match err {
            EngineError::Timeout {
                endpoint,
                timeout_ms,
            } => {
                assert_eq!(endpoint, "silent");
                assert_eq!(timeout_ms, 30);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
