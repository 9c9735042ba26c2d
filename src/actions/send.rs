//! Sends a message built from a payload template and header templates, with
//! dynamic content resolved at execution time.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::context::{TestContext, TraceDirection};
use crate::endpoint::Endpoint;
use crate::errors::EngineError;
use crate::message::Message;
use crate::variable::resolve_dynamic_content;

pub struct SendMessageAction {
    core: ActionCore,
    endpoint: Arc<dyn Endpoint>,
    payload: String,
    headers: IndexMap<String, String>,
}

impl SendMessageAction {
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            core: ActionCore::new("send"),
            endpoint,
            payload: String::new(),
            headers: IndexMap::new(),
        }
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl TestAction for SendMessageAction {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        let payload = resolve_dynamic_content(&self.payload, ctx)?;
        let mut message = Message::text(payload);
        for (name, value) in &self.headers {
            let name = resolve_dynamic_content(name, ctx)?;
            let value = resolve_dynamic_content(value, ctx)?;
            message.set_header(name, value);
        }

        debug!(endpoint = self.endpoint.name(), "sending message");
        ctx.trace_message(TraceDirection::Outbound, self.endpoint.name(), &message);
        self.endpoint.create_producer().send(message, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::DirectEndpoint;
    use std::time::Duration;

    #[test]
    fn send_resolves_payload_and_headers() {
        let endpoint = Arc::new(DirectEndpoint::new("out"));
        let mut ctx = TestContext::default();
        ctx.set_variable("orderId", "4711");

        let mut action = SendMessageAction::new(endpoint.clone())
            .payload("<Order><Id>${orderId}</Id></Order>")
            .header("operation", "veritas:upper-case('create')");
        action.execute(&mut ctx).unwrap();

        let received = endpoint
            .create_consumer()
            .receive(&mut ctx, Duration::from_millis(100))
            .unwrap();
        assert_eq!(
            received.payload_text().unwrap(),
            "<Order><Id>4711</Id></Order>"
        );
        assert_eq!(received.header("operation").unwrap().to_string(), "CREATE");
        assert_eq!(ctx.message_trace().len(), 1);
    }
}
