//! Receives a message from an endpoint and validates it against the declared
//! expectations.
//!
//! The consumer boundary enforces the only timeout in the core. After the
//! message arrives, every validation context is dispatched in declaration
//! order to the validators that support it (in registration order), then
//! variable extraction runs. The first mismatch aborts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::debug;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::context::{TestContext, TraceDirection};
use crate::endpoint::Endpoint;
use crate::errors::EngineError;
use crate::message::Message;
use crate::validation::path::extract_variables;
use crate::validation::{MessageType, ValidationContext};
use crate::variable::resolve_dynamic_content;

pub struct ReceiveMessageAction {
    core: ActionCore,
    endpoint: Arc<dyn Endpoint>,
    message_type: MessageType,
    control_payload: Option<String>,
    validation_contexts: Vec<ValidationContext>,
    extract: IndexMap<String, String>,
    extract_namespaces: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl ReceiveMessageAction {
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            core: ActionCore::new("receive"),
            endpoint,
            message_type: MessageType::Xml,
            control_payload: None,
            validation_contexts: Vec::new(),
            extract: IndexMap::new(),
            extract_namespaces: HashMap::new(),
            timeout: None,
        }
    }

    pub fn message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// Control payload template; dynamic content resolves at execution time.
    pub fn control_payload(mut self, payload: impl Into<String>) -> Self {
        self.control_payload = Some(payload.into());
        self
    }

    pub fn validate(mut self, vctx: impl Into<ValidationContext>) -> Self {
        self.validation_contexts.push(vctx.into());
        self
    }

    /// Extract the value addressed by `expression` into the named variable
    /// after validation succeeds.
    pub fn extract(mut self, expression: impl Into<String>, variable: impl Into<String>) -> Self {
        self.extract.insert(expression.into(), variable.into());
        self
    }

    pub fn bind_extract_prefix(
        mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        self.extract_namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Overrides the endpoint's default receive timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl TestAction for ReceiveMessageAction {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        let timeout = self.timeout.unwrap_or_else(|| self.endpoint.timeout());
        debug!(
            endpoint = self.endpoint.name(),
            timeout_ms = timeout.as_millis() as u64,
            "waiting for message"
        );
        let received = self.endpoint.create_consumer().receive(ctx, timeout)?;
        ctx.trace_message(TraceDirection::Inbound, self.endpoint.name(), &received);

        let control = match &self.control_payload {
            Some(template) => Message::plain(resolve_dynamic_content(template, ctx)?),
            None => Message::plain(""),
        };

        let registry = ctx.validators();
        for vctx in &self.validation_contexts {
            let validators = registry.require_validators(self.message_type, vctx.kind())?;
            for validator in validators {
                debug!(validator = validator.name(), "running validator");
                validator.validate(&received, &control, ctx, vctx)?;
            }
        }

        extract_variables(&self.extract, &self.extract_namespaces, &received, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::DirectEndpoint;
    use crate::validation::{HeaderValidationContext, XmlValidationContext};

    fn loaded_endpoint(payload: &str) -> Arc<DirectEndpoint> {
        let endpoint = Arc::new(DirectEndpoint::new("in"));
        let mut ctx = TestContext::default();
        endpoint
            .create_producer()
            .send(
                Message::text(payload).with_header("operation", "createOrder"),
                &mut ctx,
            )
            .unwrap();
        endpoint
    }

    #[test]
    fn receive_validates_and_extracts() {
        let endpoint = loaded_endpoint("<Order><Id>4711</Id></Order>");
        let mut ctx = TestContext::default();

        let mut action = ReceiveMessageAction::new(endpoint)
            .control_payload("<Order><Id>4711</Id></Order>")
            .validate(HeaderValidationContext::new().expect("operation", "createOrder"))
            .validate(XmlValidationContext::new())
            .extract("/Order/Id", "orderId");
        action.execute(&mut ctx).unwrap();
        assert_eq!(ctx.variable("orderId").unwrap(), "4711");
    }

    #[test]
    fn receive_fails_on_payload_mismatch() {
        let endpoint = loaded_endpoint("<Order><Id>9999</Id></Order>");
        let mut ctx = TestContext::default();

        let mut action = ReceiveMessageAction::new(endpoint)
            .control_payload("<Order><Id>4711</Id></Order>")
            .validate(XmlValidationContext::new());
        let err = action.execute(&mut ctx).unwrap_err();
        assert!(err.is_validation_failure());
    }

    #[test]
    fn receive_times_out_on_silent_endpoint() {
        let endpoint = Arc::new(DirectEndpoint::new("silent"));
        let mut ctx = TestContext::default();

        let mut action = ReceiveMessageAction::new(endpoint)
            .timeout(Duration::from_millis(20))
            .validate(XmlValidationContext::new());
        let err = action.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }));
    }
}
