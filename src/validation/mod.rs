//! Control-message validation: validator trait, capability registry and the
//! standard validators.
//!
//! Validators self-declare which `(message type, context kind)` pairs they
//! support; the registry returns every match in registration order and a
//! context nobody supports is a configuration error. The registry is built
//! once before any test executes and never mutated afterwards.

use tracing::debug;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::message::Message;

pub mod context;
pub mod header;
pub mod json;
pub mod path;
pub mod xml;
pub mod xpath;

pub use context::{
    ContextKind, HeaderValidationContext, PathValidationContext, ValidationContext,
    XmlValidationContext,
};

/// Payload type of a received message, declared by the receiving action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Xml,
    Json,
    PlainText,
}

/// A validator compares one aspect of a received message against its control
/// message under the expectations of a [`ValidationContext`].
pub trait MessageValidator: Send + Sync {
    fn name(&self) -> &str;

    /// Capability declaration: does this validator handle the given message
    /// type and context kind?
    fn supports(&self, message_type: MessageType, kind: ContextKind) -> bool;

    fn validate(
        &self,
        received: &Message,
        control: &Message,
        ctx: &mut TestContext,
        vctx: &ValidationContext,
    ) -> Result<(), EngineError>;
}

/// Ordered validator registry. Registration happens once at startup;
/// execution only reads.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Vec<Box<dyn MessageValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, validator: Box<dyn MessageValidator>) {
        self.validators.push(validator);
    }

    /// All validators supporting the pair, in registration order.
    pub fn find_validators(
        &self,
        message_type: MessageType,
        kind: ContextKind,
    ) -> Vec<&dyn MessageValidator> {
        self.validators
            .iter()
            .filter(|v| v.supports(message_type, kind))
            .map(Box::as_ref)
            .collect()
    }

    /// Like [`find_validators`](Self::find_validators) but failing with a
    /// configuration error when nothing matches: a declared expectation that
    /// nobody can check must abort instead of silently passing.
    pub fn require_validators(
        &self,
        message_type: MessageType,
        kind: ContextKind,
    ) -> Result<Vec<&dyn MessageValidator>, EngineError> {
        let found = self.find_validators(message_type, kind);
        if found.is_empty() {
            return Err(EngineError::config(format!(
                "no validator registered for message type {message_type:?} and context kind {kind:?}"
            )));
        }
        Ok(found)
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Header validator: payload-type independent.
pub struct HeaderMessageValidator;

impl MessageValidator for HeaderMessageValidator {
    fn name(&self) -> &str {
        "header"
    }

    fn supports(&self, _message_type: MessageType, kind: ContextKind) -> bool {
        kind == ContextKind::Header
    }

    fn validate(
        &self,
        received: &Message,
        _control: &Message,
        ctx: &mut TestContext,
        vctx: &ValidationContext,
    ) -> Result<(), EngineError> {
        let ValidationContext::Header(header_ctx) = vctx else {
            return Err(foreign_context(self.name(), vctx));
        };
        header::validate_headers(&header_ctx.expected, received.headers(), ctx)
    }
}

/// Structural XML validator: compares the received payload tree against the
/// control payload tree.
pub struct XmlMessageValidator;

impl MessageValidator for XmlMessageValidator {
    fn name(&self) -> &str {
        "xml"
    }

    fn supports(&self, message_type: MessageType, kind: ContextKind) -> bool {
        message_type == MessageType::Xml && kind == ContextKind::Xml
    }

    fn validate(
        &self,
        received: &Message,
        control: &Message,
        _ctx: &mut TestContext,
        vctx: &ValidationContext,
    ) -> Result<(), EngineError> {
        let ValidationContext::Xml(xml_ctx) = vctx else {
            return Err(foreign_context(self.name(), vctx));
        };
        let control_payload = control.payload_text()?;
        if control_payload.trim().is_empty() {
            // No control payload declared: headers/path contexts carry the
            // expectations instead. Namespace expectations still apply.
            if !xml_ctx.expected_namespaces.is_empty() {
                return xml::validate_namespaces(received.payload_text()?, xml_ctx);
            }
            return Ok(());
        }
        debug!(validator = self.name(), "starting payload validation");
        xml::validate_xml_payload(received.payload_text()?, control_payload, xml_ctx)
    }
}

/// Path-expression validator: XPath for XML payloads, JSONPath for JSON.
pub struct PathExpressionValidator;

impl MessageValidator for PathExpressionValidator {
    fn name(&self) -> &str {
        "path"
    }

    fn supports(&self, message_type: MessageType, kind: ContextKind) -> bool {
        matches!(message_type, MessageType::Xml | MessageType::Json) && kind == ContextKind::Path
    }

    fn validate(
        &self,
        received: &Message,
        _control: &Message,
        ctx: &mut TestContext,
        vctx: &ValidationContext,
    ) -> Result<(), EngineError> {
        let ValidationContext::Path(path_ctx) = vctx else {
            return Err(foreign_context(self.name(), vctx));
        };
        path::validate_elements(path_ctx, received, ctx)
    }
}

fn foreign_context(validator: &str, vctx: &ValidationContext) -> EngineError {
    EngineError::config(format!(
        "validator '{validator}' was dispatched a foreign validation context of kind {:?}",
        vctx.kind()
    ))
}

/// Builds the registry holding the standard validators; the single source of
/// truth for validator registration.
pub fn build_default_validator_registry() -> ValidatorRegistry {
    let mut registry = ValidatorRegistry::new();
    registry.register(Box::new(HeaderMessageValidator));
    registry.register(Box::new(XmlMessageValidator));
    registry.register(Box::new(PathExpressionValidator));
    registry
}
