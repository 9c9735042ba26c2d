//! Raises a deliberate validation failure, for negative tests and for
//! exercising fault-tolerant containers.

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::context::TestContext;
use crate::errors::EngineError;
use crate::variable::resolve_dynamic_content;

pub struct FailAction {
    core: ActionCore,
    message: String,
}

impl FailAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            core: ActionCore::new("fail"),
            message: message.into(),
        }
    }
}

impl Default for FailAction {
    fn default() -> Self {
        Self::new("generated failure")
    }
}

impl TestAction for FailAction {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        let message = resolve_dynamic_content(&self.message, ctx)?;
        Err(EngineError::validation(message))
    }
}
