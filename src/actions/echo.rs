//! Prints a message through the logging layer, with dynamic content
//! resolved against the current context.

use tracing::info;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::context::TestContext;
use crate::errors::EngineError;
use crate::variable::resolve_dynamic_content;

pub struct EchoAction {
    core: ActionCore,
    message: String,
}

impl EchoAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            core: ActionCore::new("echo"),
            message: message.into(),
        }
    }
}

impl TestAction for EchoAction {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        let resolved = resolve_dynamic_content(&self.message, ctx)?;
        info!(test = ctx.test_name().unwrap_or("<unnamed>"), "{resolved}");
        Ok(())
    }
}
