//! Fault-tolerant container: expects its wrapped action to raise a specific
//! failure and swallows it.
//!
//! This is the explicit variant behavior; every other container propagates
//! the first child failure. The assertion fails when the wrapped action
//! succeeds, or when the raised failure does not match the expectation.

use tracing::debug;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::container::{ActionSequence, TestActionContainer};
use crate::context::TestContext;
use crate::errors::EngineError;

pub struct AssertContainer {
    core: ActionCore,
    sequence: ActionSequence,
    expected_message: Option<String>,
}

impl AssertContainer {
    pub fn expecting_failure(action: Box<dyn TestAction>) -> Self {
        Self {
            core: ActionCore::new("assert"),
            sequence: ActionSequence::new(vec![action]),
            expected_message: None,
        }
    }

    /// Additionally require the failure message to contain `fragment`.
    pub fn with_message(mut self, fragment: impl Into<String>) -> Self {
        self.expected_message = Some(fragment.into());
        self
    }
}

impl TestAction for AssertContainer {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        let wrapped_name = self
            .sequence
            .actions()
            .first()
            .map(|a| a.name().to_string())
            .unwrap_or_default();

        match self.sequence.run_pass(ctx) {
            Ok(()) => Err(EngineError::validation(format!(
                "missing assertion failure: nested action '{wrapped_name}' completed successfully"
            ))),
            Err(error) => {
                if let Some(fragment) = &self.expected_message {
                    let text = error.to_string();
                    if !text.contains(fragment.as_str()) {
                        return Err(EngineError::validation(format!(
                            "assertion failed: expected failure containing '{fragment}' but was '{text}'"
                        )));
                    }
                }
                debug!(action = %wrapped_name, "caught expected failure");
                Ok(())
            }
        }
    }

    fn as_container(&self) -> Option<&dyn TestActionContainer> {
        Some(self)
    }
}

impl TestActionContainer for AssertContainer {
    fn actions(&self) -> &[Box<dyn TestAction>] {
        self.sequence.actions()
    }

    fn active_index(&self) -> Option<usize> {
        self.sequence.active_index()
    }

    fn executed(&self) -> &[usize] {
        self.sequence.executed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::FailAction;
    use crate::container::test_support::ScriptedAction;

    #[test]
    fn expected_failure_is_swallowed() {
        let mut container =
            AssertContainer::expecting_failure(Box::new(FailAction::new("expected boom")));
        let mut ctx = TestContext::default();
        container.execute(&mut ctx).unwrap();
    }

    #[test]
    fn unexpected_success_fails_the_assertion() {
        let mut container = AssertContainer::expecting_failure(ScriptedAction::succeeding("calm"));
        let mut ctx = TestContext::default();
        let err = container.execute(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("missing assertion failure"));
    }

    #[test]
    fn message_fragment_must_match() {
        let mut container =
            AssertContainer::expecting_failure(Box::new(FailAction::new("actual reason")))
                .with_message("different reason");
        let mut ctx = TestContext::default();
        let err = container.execute(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("different reason"));
    }
}
