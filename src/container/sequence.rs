//! Sequential container: children execute in declaration order, the first
//! failure aborts and propagates.

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::container::{ActionSequence, TestActionContainer};
use crate::context::TestContext;
use crate::errors::EngineError;

pub struct SequenceContainer {
    core: ActionCore,
    sequence: ActionSequence,
}

impl SequenceContainer {
    pub fn new() -> Self {
        Self {
            core: ActionCore::new("sequential"),
            sequence: ActionSequence::default(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: ActionCore::new(name),
            sequence: ActionSequence::default(),
        }
    }

    pub fn action(mut self, action: Box<dyn TestAction>) -> Self {
        self.sequence.push(action);
        self
    }
}

impl Default for SequenceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAction for SequenceContainer {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        self.sequence.run_pass(ctx)
    }

    fn as_container(&self) -> Option<&dyn TestActionContainer> {
        Some(self)
    }
}

impl TestActionContainer for SequenceContainer {
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
