//! Action containers: ordered sequences of nested actions with execution
//! bookkeeping.
//!
//! The shared [`ActionSequence`] tracks the index of the child currently
//! running (`active_index`, monotonically forward) and the indices of
//! children that have finished (`executed`, append-only; a child is recorded
//! the moment it finishes, whether it succeeded or failed). Iterating
//! containers run multiple passes over the same children, so `executed` may
//! reference the same index repeatedly; per-iteration grouping is derived by
//! chunking.

use tracing::debug;

use crate::actions::{ActionStatus, TestAction};
use crate::context::TestContext;
use crate::errors::EngineError;

pub mod assert_failure;
pub mod iterate;
pub mod sequence;

pub use assert_failure::AssertContainer;
pub use iterate::IterateContainer;
pub use sequence::SequenceContainer;

/// Read access to a container's structure and execution state, used by the
/// engine and the failure-stack reconstructor.
pub trait TestActionContainer: TestAction {
    fn actions(&self) -> &[Box<dyn TestAction>];

    /// Index of the child currently (or last) running; `None` before the
    /// first child starts.
    fn active_index(&self) -> Option<usize>;

    /// Indices of finished children, in completion order.
    fn executed(&self) -> &[usize];

    fn active_action(&self) -> Option<&dyn TestAction> {
        self.active_index()
            .and_then(|i| self.actions().get(i))
            .map(Box::as_ref)
    }
}

/// The ordered child list plus execution bookkeeping embedded by every
/// container implementation.
#[derive(Default)]
pub struct ActionSequence {
    actions: Vec<Box<dyn TestAction>>,
    active_index: Option<usize>,
    executed: Vec<usize>,
}

impl ActionSequence {
    pub fn new(actions: Vec<Box<dyn TestAction>>) -> Self {
        Self {
            actions,
            active_index: None,
            executed: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[Box<dyn TestAction>] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn executed(&self) -> &[usize] {
        &self.executed
    }

    pub fn push(&mut self, action: Box<dyn TestAction>) {
        self.actions.push(action);
    }

    /// Runs one pass over all children in declaration order. The first child
    /// failure is recorded in `executed`, then propagated; remaining
    /// children do not run.
    pub fn run_pass(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        for index in 0..self.actions.len() {
            self.active_index = Some(index);
            let action = &mut self.actions[index];
            debug!(action = action.name(), index, "executing action");
            action.set_status(ActionStatus::Running);

            let outcome = action.execute(ctx);
            action.set_status(if outcome.is_ok() {
                ActionStatus::Success
            } else {
                ActionStatus::Failed
            });
            // Finished children are recorded whether they passed or failed.
            self.executed.push(index);
            outcome?;
        }
        Ok(())
    }
}
