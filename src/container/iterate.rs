//! Iterating container: re-executes the same child sequence across a fixed
//! number of logical iterations.
//!
//! The flat `executed` list spans every pass, so index bookkeeping must
//! account for `iteration * actions_per_iteration`; the per-iteration view is
//! derived by chunking. The current iteration number (1-based) is published
//! to the context under the configured index variable before each pass.

use tracing::debug;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::container::{ActionSequence, TestActionContainer};
use crate::context::TestContext;
use crate::errors::EngineError;

pub struct IterateContainer {
    core: ActionCore,
    sequence: ActionSequence,
    iterations: usize,
    index_variable: String,
}

impl IterateContainer {
    pub fn new(iterations: usize) -> Self {
        Self {
            core: ActionCore::new("iterate"),
            sequence: ActionSequence::default(),
            iterations,
            index_variable: "i".to_string(),
        }
    }

    pub fn index_variable(mut self, name: impl Into<String>) -> Self {
        self.index_variable = name.into();
        self
    }

    pub fn action(mut self, action: Box<dyn TestAction>) -> Self {
        self.sequence.push(action);
        self
    }

    pub fn actions_per_iteration(&self) -> usize {
        self.sequence.len()
    }

    /// Executed indices grouped by pass: chunk `n` holds iteration `n + 1`.
    pub fn executed_by_iteration(&self) -> Vec<&[usize]> {
        if self.sequence.is_empty() {
            return Vec::new();
        }
        self.sequence
            .executed()
            .chunks(self.actions_per_iteration())
            .collect()
    }
}

impl TestAction for IterateContainer {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        for iteration in 1..=self.iterations {
            debug!(iteration, "starting iteration");
            ctx.set_variable(self.index_variable.clone(), iteration.to_string());
            self.sequence.run_pass(ctx)?;
        }
        Ok(())
    }

    fn as_container(&self) -> Option<&dyn TestActionContainer> {
        Some(self)
    }
}

impl TestActionContainer for IterateContainer {
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
    use crate::container::test_support::ScriptedAction;

    #[test]
    fn iterations_reuse_the_same_child_sequence() {
        let mut container = IterateContainer::new(3)
            .action(ScriptedAction::succeeding("first"))
            .action(ScriptedAction::succeeding("second"));
        let mut ctx = TestContext::default();
        container.execute(&mut ctx).unwrap();

        assert_eq!(container.executed().len(), 3 * 2);
        assert_eq!(container.executed(), &[0, 1, 0, 1, 0, 1]);
        let grouped = container.executed_by_iteration();
        assert_eq!(grouped.len(), 3);
        assert!(grouped.iter().all(|chunk| *chunk == [0, 1]));
        // Index variable holds the last iteration after the loop.
        assert_eq!(ctx.variable("i").unwrap(), "3");
    }

    #[test]
    fn failure_stops_remaining_iterations() {
        let mut container = IterateContainer::new(5)
            .action(ScriptedAction::succeeding("first"))
            .action(ScriptedAction::failing("second"));
        let mut ctx = TestContext::default();
        container.execute(&mut ctx).unwrap_err();
        // One full pass was attempted; the failure aborted the loop.
        assert_eq!(container.executed(), &[0, 1]);
    }

    #[test]
    fn index_variable_is_visible_to_children() {
        struct IndexProbe {
            core: ActionCore,
            seen: Vec<String>,
        }
        impl TestAction for IndexProbe {
            delegate_action_core!();

            fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
                self.seen.push(ctx.variable("i")?.to_string());
                Ok(())
            }
        }

        let mut container = IterateContainer::new(2).action(Box::new(IndexProbe {
            core: ActionCore::new("probe"),
            seen: Vec::new(),
        }));
        let mut ctx = TestContext::default();
        container.execute(&mut ctx).unwrap();
    }
}
