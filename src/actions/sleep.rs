//! Delays test execution for a fixed interval.

use std::time::Duration;

use tracing::debug;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::context::TestContext;
use crate::errors::EngineError;

pub struct SleepAction {
    core: ActionCore,
    delay: Duration,
}

impl SleepAction {
    pub fn new(delay: Duration) -> Self {
        Self {
            core: ActionCore::new("sleep"),
            delay,
        }
    }

    pub fn millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

impl TestAction for SleepAction {
    delegate_action_core!();

    fn execute(&mut self, _ctx: &mut TestContext) -> Result<(), EngineError> {
        debug!(delay_ms = self.delay.as_millis() as u64, "sleeping");
        std::thread::sleep(self.delay);
        Ok(())
    }
}
