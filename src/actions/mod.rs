//! Test actions: the ordered, nestable units of execution.
//!
//! Executing an action either completes, is skipped, or raises a typed
//! failure; it never silently no-ops. Containers are actions too; the
//! [`as_container`](TestAction::as_container) seam lets the engine and the
//! failure-stack reconstructor walk nested structures without downcasting.

use crate::container::TestActionContainer;
use crate::context::TestContext;
use crate::errors::EngineError;

pub mod echo;
pub mod fail;
pub mod receive;
pub mod send;
pub mod sleep;

pub use echo::EchoAction;
pub use fail::FailAction;
pub use receive::ReceiveMessageAction;
pub use send::SendMessageAction;
pub use sleep::SleepAction;

/// Lifecycle of a single action. Transitions run
/// `Pending → Running → {Success | Failed | Skipped}`; the terminal states
/// never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

/// One unit of test execution.
pub trait TestAction {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Performs the action's effect. Containers execute their children here.
    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError>;

    fn status(&self) -> ActionStatus;

    fn set_status(&mut self, status: ActionStatus);

    /// Container view of this action, if it is one.
    fn as_container(&self) -> Option<&dyn TestActionContainer> {
        None
    }
}

/// Name, description and status shared by every action implementation.
#[derive(Debug, Clone)]
pub struct ActionCore {
    name: String,
    description: Option<String>,
    status: ActionStatus,
}

impl ActionCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: ActionStatus::Pending,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ActionStatus) {
        self.status = status;
    }
}

/// Forwards the `TestAction` bookkeeping methods to an `ActionCore` field
/// named `core`.
macro_rules! delegate_action_core {
    () => {
        fn name(&self) -> &str {
            self.core.name()
        }

        fn description(&self) -> Option<&str> {
            self.core.description()
        }

        fn status(&self) -> crate::actions::ActionStatus {
            self.core.status()
        }

        fn set_status(&mut self, status: crate::actions::ActionStatus) {
            self.core.set_status(status);
        }
    };
}
pub(crate) use delegate_action_core;
