//! The test case: root action container plus naming, meta information,
//! variable definitions and final actions.

use chrono::NaiveDate;

use crate::actions::{delegate_action_core, ActionCore, TestAction};
use crate::container::{ActionSequence, TestActionContainer};
use crate::context::TestContext;
use crate::errors::EngineError;
use crate::result::TestResult;

/// Author-declared maturity of a test. `Draft` and `Disabled` tests are
/// skipped by the execution engine without running any action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Final,
    Draft,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct TestMetaInfo {
    pub author: String,
    pub status: TestStatus,
    pub creation_date: Option<NaiveDate>,
    pub last_updated: Option<NaiveDate>,
}

impl Default for TestMetaInfo {
    fn default() -> Self {
        Self {
            author: String::new(),
            status: TestStatus::Final,
            creation_date: None,
            last_updated: None,
        }
    }
}

/// Root container of one test run.
///
/// Created once per run, mutated only by the execution engine, discarded
/// after reporting. The `package_name`/`name` pair addresses the serialized
/// test definition used for failure-stack reconstruction.
pub struct TestCase {
    core: ActionCore,
    package_name: String,
    sequence: ActionSequence,
    final_actions: Vec<Box<dyn TestAction>>,
    variable_definitions: Vec<(String, String)>,
    meta: TestMetaInfo,
    result: Option<TestResult>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            core: ActionCore::new(name),
            package_name: package_name.into(),
            sequence: ActionSequence::default(),
            final_actions: Vec::new(),
            variable_definitions: Vec::new(),
            meta: TestMetaInfo::default(),
            result: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.core.set_description(description);
        self
    }

    pub fn meta(mut self, meta: TestMetaInfo) -> Self {
        self.meta = meta;
        self
    }

    pub fn status(mut self, status: TestStatus) -> Self {
        self.meta.status = status;
        self
    }

    /// Declares an initial variable; the value may carry dynamic content and
    /// is resolved when the run starts.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variable_definitions.push((name.into(), value.into()));
        self
    }

    pub fn action(mut self, action: Box<dyn TestAction>) -> Self {
        self.sequence.push(action);
        self
    }

    /// Final actions run after the main sequence, success or failure.
    pub fn final_action(mut self, action: Box<dyn TestAction>) -> Self {
        self.final_actions.push(action);
        self
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// `package.TestName`, the reporting identity of this test.
    pub fn qualified_name(&self) -> String {
        if self.package_name.is_empty() {
            self.core.name().to_string()
        } else {
            format!("{}.{}", self.package_name, self.core.name())
        }
    }

    pub fn meta_info(&self) -> &TestMetaInfo {
        &self.meta
    }

    pub fn variable_definitions(&self) -> &[(String, String)] {
        &self.variable_definitions
    }

    pub(crate) fn initialize_variables(&self, ctx: &mut TestContext) -> Result<(), EngineError> {
        for (name, value) in &self.variable_definitions {
            let resolved = crate::variable::resolve_dynamic_content(value, ctx)?;
            ctx.set_variable(name.clone(), resolved);
        }
        Ok(())
    }

    pub(crate) fn run_final_actions(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        for action in &mut self.final_actions {
            action.execute(ctx)?;
        }
        Ok(())
    }

    pub fn set_result(&mut self, result: TestResult) {
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }
}

impl TestAction for TestCase {
    delegate_action_core!();

    fn execute(&mut self, ctx: &mut TestContext) -> Result<(), EngineError> {
        self.sequence.run_pass(ctx)
    }

    fn as_container(&self) -> Option<&dyn TestActionContainer> {
        Some(self)
    }
}

impl TestActionContainer for TestCase {
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
    use crate::actions::EchoAction;

    #[test]
    fn qualified_name_joins_package_and_name() {
        let test = TestCase::new("OrderFlowTest", "com.acme.orders");
        assert_eq!(test.qualified_name(), "com.acme.orders.OrderFlowTest");
        let test = TestCase::new("Standalone", "");
        assert_eq!(test.qualified_name(), "Standalone");
    }

    #[test]
    fn variable_definitions_resolve_dynamic_content() {
        let test = TestCase::new("T", "pkg")
            .variable("base", "orders")
            .variable("topic", "${base}.incoming");
        let mut ctx = TestContext::default();
        test.initialize_variables(&mut ctx).unwrap();
        assert_eq!(ctx.variable("topic").unwrap(), "orders.incoming");
    }

    #[test]
    fn executes_declared_actions() {
        let mut test = TestCase::new("T", "pkg")
            .action(Box::new(EchoAction::new("one")))
            .action(Box::new(EchoAction::new("two")));
        let mut ctx = TestContext::default();
        test.execute(&mut ctx).unwrap();
        assert_eq!(test.executed(), &[0, 1]);
    }
}
