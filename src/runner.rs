//! Test execution engine: drives one test case from listeners-before to the
//! final, single `TestResult`.
//!
//! Execution is single-threaded and depth-first. On failure the failure
//! stack is reconstructed *before* listeners observe the failure, so a
//! listener can read it off the result. Rerunning requires a fresh test
//! case; exactly one result is produced per run.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::actions::TestAction;
use crate::context::TestContext;
use crate::errors::EngineError;
use crate::report::{failure_stack, TestListener};
use crate::result::TestResult;
use crate::testcase::{TestCase, TestStatus};

#[derive(Default)]
pub struct TestEngine {
    listeners: Vec<Box<dyn TestListener>>,
    /// Root of the serialized test definitions, for failure-stack
    /// reconstruction. Without it the stack stays empty.
    source_root: Option<PathBuf>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn TestListener>) {
        self.listeners.push(listener);
    }

    /// Runs one test case to completion and returns its result. The result
    /// is also recorded on the test case for listeners and reporters that
    /// hold onto it.
    pub fn run(&mut self, test: &mut TestCase, ctx: &mut TestContext) -> TestResult {
        let name = test.name().to_string();
        let class_name = test.qualified_name();
        ctx.set_test_name(class_name.clone());
        info!(test = %class_name, "starting test");

        for listener in &mut self.listeners {
            listener.on_test_start(test);
        }

        if matches!(
            test.meta_info().status,
            TestStatus::Draft | TestStatus::Disabled
        ) {
            info!(test = %class_name, "test is not executable, skipping");
            let result = TestResult::skipped(name, class_name);
            for listener in &mut self.listeners {
                listener.on_test_skipped(test);
            }
            test.set_result(result.clone());
            return result;
        }

        let started = Instant::now();
        let outcome = self.execute_test(test, ctx);
        let duration = started.elapsed();

        let result = match outcome {
            Ok(()) => {
                info!(test = %class_name, ?duration, "test finished successfully");
                let result = TestResult::success(name, class_name, duration);
                for listener in &mut self.listeners {
                    listener.on_test_success(test);
                }
                result
            }
            Err(cause) => {
                info!(test = %class_name, error = %cause, "test failed");
                let stack = match &self.source_root {
                    Some(root) => failure_stack(test, root),
                    None => Vec::new(),
                };
                let result =
                    TestResult::failed(name, class_name, duration, cause.clone())
                        .with_failure_stack(stack);
                // Listeners see the failure only after the stack has been
                // attached to the recorded result.
                test.set_result(result.clone());
                for listener in &mut self.listeners {
                    listener.on_test_failure(test, &cause);
                }
                return result;
            }
        };

        test.set_result(result.clone());
        result
    }

    fn execute_test(
        &mut self,
        test: &mut TestCase,
        ctx: &mut TestContext,
    ) -> Result<(), EngineError> {
        test.initialize_variables(ctx)?;
        let main_outcome = test.execute(ctx);

        // Final actions always run; a failure there only becomes the cause
        // when the main sequence succeeded.
        let final_outcome = test.run_final_actions(ctx);
        if let Err(final_error) = &final_outcome {
            if main_outcome.is_err() {
                warn!(error = %final_error, "final actions failed after test failure, keeping primary cause");
            }
        }
        debug!("test execution finished");
        main_outcome.and(final_outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{EchoAction, FailAction};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingListener {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl TestListener for RecordingListener {
        fn on_test_start(&mut self, test: &TestCase) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", test.name()));
        }

        fn on_test_success(&mut self, test: &TestCase) {
            self.events
                .lock()
                .unwrap()
                .push(format!("success:{}", test.name()));
        }

        fn on_test_failure(&mut self, test: &TestCase, cause: &EngineError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failure:{}:{}", test.name(), cause));
        }

        fn on_test_skipped(&mut self, test: &TestCase) {
            self.events
                .lock()
                .unwrap()
                .push(format!("skipped:{}", test.name()));
        }
    }

    #[test]
    fn successful_run_notifies_start_then_success() {
        let listener = RecordingListener::default();
        let events = Arc::clone(&listener.events);
        let mut engine = TestEngine::new();
        engine.add_listener(Box::new(listener));

        let mut test = TestCase::new("Ok", "pkg").action(Box::new(EchoAction::new("fine")));
        let mut ctx = TestContext::default();
        let result = engine.run(&mut test, &mut ctx);

        assert!(result.is_success());
        let events = events.lock().unwrap();
        assert_eq!(events.as_slice(), ["start:Ok", "success:Ok"]);
    }

    #[test]
    fn failing_run_reports_cause() {
        let mut engine = TestEngine::new();
        let mut test = TestCase::new("Boom", "pkg").action(Box::new(FailAction::new("expected")));
        let mut ctx = TestContext::default();
        let result = engine.run(&mut test, &mut ctx);

        assert!(result.is_failure());
        assert!(result.error_message.as_deref().unwrap().contains("expected"));
        assert!(test.result().unwrap().is_failure());
    }

    #[test]
    fn draft_test_is_skipped_without_running_actions() {
        let listener = RecordingListener::default();
        let events = Arc::clone(&listener.events);
        let mut engine = TestEngine::new();
        engine.add_listener(Box::new(listener));

        let mut test = TestCase::new("Draft", "pkg")
            .status(TestStatus::Draft)
            .action(Box::new(FailAction::new("never runs")));
        let mut ctx = TestContext::default();
        let result = engine.run(&mut test, &mut ctx);

        assert!(result.is_skipped());
        let events = events.lock().unwrap();
        assert_eq!(events.as_slice(), ["start:Draft", "skipped:Draft"]);
    }

    #[test]
    fn final_actions_run_after_failure_without_masking_cause() {
        let mut engine = TestEngine::new();
        let mut test = TestCase::new("Finally", "pkg")
            .action(Box::new(FailAction::new("primary cause")))
            .final_action(Box::new(FailAction::new("cleanup failed too")));
        let mut ctx = TestContext::default();
        let result = engine.run(&mut test, &mut ctx);

        assert!(result.is_failure());
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("primary cause"));
    }

    #[test]
    fn final_action_failure_becomes_cause_when_main_succeeds() {
        let mut engine = TestEngine::new();
        let mut test = TestCase::new("CleanupFails", "pkg")
            .action(Box::new(EchoAction::new("fine")))
            .final_action(Box::new(FailAction::new("cleanup broke")));
        let mut ctx = TestContext::default();
        let result = engine.run(&mut test, &mut ctx);

        assert!(result.is_failure());
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("cleanup broke"));
    }
}
