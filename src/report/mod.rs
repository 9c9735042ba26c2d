//! Reporting boundary: listeners observe test lifecycle events, reporters
//! consume finished result collections. Both are implemented outside the
//! core; the engine only drives the interfaces.

use crate::errors::EngineError;
use crate::result::TestResults;
use crate::testcase::TestCase;

pub mod failure_stack;

pub use failure_stack::{failure_stack, FailureStackElement};

/// Observes one test case's lifecycle. On failure the failure stack has
/// already been attached to the test result when
/// [`on_test_failure`](TestListener::on_test_failure) fires.
pub trait TestListener {
    fn on_test_start(&mut self, _test: &TestCase) {}

    fn on_test_success(&mut self, _test: &TestCase) {}

    fn on_test_failure(&mut self, _test: &TestCase, _cause: &EngineError) {}

    fn on_test_skipped(&mut self, _test: &TestCase) {}
}

/// Renders a finished result collection. Pure formatting; the engine never
/// calls this itself.
pub trait TestReporter {
    fn generate_report(&mut self, results: &TestResults);
}
