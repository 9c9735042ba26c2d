//! Test outcome snapshots consumed by the reporter boundary.

use std::time::Duration;

use serde::Serialize;

use crate::errors::EngineError;
use crate::report::failure_stack::FailureStackElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultStatus {
    Success,
    Failure,
    Skipped,
}

/// Outcome of one test run. Created exactly once at completion, immutable
/// thereafter; a rerun produces a fresh result from a fresh test case.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub class_name: String,
    pub status: ResultStatus,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub error_message: Option<String>,
    pub failure_stack: Vec<FailureStackElement>,
    #[serde(skip)]
    pub cause: Option<EngineError>,
}

impl TestResult {
    pub fn success(name: impl Into<String>, class_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            status: ResultStatus::Success,
            duration,
            error_message: None,
            failure_stack: Vec::new(),
            cause: None,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        class_name: impl Into<String>,
        duration: Duration,
        cause: EngineError,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            status: ResultStatus::Failure,
            duration,
            error_message: Some(cause.to_string()),
            failure_stack: Vec::new(),
            cause: Some(cause),
        }
    }

    pub fn skipped(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            status: ResultStatus::Skipped,
            duration: Duration::ZERO,
            error_message: None,
            failure_stack: Vec::new(),
            cause: None,
        }
    }

    pub fn with_failure_stack(mut self, stack: Vec<FailureStackElement>) -> Self {
        self.failure_stack = stack;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == ResultStatus::Failure
    }

    pub fn is_skipped(&self) -> bool {
        self.status == ResultStatus::Skipped
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Aggregate handed to reporters: counts plus restartable iteration.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TestResults {
    results: Vec<TestResult>,
}

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_skipped()).count()
    }

    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter()
    }

    /// Visits every result in recorded order. Finite and restartable: each
    /// call walks the full collection again.
    pub fn for_each<F: FnMut(&TestResult)>(&self, mut f: F) {
        for result in &self.results {
            f(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_partition_by_status() {
        let mut results = TestResults::new();
        results.push(TestResult::success("a", "suite.A", Duration::from_millis(5)));
        results.push(TestResult::failed(
            "b",
            "suite.B",
            Duration::from_millis(7),
            EngineError::validation("boom"),
        ));
        results.push(TestResult::skipped("c", "suite.C"));

        assert_eq!(results.len(), 3);
        assert_eq!(results.success_count(), 1);
        assert_eq!(results.failure_count(), 1);
        assert_eq!(results.skipped_count(), 1);
        assert_eq!(results.total_duration(), Duration::from_millis(12));
    }

    #[test]
    fn for_each_is_restartable() {
        let mut results = TestResults::new();
        results.push(TestResult::success("a", "suite.A", Duration::ZERO));
        let mut first = 0;
        results.for_each(|_| first += 1);
        let mut second = 0;
        results.for_each(|_| second += 1);
        assert_eq!(first, second);
    }

    #[test]
    fn failed_result_keeps_cause_and_message() {
        let result = TestResult::failed(
            "t",
            "suite.T",
            Duration::ZERO,
            EngineError::validation("value mismatch"),
        );
        assert!(result.is_failure());
        assert!(result.error_message.as_deref().unwrap().contains("value mismatch"));
        assert!(result.cause.is_some());
    }
}
