//! Veritas is an embeddable integration-test execution engine: it runs
//! ordered, nestable test actions against live messaging endpoints and
//! verifies outcomes by structurally comparing each received message against
//! an expected control message.
//!
//! The crate centers on three pieces:
//!
//! - the test action/container execution model with result tracking and
//!   nested-container semantics ([`actions`], [`container`], [`runner`]);
//! - control-message validation: header comparison, structural XML tree diff
//!   with ignore rules and namespace checks, path-expression extraction and
//!   validation, dynamic content and validation matchers ([`validation`],
//!   [`variable`], [`matcher`]);
//! - failure-stack reconstruction mapping a runtime failure back to the
//!   originating action's source line range ([`report`]).
//!
//! Transports, report formats and configuration loading live outside the
//! crate behind the [`endpoint`] and [`report`] trait boundaries.

pub use crate::context::TestContext;
pub use crate::errors::EngineError;
pub use crate::message::{HeaderValue, Message, Payload};
pub use crate::result::{ResultStatus, TestResult, TestResults};
pub use crate::testcase::{TestCase, TestMetaInfo, TestStatus};

pub mod actions;
pub mod container;
pub mod context;
pub mod endpoint;
pub mod errors;
pub mod functions;
pub mod matcher;
pub mod message;
pub mod report;
pub mod result;
pub mod runner;
pub mod testcase;
pub mod validation;
pub mod variable;
