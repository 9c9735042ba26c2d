//! Run-scoped mutable state shared by every action of one executing test.
//!
//! A `TestContext` is owned exclusively by the test case currently running.
//! Executing two test cases concurrently requires two independent contexts;
//! sharing one across threads corrupts variable state and the message trace.
//! The registries it carries (functions, matchers, validators) are built once
//! at startup and shared read-only via `Arc`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::debug;

use crate::errors::EngineError;
use crate::functions::{build_default_function_registry, FunctionRegistry};
use crate::matcher::{build_default_matcher_registry, MatcherRegistry};
use crate::message::Message;
use crate::validation::{build_default_validator_registry, ValidatorRegistry};

/// Resolves named external objects (endpoints, schema repositories, anything
/// the surrounding harness wires up before the test runs).
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    fn is_resolvable(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Map-backed resolver. Bind everything before execution starts; the resolver
/// is read-only afterwards.
#[derive(Default)]
pub struct SimpleReferenceResolver {
    objects: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl SimpleReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, object: Arc<dyn Any + Send + Sync>) {
        self.objects.insert(name.into(), object);
    }
}

impl ReferenceResolver for SimpleReferenceResolver {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.objects.get(name).cloned()
    }
}

/// Direction of a traced message exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    Outbound,
    Inbound,
}

/// One entry of the per-run message trace.
#[derive(Debug, Clone)]
pub struct TracedMessage {
    pub direction: TraceDirection,
    pub endpoint: String,
    pub message: Message,
}

/// Mutable state for one test run.
pub struct TestContext {
    variables: HashMap<String, String>,
    functions: Arc<FunctionRegistry>,
    matchers: Arc<MatcherRegistry>,
    validators: Arc<ValidatorRegistry>,
    references: Arc<dyn ReferenceResolver>,
    rng: Xoshiro256StarStar,
    test_name: Option<String>,
    message_trace: Vec<TracedMessage>,
}

impl TestContext {
    pub fn new(
        functions: Arc<FunctionRegistry>,
        matchers: Arc<MatcherRegistry>,
        validators: Arc<ValidatorRegistry>,
        references: Arc<dyn ReferenceResolver>,
    ) -> Self {
        Self {
            variables: HashMap::new(),
            functions,
            matchers,
            validators,
            references,
            rng: Xoshiro256StarStar::from_entropy(),
            test_name: None,
            message_trace: Vec::new(),
        }
    }

    /// Context with a fixed PRNG seed, for reproducible random-content
    /// functions in tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let mut ctx = Self::default();
        ctx.rng = Xoshiro256StarStar::from_seed(seed);
        ctx
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        debug!(variable = %name, %value, "setting test variable");
        self.variables.insert(name, value);
    }

    /// Looks up a variable, failing with `UnresolvedVariable` when absent.
    pub fn variable(&self, name: &str) -> Result<&str, EngineError> {
        self.variables
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| EngineError::UnresolvedVariable {
                name: name.to_string(),
            })
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub fn functions(&self) -> Arc<FunctionRegistry> {
        Arc::clone(&self.functions)
    }

    pub fn matchers(&self) -> Arc<MatcherRegistry> {
        Arc::clone(&self.matchers)
    }

    pub fn validators(&self) -> Arc<ValidatorRegistry> {
        Arc::clone(&self.validators)
    }

    pub fn references(&self) -> Arc<dyn ReferenceResolver> {
        Arc::clone(&self.references)
    }

    pub fn rng(&mut self) -> &mut Xoshiro256StarStar {
        &mut self.rng
    }

    pub fn set_test_name(&mut self, name: impl Into<String>) {
        self.test_name = Some(name.into());
    }

    pub fn test_name(&self) -> Option<&str> {
        self.test_name.as_deref()
    }

    /// Records an exchanged message for diagnostic purposes.
    pub fn trace_message(&mut self, direction: TraceDirection, endpoint: &str, message: &Message) {
        self.message_trace.push(TracedMessage {
            direction,
            endpoint: endpoint.to_string(),
            message: message.clone(),
        });
    }

    pub fn message_trace(&self) -> &[TracedMessage] {
        &self.message_trace
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new(
            Arc::new(build_default_function_registry()),
            Arc::new(build_default_matcher_registry()),
            Arc::new(build_default_validator_registry()),
            Arc::new(SimpleReferenceResolver::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_variable_is_an_error() {
        let ctx = TestContext::default();
        assert!(matches!(
            ctx.variable("missing"),
            Err(EngineError::UnresolvedVariable { .. })
        ));
    }

    #[test]
    fn variables_round_trip() {
        let mut ctx = TestContext::default();
        ctx.set_variable("operation", "getOrders");
        assert_eq!(ctx.variable("operation").unwrap(), "getOrders");
    }

    #[test]
    fn reference_resolver_returns_bound_objects() {
        let mut resolver = SimpleReferenceResolver::new();
        resolver.bind("answer", Arc::new(42_u32));
        let resolver: Arc<dyn ReferenceResolver> = Arc::new(resolver);
        let value = resolver.resolve("answer").unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 42);
        assert!(!resolver.is_resolvable("other"));
    }
}
