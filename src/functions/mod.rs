//! Function registry for dynamic content expressions.
//!
//! Functions appear in test data as `veritas:function-name(arg, ...)` and are
//! resolved by the dynamic content resolver at validation time. The registry
//! is built once before any test executes and shared read-only afterwards.

use std::collections::HashMap;

use crate::context::TestContext;
use crate::errors::EngineError;

pub mod library;

/// Signature of every registered function: already-resolved string arguments
/// in, replacement text out.
pub type EngineFunction = fn(&[String], &mut TestContext) -> Result<String, EngineError>;

#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, EngineFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, function: EngineFunction) {
        self.functions.insert(name.to_string(), function);
    }

    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn invoke(
        &self,
        name: &str,
        args: &[String],
        ctx: &mut TestContext,
    ) -> Result<String, EngineError> {
        let function = self.functions.get(name).ok_or_else(|| {
            EngineError::config(format!("no function registered under name '{name}'"))
        })?;
        function(args, ctx)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Builds the registry holding the standard function library. The single
/// source of truth for function registration; every entrypoint (engine,
/// tests) must use this rather than assembling a private registry.
pub fn build_default_function_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    library::register_standard_functions(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_is_populated() {
        let registry = build_default_function_registry();
        assert!(!registry.is_empty());
        assert!(registry.has("concat"));
        assert!(registry.has("random-number"));
    }

    #[test]
    fn invoking_an_unknown_function_is_a_config_error() {
        let registry = FunctionRegistry::new();
        let mut ctx = TestContext::default();
        assert!(matches!(
            registry.invoke("nope", &[], &mut ctx),
            Err(EngineError::Config { .. })
        ));
    }
}
