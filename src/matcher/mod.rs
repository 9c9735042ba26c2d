//! Validation matcher engine.
//!
//! An expected value wrapped in `@matcher-name(args)@` is dispatched to a
//! named matcher instead of the literal equality check the caller would
//! otherwise perform. `@ignore@` is the degenerate matcher that accepts
//! anything. An unknown matcher name is a configuration error, not a
//! validation failure, because broken test setup must not masquerade as a content
//! mismatch.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::variable::resolve_dynamic_content;

pub mod library;

/// Signature of a matcher: the field name (for failure messages), the actual
/// value under test and the already-resolved matcher arguments.
pub type ValidationMatcher =
    fn(field: &str, actual: &str, args: &[String], ctx: &mut TestContext) -> Result<(), EngineError>;

static MATCHER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^@([A-Za-z][A-Za-z0-9_-]*)(?:\((.*)\))?@$").expect("matcher pattern is valid")
});

/// True when `expected` uses the matcher expression syntax.
pub fn is_matcher_expression(expected: &str) -> bool {
    MATCHER_RE.is_match(expected.trim())
}

#[derive(Default)]
pub struct MatcherRegistry {
    matchers: HashMap<String, ValidationMatcher>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, matcher: ValidationMatcher) {
        self.matchers.insert(name.to_string(), matcher);
    }

    pub fn has(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Resolves a matcher expression against an actual value.
    ///
    /// `field` only feeds failure messages. Matcher arguments pass through
    /// dynamic content resolution, so `@equals-ignore-case(${expected})@`
    /// works.
    pub fn resolve(
        &self,
        field: &str,
        actual: &str,
        expected_expr: &str,
        ctx: &mut TestContext,
    ) -> Result<(), EngineError> {
        let caps = MATCHER_RE.captures(expected_expr.trim()).ok_or_else(|| {
            EngineError::config(format!(
                "'{expected_expr}' is not a valid matcher expression"
            ))
        })?;
        let name = caps.get(1).expect("matcher name group").as_str();
        let matcher = self.matchers.get(name).ok_or_else(|| {
            EngineError::config(format!("no validation matcher registered under name '{name}'"))
        })?;

        let raw_args = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let mut args = Vec::new();
        for arg in split_matcher_arguments(raw_args) {
            args.push(resolve_dynamic_content(&arg, ctx)?);
        }
        matcher(field, actual, &args, ctx)
    }
}

fn split_matcher_arguments(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for c in raw.chars() {
        match c {
            '\'' => {
                in_quote = !in_quote;
                continue;
            }
            ',' if !in_quote => {
                args.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    args.push(current);
    args.into_iter().map(|a| a.trim().to_string()).collect()
}

/// Builds the registry holding the standard matcher library; the single
/// source of truth for matcher registration.
pub fn build_default_matcher_registry() -> MatcherRegistry {
    let mut registry = MatcherRegistry::new();
    library::register_standard_matchers(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_detection() {
        assert!(is_matcher_expression("@ignore@"));
        assert!(is_matcher_expression("@contains(foo)@"));
        assert!(is_matcher_expression("@greater-than(5)@"));
        assert!(!is_matcher_expression("plain value"));
        assert!(!is_matcher_expression("@unterminated"));
    }

    #[test]
    fn unknown_matcher_is_a_config_error() {
        let registry = build_default_matcher_registry();
        let mut ctx = TestContext::default();
        assert!(matches!(
            registry.resolve("field", "x", "@no-such-matcher(1)@", &mut ctx),
            Err(EngineError::Config { .. })
        ));
    }

    #[test]
    fn matcher_arguments_resolve_variables() {
        let registry = build_default_matcher_registry();
        let mut ctx = TestContext::default();
        ctx.set_variable("needle", "rde");
        registry
            .resolve("field", "orders", "@contains(${needle})@", &mut ctx)
            .unwrap();
    }
}
