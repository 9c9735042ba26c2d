//! Standard validation matcher library.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::matcher::MatcherRegistry;

pub fn register_standard_matchers(registry: &mut MatcherRegistry) {
    registry.register("ignore", ignore);
    registry.register("equals-ignore-case", equals_ignore_case);
    registry.register("contains", contains);
    registry.register("starts-with", starts_with);
    registry.register("ends-with", ends_with);
    registry.register("matches", matches_pattern);
    registry.register("is-number", is_number);
    registry.register("greater-than", greater_than);
    registry.register("lower-than", lower_than);
    registry.register("empty", empty);
    registry.register("not-empty", not_empty);
}

fn ignore(
    _field: &str,
    _actual: &str,
    _args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    Ok(())
}

fn equals_ignore_case(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let expected = single(field, "equals-ignore-case", args)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(mismatch(field, "equals-ignore-case", expected, actual))
    }
}

fn contains(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let needle = single(field, "contains", args)?;
    if actual.contains(needle) {
        Ok(())
    } else {
        Err(mismatch(field, "contains", needle, actual))
    }
}

fn starts_with(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let prefix = single(field, "starts-with", args)?;
    if actual.starts_with(prefix) {
        Ok(())
    } else {
        Err(mismatch(field, "starts-with", prefix, actual))
    }
}

fn ends_with(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let suffix = single(field, "ends-with", args)?;
    if actual.ends_with(suffix) {
        Ok(())
    } else {
        Err(mismatch(field, "ends-with", suffix, actual))
    }
}

// Compiled patterns are cached; matcher expressions repeat across iterations
// of the same receive action.
static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn matches_pattern(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let pattern = single(field, "matches", args)?;
    let mut cache = PATTERN_CACHE.lock().expect("pattern cache lock");
    if !cache.contains_key(pattern) {
        let compiled = Regex::new(pattern).map_err(|e| {
            EngineError::config(format!("matcher 'matches': invalid pattern '{pattern}': {e}"))
        })?;
        cache.insert(pattern.to_string(), compiled);
    }
    let regex = cache.get(pattern).expect("pattern just inserted");
    if regex.is_match(actual) {
        Ok(())
    } else {
        Err(mismatch(field, "matches", pattern, actual))
    }
}

fn is_number(
    field: &str,
    actual: &str,
    _args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    if actual.trim().parse::<f64>().is_ok() {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "matcher 'is-number' failed for field '{field}': '{actual}' is not numeric"
        )))
    }
}

fn greater_than(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let (actual_num, bound) = numeric_pair(field, "greater-than", actual, args)?;
    if actual_num > bound {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "matcher 'greater-than' failed for field '{field}': {actual_num} is not greater than {bound}"
        )))
    }
}

fn lower_than(
    field: &str,
    actual: &str,
    args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    let (actual_num, bound) = numeric_pair(field, "lower-than", actual, args)?;
    if actual_num < bound {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "matcher 'lower-than' failed for field '{field}': {actual_num} is not lower than {bound}"
        )))
    }
}

fn empty(
    field: &str,
    actual: &str,
    _args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    if actual.trim().is_empty() {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "matcher 'empty' failed for field '{field}': value '{actual}' is not empty"
        )))
    }
}

fn not_empty(
    field: &str,
    actual: &str,
    _args: &[String],
    _ctx: &mut TestContext,
) -> Result<(), EngineError> {
    if actual.trim().is_empty() {
        Err(EngineError::validation(format!(
            "matcher 'not-empty' failed for field '{field}': value is empty"
        )))
    } else {
        Ok(())
    }
}

fn single<'a>(field: &str, matcher: &str, args: &'a [String]) -> Result<&'a str, EngineError> {
    match args {
        [only] => Ok(only),
        _ => Err(EngineError::config(format!(
            "matcher '{matcher}' on field '{field}' expects exactly one argument, got {}",
            args.len()
        ))),
    }
}

fn numeric_pair(
    field: &str,
    matcher: &str,
    actual: &str,
    args: &[String],
) -> Result<(f64, f64), EngineError> {
    let raw_bound = single(field, matcher, args)?;
    let bound: f64 = raw_bound.trim().parse().map_err(|_| {
        EngineError::config(format!(
            "matcher '{matcher}': bound '{raw_bound}' is not numeric"
        ))
    })?;
    let actual_num: f64 = actual.trim().parse().map_err(|_| {
        EngineError::validation(format!(
            "matcher '{matcher}' failed for field '{field}': '{actual}' is not numeric"
        ))
    })?;
    Ok((actual_num, bound))
}

fn mismatch(field: &str, matcher: &str, expected: &str, actual: &str) -> EngineError {
    EngineError::validation(format!(
        "matcher '{matcher}' failed for field '{field}': expected '{expected}' but was '{actual}'"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::build_default_matcher_registry;

    fn resolve(actual: &str, expr: &str) -> Result<(), EngineError> {
        let registry = build_default_matcher_registry();
        let mut ctx = TestContext::default();
        registry.resolve("field", actual, expr, &mut ctx)
    }

    #[test]
    fn ignore_accepts_anything() {
        resolve("whatever", "@ignore@").unwrap();
    }

    #[test]
    fn string_matchers() {
        resolve("HELLO", "@equals-ignore-case(hello)@").unwrap();
        resolve("abcdef", "@contains(cde)@").unwrap();
        resolve("abcdef", "@starts-with(abc)@").unwrap();
        resolve("abcdef", "@ends-with(def)@").unwrap();
        assert!(resolve("abcdef", "@contains(xyz)@").is_err());
    }

    #[test]
    fn regex_matcher() {
        resolve("ORD-12345", "@matches(^ORD-\\d+$)@").unwrap();
        assert!(resolve("12345", "@matches(^ORD-\\d+$)@").is_err());
        assert!(matches!(
            resolve("x", "@matches([unclosed)@"),
            Err(EngineError::Config { .. })
        ));
    }

    #[test]
    fn numeric_matchers() {
        resolve("17", "@is-number@").unwrap();
        resolve("17.5", "@greater-than(17)@").unwrap();
        resolve("16", "@lower-than(17)@").unwrap();
        assert!(resolve("17", "@greater-than(17)@").is_err());
        assert!(resolve("abc", "@is-number@").is_err());
    }

    #[test]
    fn emptiness_matchers() {
        resolve("", "@empty@").unwrap();
        resolve("value", "@not-empty@").unwrap();
        assert!(resolve("value", "@empty@").is_err());
    }
}
