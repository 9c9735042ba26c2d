//! Header validation: every expected header must be present in the received
//! message with an equal (or matcher-satisfying) value.
//!
//! The expected map is a subset requirement: extra received headers are
//! fine. Checks run in the declaration order of the expected map and abort on
//! the first mismatch.

use indexmap::IndexMap;
use tracing::debug;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::matcher::is_matcher_expression;
use crate::message::{HeaderValue, RESERVED_HEADER_PREFIX};
use crate::variable::resolve_dynamic_content;

pub fn validate_headers(
    expected: &IndexMap<String, HeaderValue>,
    received: &IndexMap<String, HeaderValue>,
    ctx: &mut TestContext,
) -> Result<(), EngineError> {
    if expected.is_empty() {
        return Ok(());
    }
    debug!("starting message header validation");

    for (name, value) in expected {
        if name.starts_with(RESERVED_HEADER_PREFIX) {
            continue;
        }

        // Both the header name and the expected value may carry dynamic
        // content.
        let header_name = resolve_dynamic_content(name, ctx)?;
        let expected_value = resolve_dynamic_content(&value.to_string(), ctx)?;

        let actual_value = match received.get(&header_name) {
            Some(actual) => actual.to_string(),
            None => {
                return Err(EngineError::validation(format!(
                    "header element '{header_name}' is missing"
                )));
            }
        };

        if is_matcher_expression(&expected_value) {
            let matchers = ctx.matchers();
            matchers.resolve(&header_name, &actual_value, &expected_value, ctx)?;
            debug!(header = %header_name, matcher = %expected_value, "header matcher satisfied");
            continue;
        }

        // An empty expected value and an empty received value are
        // equivalent; any other difference fails.
        if expected_value.is_empty() && actual_value.is_empty() {
            continue;
        }
        if actual_value != expected_value {
            return Err(EngineError::validation(format!(
                "values not equal for header element '{header_name}', expected '{expected_value}' but was '{actual_value}'"
            )));
        }
        debug!(header = %header_name, value = %expected_value, "header value matches");
    }

    debug!("message header validation finished, all headers match");
    Ok(())
}
