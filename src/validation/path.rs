//! Path-expression evaluation against a received message: element validation
//! and variable extraction.
//!
//! Expressions are dispatched on syntax: `$`-rooted expressions go to the
//! JSONPath backend, everything else (including `/`-rooted paths) goes to the
//! XPath backend. Expressions themselves may carry dynamic content.

use std::collections::HashMap;

use indexmap::IndexMap;
use roxmltree::Document;
use tracing::debug;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::matcher::is_matcher_expression;
use crate::message::Message;
use crate::validation::context::PathValidationContext;
use crate::validation::json;
use crate::validation::xpath::{self, XPathHit};

/// Validates each expression's result against its expected value, using the
/// same equality/matcher rule as header validation. A missing node is an
/// [`EngineError::UnknownElement`].
pub fn validate_elements(
    vctx: &PathValidationContext,
    message: &Message,
    ctx: &mut TestContext,
) -> Result<(), EngineError> {
    if vctx.expressions.is_empty() {
        return Ok(());
    }
    debug!("starting path expression validation");

    for (expression, expected) in &vctx.expressions {
        let expression = resolve_expression(expression, ctx)?;
        let actual = evaluate_expression(&expression, message, &vctx.namespace_context)?;
        let expected_value =
            crate::variable::resolve_dynamic_content(expected, ctx)?;

        if is_matcher_expression(&expected_value) {
            let matchers = ctx.matchers();
            matchers.resolve(&expression, &actual, &expected_value, ctx)?;
            continue;
        }
        if expected_value.is_empty() && actual.is_empty() {
            continue;
        }
        if actual != expected_value {
            return Err(EngineError::validation(format!(
                "values not equal for element '{expression}', expected '{expected_value}' but was '{actual}'"
            )));
        }
        debug!(expression = %expression, value = %expected_value, "element value matches");
    }

    debug!("path expression validation finished, all elements match");
    Ok(())
}

/// Evaluates each expression and stores the result under the mapped variable
/// name. A missing node is an [`EngineError::UnknownElement`].
pub fn extract_variables(
    expressions: &IndexMap<String, String>,
    namespaces: &HashMap<String, String>,
    message: &Message,
    ctx: &mut TestContext,
) -> Result<(), EngineError> {
    for (expression, variable) in expressions {
        let expression = resolve_expression(expression, ctx)?;
        let value = evaluate_expression(&expression, message, namespaces)?;
        debug!(expression = %expression, variable = %variable, %value, "extracted variable");
        ctx.set_variable(variable.clone(), value);
    }
    Ok(())
}

fn resolve_expression(expression: &str, ctx: &mut TestContext) -> Result<String, EngineError> {
    crate::variable::resolve_dynamic_content(expression, ctx)
}

fn evaluate_expression(
    expression: &str,
    message: &Message,
    namespaces: &HashMap<String, String>,
) -> Result<String, EngineError> {
    if json::is_json_path_expression(expression) {
        evaluate_json(expression, message)
    } else {
        evaluate_xpath(expression, message, namespaces)
    }
}

fn evaluate_json(expression: &str, message: &Message) -> Result<String, EngineError> {
    let payload = message.payload_text()?;
    let document: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| EngineError::parse(format!("received message is not valid JSON: {e}")))?;
    match json::evaluate(&document, expression) {
        Some(value) => Ok(json::value_to_string(&value)),
        None => Err(EngineError::UnknownElement {
            expression: expression.to_string(),
        }),
    }
}

fn evaluate_xpath(
    expression: &str,
    message: &Message,
    namespaces: &HashMap<String, String>,
) -> Result<String, EngineError> {
    let payload = message.payload_text()?;
    let doc = Document::parse(payload)
        .map_err(|e| EngineError::parse(format!("received message is not well-formed XML: {e}")))?;

    let hits = xpath::evaluate(&doc, expression, namespaces);
    let Some(first) = hits.first() else {
        return Err(EngineError::UnknownElement {
            expression: expression.to_string(),
        });
    };

    match first {
        XPathHit::Element(id) => {
            let node = doc
                .descendants()
                .find(|n| n.id() == *id)
                .expect("hit id originates from this document");
            Ok(node.text().map(str::trim).unwrap_or_default().to_string())
        }
        XPathHit::Attribute(id, name) => {
            let node = doc
                .descendants()
                .find(|n| n.id() == *id)
                .expect("hit id originates from this document");
            Ok(node.attribute(name.as_str()).unwrap_or_default().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = "<Order status=\"open\"><Id>4711</Id><Customer>acme</Customer></Order>";
    const JSON: &str = "{\"order\": {\"id\": 4711, \"status\": \"open\"}}";

    #[test]
    fn xpath_element_validation() {
        let mut ctx = TestContext::default();
        let vctx = PathValidationContext::new()
            .expect("/Order/Id", "4711")
            .expect("/Order/@status", "open");
        validate_elements(&vctx, &Message::plain(XML), &mut ctx).unwrap();
    }

    #[test]
    fn jsonpath_element_validation() {
        let mut ctx = TestContext::default();
        let vctx = PathValidationContext::new()
            .expect("$.order.id", "4711")
            .expect("$.order.status", "@contains(op)@");
        validate_elements(&vctx, &Message::plain(JSON), &mut ctx).unwrap();
    }

    #[test]
    fn missing_node_is_unknown_element() {
        let mut ctx = TestContext::default();
        let vctx = PathValidationContext::new().expect("/Order/Nope", "x");
        let err = validate_elements(&vctx, &Message::plain(XML), &mut ctx).unwrap_err();
        assert!(matches!(err, EngineError::UnknownElement { .. }));

        let vctx = PathValidationContext::new().expect("$.order.nope", "x");
        let err = validate_elements(&vctx, &Message::plain(JSON), &mut ctx).unwrap_err();
        assert!(matches!(err, EngineError::UnknownElement { .. }));
    }

    #[test]
    fn mismatch_names_expression_and_values() {
        let mut ctx = TestContext::default();
        let vctx = PathValidationContext::new().expect("/Order/Id", "9999");
        let err = validate_elements(&vctx, &Message::plain(XML), &mut ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/Order/Id"));
        assert!(message.contains("9999"));
        assert!(message.contains("4711"));
    }

    #[test]
    fn extraction_populates_variables() {
        let mut ctx = TestContext::default();
        let mut xml_expressions = IndexMap::new();
        xml_expressions.insert("/Order/Id".to_string(), "orderId".to_string());
        extract_variables(
            &xml_expressions,
            &HashMap::new(),
            &Message::plain(XML),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(ctx.variable("orderId").unwrap(), "4711");

        let mut json_expressions = IndexMap::new();
        json_expressions.insert("$.order.status".to_string(), "status".to_string());
        extract_variables(
            &json_expressions,
            &HashMap::new(),
            &Message::plain(JSON),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(ctx.variable("status").unwrap(), "open");
    }

    #[test]
    fn expected_side_resolves_dynamic_content() {
        let mut ctx = TestContext::default();
        ctx.set_variable("expectedId", "4711");
        let vctx = PathValidationContext::new().expect("/Order/Id", "${expectedId}");
        validate_elements(&vctx, &Message::plain(XML), &mut ctx).unwrap();
    }
}
