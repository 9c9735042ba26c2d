//! Minimal JSONPath-subset evaluator over `serde_json::Value`.
//!
//! Supported forms: `$.store.book`, `$['store']['book']`, array indices
//! `$.items[0]`, and combinations thereof. An expression starting with `$`
//! is dispatched here; everything else goes to the XPath backend.

use serde_json::Value;

/// True when `expression` should be evaluated by this backend.
pub fn is_json_path_expression(expression: &str) -> bool {
    expression.starts_with('$')
}

#[derive(Debug, PartialEq)]
enum Token {
    Key(String),
    Index(usize),
}

fn tokenize(expression: &str) -> Option<Vec<Token>> {
    let rest = expression.strip_prefix('$')?;
    let mut tokens = Vec::new();
    let mut chars = rest.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                let mut key = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '.' || next == '[' {
                        break;
                    }
                    key.push(next);
                    chars.next();
                }
                if key.is_empty() {
                    return None;
                }
                tokens.push(Token::Key(key));
            }
            '[' => {
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(ch) => inner.push(ch),
                        None => return None,
                    }
                }
                if let Some(quoted) = inner
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                {
                    tokens.push(Token::Key(quoted.to_string()));
                } else {
                    tokens.push(Token::Index(inner.trim().parse().ok()?));
                }
            }
            _ => return None,
        }
    }
    Some(tokens)
}

/// Evaluates the expression against a parsed JSON document. `None` means the
/// path resolved to nothing (or the expression is outside the subset).
pub fn evaluate(document: &Value, expression: &str) -> Option<Value> {
    let tokens = tokenize(expression)?;
    let mut current = document;
    for token in &tokens {
        current = match token {
            Token::Key(key) => current.get(key)?,
            Token::Index(index) => current.get(index)?,
        };
    }
    Some(current.clone())
}

/// Renders a JSON value the way validation compares it: strings bare, other
/// scalars and structures in their canonical JSON form.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "order": {
                "id": 4711,
                "status": "open",
                "items": [
                    {"name": "book", "price": 12.5},
                    {"name": "pen", "price": 1.5}
                ]
            }
        })
    }

    #[test]
    fn dot_steps() {
        assert_eq!(
            evaluate(&doc(), "$.order.status"),
            Some(json!("open"))
        );
    }

    #[test]
    fn bracket_keys_and_indices() {
        assert_eq!(
            evaluate(&doc(), "$['order']['items'][1].name"),
            Some(json!("pen"))
        );
        assert_eq!(
            evaluate(&doc(), "$.order.items[0].price"),
            Some(json!(12.5))
        );
    }

    #[test]
    fn missing_path_resolves_to_none() {
        assert_eq!(evaluate(&doc(), "$.order.missing"), None);
        assert_eq!(evaluate(&doc(), "$.order.items[9]"), None);
    }

    #[test]
    fn strings_render_bare_and_numbers_canonically() {
        assert_eq!(value_to_string(&json!("open")), "open");
        assert_eq!(value_to_string(&json!(4711)), "4711");
        assert_eq!(value_to_string(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn expression_detection() {
        assert!(is_json_path_expression("$.order.id"));
        assert!(!is_json_path_expression("/order/id"));
    }
}
