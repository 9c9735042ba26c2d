//! Dynamic content resolution.
//!
//! Expected values, header names, payload templates and path expressions may
//! all carry dynamic content: `${variable}` references and
//! `veritas:function-name(args)` calls. Resolution happens at validation
//! time against the current [`TestContext`]. Variables must resolve or the
//! test fails; functions are optional sugar, so an unknown function name is
//! left verbatim in the output.
//!
//! Resolution is idempotent: a string containing no remaining markers passes
//! through unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TestContext;
use crate::errors::EngineError;

/// Marker prefix for function call expressions.
pub const FUNCTION_PREFIX: &str = "veritas:";

static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"));

/// True when `text` is exactly one `${...}` reference.
pub fn is_variable_expression(text: &str) -> bool {
    text.starts_with("${") && text.ends_with('}') && !text[2..text.len() - 1].contains("${")
}

/// Resolves all dynamic content in `text`: variables first, then functions
/// (whose arguments therefore see already-resolved values).
pub fn resolve_dynamic_content(text: &str, ctx: &mut TestContext) -> Result<String, EngineError> {
    let resolved = replace_variables(text, ctx)?;
    replace_functions(&resolved, ctx)
}

fn replace_variables(text: &str, ctx: &TestContext) -> Result<String, EngineError> {
    if !text.contains("${") {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in VARIABLE_RE.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        let name = caps.get(1).expect("variable name group").as_str();
        out.push_str(&text[last..whole.start()]);
        out.push_str(ctx.variable(name)?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn replace_functions(text: &str, ctx: &mut TestContext) -> Result<String, EngineError> {
    if !text.contains(FUNCTION_PREFIX) {
        return Ok(text.to_string());
    }

    let functions = ctx.functions();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(FUNCTION_PREFIX) {
        out.push_str(&rest[..start]);
        let token = &rest[start..];

        match parse_function_call(token) {
            Some((name, raw_args, consumed)) if functions.has(name) => {
                let args = split_arguments(raw_args);
                out.push_str(&functions.invoke(name, &args, ctx)?);
                rest = &token[consumed..];
            }
            _ => {
                // Unknown function or malformed call: keep the marker verbatim.
                out.push_str(FUNCTION_PREFIX);
                rest = &token[FUNCTION_PREFIX.len()..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Parses `veritas:name(args)` at the start of `token`, returning the
/// function name, the raw argument text and the number of bytes consumed.
fn parse_function_call(token: &str) -> Option<(&str, &str, usize)> {
    let body = &token[FUNCTION_PREFIX.len()..];
    let open = body.find('(')?;
    let name = &body[..open];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }

    // Find the matching close paren, honoring single-quoted argument text.
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in body[open..].char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    let args = &body[open + 1..open + i];
                    let consumed = FUNCTION_PREFIX.len() + open + i + 1;
                    return Some((name, args, consumed));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a raw argument list on top-level commas, trimming whitespace and
/// stripping one level of single quotes.
fn split_arguments(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for c in raw.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                args.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        if c != '\'' {
            current.push(c);
        }
    }
    args.push(current);
    args.into_iter().map(|a| a.trim().to_string()).collect()
}
