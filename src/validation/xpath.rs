//! Minimal XPath-subset evaluator over the document model.
//!
//! Supported forms cover what ignore addresses and path expectations use in
//! practice:
//!
//! - absolute location paths: `/Orders/Order/Id`
//! - a leading descendant step: `//Id`, `//Order/Id`
//! - wildcard element steps: `/Orders/*/Id`
//! - 1-based positional predicates: `/Orders/Order[2]/Id`
//! - a trailing attribute step: `/Orders/Order/@status`
//! - namespace prefixes on steps, resolved against the caller's prefix
//!   bindings: `/ns:Orders/ns:Order`
//!
//! Anything starting with `/` is treated as an XPath expression; ambiguous
//! inputs fall to XPath rather than the JSONPath backend.

use std::collections::HashMap;

use roxmltree::{Document, Node, NodeId};

/// A node addressed by an XPath expression: an element, or an attribute
/// identified by its owning element and local name.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathHit {
    Element(NodeId),
    Attribute(NodeId, String),
}

/// True when `expression` should be evaluated by this backend.
pub fn is_xpath_expression(expression: &str) -> bool {
    expression.starts_with('/')
}

#[derive(Debug)]
struct Step {
    prefix: Option<String>,
    name: String,
    position: Option<usize>,
}

enum Parsed {
    Steps(Vec<Step>, Option<String>),
    Invalid,
}

fn parse_expression(expression: &str) -> (bool, Parsed) {
    let (descendant, rest) = match expression.strip_prefix("//") {
        Some(rest) => (true, rest),
        None => match expression.strip_prefix('/') {
            Some(rest) => (false, rest),
            None => return (false, Parsed::Invalid),
        },
    };

    let mut steps = Vec::new();
    let mut attribute = None;
    let segments: Vec<&str> = rest.split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return (descendant, Parsed::Invalid);
        }
        if let Some(attr) = segment.strip_prefix('@') {
            // Attribute steps are only meaningful in final position.
            if i != segments.len() - 1 || attr.is_empty() {
                return (descendant, Parsed::Invalid);
            }
            attribute = Some(attr.to_string());
            continue;
        }

        let (name_part, position) = match segment.find('[') {
            Some(open) => {
                let Some(close) = segment.rfind(']') else {
                    return (descendant, Parsed::Invalid);
                };
                let Ok(position) = segment[open + 1..close].parse::<usize>() else {
                    return (descendant, Parsed::Invalid);
                };
                if position == 0 {
                    return (descendant, Parsed::Invalid);
                }
                (&segment[..open], Some(position))
            }
            None => (&segment[..], None),
        };

        let (prefix, name) = match name_part.split_once(':') {
            Some((prefix, name)) => (Some(prefix.to_string()), name.to_string()),
            None => (None, name_part.to_string()),
        };
        steps.push(Step {
            prefix,
            name,
            position,
        });
    }

    (descendant, Parsed::Steps(steps, attribute))
}

/// Evaluates the expression, returning every matching node. An invalid or
/// unsupported expression simply yields no hits; ignore addresses are
/// best-effort lookups, not a strict query language.
pub fn evaluate(
    doc: &Document<'_>,
    expression: &str,
    namespaces: &HashMap<String, String>,
) -> Vec<XPathHit> {
    let (descendant, parsed) = parse_expression(expression);
    let Parsed::Steps(steps, attribute) = parsed else {
        return Vec::new();
    };
    let Some(first) = steps.first() else {
        // Expression addressed only an attribute of the root, e.g. `/@id`.
        return match &attribute {
            Some(attr) => attribute_hits(vec![doc.root_element()], attr),
            None => Vec::new(),
        };
    };

    // Seed candidates from the first step.
    let mut current: Vec<Node<'_, '_>> = if descendant {
        doc.descendants()
            .filter(|n| n.is_element() && step_matches(*n, first, namespaces))
            .collect()
    } else {
        let root = doc.root_element();
        if step_matches(root, first, namespaces) {
            vec![root]
        } else {
            Vec::new()
        }
    };
    current = apply_position(current, first);

    for step in &steps[1..] {
        let mut next = Vec::new();
        for node in &current {
            next.extend(
                node.children()
                    .filter(|c| c.is_element() && step_matches(*c, step, namespaces)),
            );
        }
        current = apply_position(next, step);
    }

    match &attribute {
        Some(attr) => attribute_hits(current, attr),
        None => current
            .into_iter()
            .map(|n| XPathHit::Element(n.id()))
            .collect(),
    }
}

fn attribute_hits(nodes: Vec<Node<'_, '_>>, attr: &str) -> Vec<XPathHit> {
    nodes
        .into_iter()
        .filter(|n| n.attributes().any(|a| a.name() == attr))
        .map(|n| XPathHit::Attribute(n.id(), attr.to_string()))
        .collect()
}

fn step_matches(node: Node<'_, '_>, step: &Step, namespaces: &HashMap<String, String>) -> bool {
    if step.name != "*" && node.tag_name().name() != step.name {
        return false;
    }
    match &step.prefix {
        None => true,
        Some(prefix) => match namespaces.get(prefix) {
            Some(uri) => node.tag_name().namespace() == Some(uri.as_str()),
            // Unbound prefix: fall back to matching the local name only.
            None => true,
        },
    }
}

fn apply_position<'a, 'input>(
    nodes: Vec<Node<'a, 'input>>,
    step: &Step,
) -> Vec<Node<'a, 'input>> {
    match step.position {
        // XPath positions are 1-based and apply per sibling group; this
        // subset applies them over the collected candidate list, which is
        // equivalent for the single-parent chains the engine produces.
        Some(position) => nodes.into_iter().skip(position - 1).take(1).collect(),
        None => nodes,
    }
}
