//! Structural XML comparison between a received document and its control
//! document.
//!
//! The walk is recursive over node kind: element names and namespaces are
//! always compared; an ignored element keeps its structural checks (attribute
//! count, child count) but skips value comparison and content recursion;
//! text and CDATA compare trimmed; comments and processing instructions are
//! accepted without comparison. The first mismatch aborts the walk: one
//! unambiguous failure per run instead of an aggregated diff.
//!
//! Ignore addresses support three schemes, tried in order with the first
//! match winning: an exact dot-path (`Root.Child.Leaf`), a short name
//! resolved to the first node in document order (ambiguous short names stay
//! first-match; existing suites depend on that tie-break), and an
//! XPath-subset expression matched by node identity.

use roxmltree::{Document, Node, NodeId, NodeType};
use tracing::debug;

use crate::errors::EngineError;
use crate::validation::context::XmlValidationContext;
use crate::validation::xpath::{self, XPathHit};

/// Compares a received XML payload against its control payload.
pub fn validate_xml_payload(
    received: &str,
    control: &str,
    vctx: &XmlValidationContext,
) -> Result<(), EngineError> {
    let received_doc = parse(received, "received")?;
    let control_doc = parse(control, "control")?;

    if vctx.schema_validation {
        require_namespaced_root(&received_doc)?;
    }
    if !vctx.expected_namespaces.is_empty() {
        validate_namespaces_of(&received_doc, vctx)?;
    }

    debug!("starting XML tree comparison");
    let ignored = resolve_ignored_nodes(&received_doc, vctx);
    validate_node(
        received_doc.root_element(),
        control_doc.root_element(),
        &ignored,
        vctx,
    )?;
    debug!("XML tree comparison finished, all values match");
    Ok(())
}

/// Validates the namespace declarations on the root element of a received
/// payload: declaration count must match, then every expected prefix must be
/// bound to the expected URI.
pub fn validate_namespaces(
    received: &str,
    vctx: &XmlValidationContext,
) -> Result<(), EngineError> {
    let received_doc = parse(received, "received")?;
    validate_namespaces_of(&received_doc, vctx)
}

fn validate_namespaces_of(
    received_doc: &Document<'_>,
    vctx: &XmlValidationContext,
) -> Result<(), EngineError> {
    let root = received_doc.root_element();
    let found: Vec<(String, String)> = root
        .namespaces()
        .map(|ns| {
            (
                ns.name().unwrap_or_default().to_string(),
                ns.uri().to_string(),
            )
        })
        .collect();

    if found.len() != vctx.expected_namespaces.len() {
        return Err(EngineError::validation(format!(
            "number of namespace declarations not equal on root element '{}': found {} expected {}",
            root.tag_name().name(),
            found.len(),
            vctx.expected_namespaces.len()
        )));
    }

    for (prefix, expected_uri) in &vctx.expected_namespaces {
        match found.iter().find(|(p, _)| p == prefix) {
            Some((_, uri)) if uri == expected_uri => {
                debug!(prefix = %prefix, uri = %uri, "namespace declaration matches");
            }
            Some((_, uri)) => {
                return Err(EngineError::validation(format!(
                    "namespace '{prefix}' values not equal: found '{uri}' expected '{expected_uri}'"
                )));
            }
            None => {
                return Err(EngineError::validation(format!(
                    "missing namespace declaration '{prefix}' ({expected_uri}) on root element"
                )));
            }
        }
    }
    Ok(())
}

fn parse<'a>(payload: &'a str, role: &str) -> Result<Document<'a>, EngineError> {
    Document::parse(payload)
        .map_err(|e| EngineError::parse(format!("{role} message is not well-formed XML: {e}")))
}

fn require_namespaced_root(doc: &Document<'_>) -> Result<(), EngineError> {
    let root = doc.root_element();
    if root.tag_name().namespace().is_none() {
        return Err(EngineError::validation(format!(
            "schema validation enabled but root element '{}' declares no namespace",
            root.tag_name().name()
        )));
    }
    Ok(())
}

/// Nodes and attributes exempt from value comparison, resolved once per
/// payload before the walk.
struct IgnoredNodes {
    elements: Vec<NodeId>,
    /// (owning element, attribute local name)
    attributes: Vec<(NodeId, String)>,
}

impl IgnoredNodes {
    fn element(&self, id: NodeId) -> bool {
        self.elements.contains(&id)
    }

    fn attribute(&self, id: NodeId, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|(owner, attr)| *owner == id && attr == name)
    }
}

fn resolve_ignored_nodes(doc: &Document<'_>, vctx: &XmlValidationContext) -> IgnoredNodes {
    let mut ignored = IgnoredNodes {
        elements: Vec::new(),
        attributes: Vec::new(),
    };

    for expression in &vctx.ignore_paths {
        if xpath::is_xpath_expression(expression) {
            for hit in xpath::evaluate(doc, expression, &vctx.namespace_context) {
                match hit {
                    XPathHit::Element(id) => ignored.elements.push(id),
                    XPathHit::Attribute(id, name) => ignored.attributes.push((id, name)),
                }
            }
        } else if let Some(hit) = find_node_by_name(doc, expression) {
            match hit {
                NameHit::Element(id) => ignored.elements.push(id),
                NameHit::Attribute(id, name) => ignored.attributes.push((id, name)),
            }
        }
    }
    ignored
}

enum NameHit {
    Element(NodeId),
    Attribute(NodeId, String),
}

/// Resolves a dot-path or short-name address against the document.
///
/// Dot paths navigate from the root (`Root.Child.Leaf`), matching the first
/// child with each name; the final segment may name an attribute of the
/// element reached so far. A bare short name matches the first element (or,
/// failing that, the first attribute) with that local name in document
/// order; when several nodes share the short name only the first one is
/// addressed.
fn find_node_by_name(doc: &Document<'_>, name: &str) -> Option<NameHit> {
    if name.contains('.') {
        return find_by_dot_path(doc, name);
    }

    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.tag_name().name() == name {
            return Some(NameHit::Element(node.id()));
        }
    }
    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.attributes().any(|a| a.name() == name) {
            return Some(NameHit::Attribute(node.id(), name.to_string()));
        }
    }
    None
}

fn find_by_dot_path(doc: &Document<'_>, path: &str) -> Option<NameHit> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let root = doc.root_element();
    if root.tag_name().name() != first {
        return None;
    }

    let mut current = root;
    let mut segments = segments.peekable();
    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        match current
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == segment)
        {
            Some(child) => current = child,
            None if is_last && current.attributes().any(|a| a.name() == segment) => {
                return Some(NameHit::Attribute(current.id(), segment.to_string()));
            }
            None => return None,
        }
    }
    Some(NameHit::Element(current.id()))
}

/// Dot-path of a node from the document root, e.g. `Orders.Order.Id`.
fn dot_path(node: Node<'_, '_>) -> String {
    let mut names: Vec<&str> = node
        .ancestors()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    names.reverse();
    names.join(".")
}

fn is_node_ignored(node: Node<'_, '_>, ignored: &IgnoredNodes, vctx: &XmlValidationContext) -> bool {
    if vctx.ignore_paths.is_empty() {
        return false;
    }
    // Exact dot-path addresses win without any document search.
    let path = dot_path(node);
    if vctx.ignore_paths.iter().any(|p| *p == path) {
        return true;
    }
    ignored.element(node.id())
}

fn is_attribute_ignored(
    element: Node<'_, '_>,
    attr_name: &str,
    ignored: &IgnoredNodes,
    vctx: &XmlValidationContext,
) -> bool {
    if vctx.ignore_paths.is_empty() {
        return false;
    }
    let path = format!("{}.{}", dot_path(element), attr_name);
    if vctx.ignore_paths.iter().any(|p| *p == path) {
        return true;
    }
    ignored.attribute(element.id(), attr_name)
}

/// Children that take part in the comparison: elements, comments, processing
/// instructions and non-whitespace text. Whitespace-only text nodes are
/// formatting noise and are stripped on both sides.
fn significant_children<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|c| match c.node_type() {
            NodeType::Text => c.text().map(|t| !t.trim().is_empty()).unwrap_or(false),
            NodeType::Element | NodeType::Comment | NodeType::PI => true,
            NodeType::Root => false,
        })
        .collect()
}

fn validate_node(
    received: Node<'_, '_>,
    control: Node<'_, '_>,
    ignored: &IgnoredNodes,
    vctx: &XmlValidationContext,
) -> Result<(), EngineError> {
    match received.node_type() {
        NodeType::Element => validate_element(received, control, ignored, vctx),
        NodeType::Text => validate_text(received, control),
        // Diagnostic-only nodes: present in the child count, never compared.
        NodeType::Comment => {
            debug!(content = ?received.text(), "skipping comment node");
            Ok(())
        }
        NodeType::PI => {
            debug!("skipping processing instruction");
            Ok(())
        }
        NodeType::Root => {
            let received_root = received
                .children()
                .find(|c| c.is_element())
                .ok_or_else(empty_document)?;
            let control_root = control
                .children()
                .find(|c| c.is_element())
                .ok_or_else(empty_document)?;
            validate_node(received_root, control_root, ignored, vctx)
        }
    }
}

fn empty_document() -> EngineError {
    EngineError::parse("document has no root element")
}

fn validate_element(
    received: Node<'_, '_>,
    control: Node<'_, '_>,
    ignored: &IgnoredNodes,
    vctx: &XmlValidationContext,
) -> Result<(), EngineError> {
    let received_name = received.tag_name().name();
    let control_name = control.tag_name().name();
    debug!(element = %received_name, "validating element");

    if received_name != control_name {
        return Err(EngineError::validation(format!(
            "element names not equal, expected '{control_name}' but was '{received_name}'"
        )));
    }

    let received_ns = received.tag_name().namespace();
    let control_ns = control.tag_name().namespace();
    if received_ns != control_ns {
        return Err(EngineError::validation(format!(
            "element namespace not equal for element '{received_name}', expected '{}' but was '{}'",
            control_ns.unwrap_or(""),
            received_ns.unwrap_or("")
        )));
    }

    let value_ignored = is_node_ignored(received, ignored, vctx);
    if value_ignored {
        debug!(element = %received_name, "element value is on the ignore list");
    }

    // Structural checks hold even for ignored elements: ignoring exempts the
    // content, not the shape.
    let received_attr_count = received.attributes().count();
    let control_attr_count = control.attributes().count();
    if received_attr_count != control_attr_count {
        return Err(EngineError::validation(format!(
            "number of attributes not equal for element '{received_name}', expected {control_attr_count} but was {received_attr_count}"
        )));
    }

    let received_children = significant_children(received);
    let control_children = significant_children(control);
    if received_children.len() != control_children.len() {
        return Err(EngineError::validation(format!(
            "number of child elements not equal for element '{received_name}', expected {} but was {}",
            control_children.len(),
            received_children.len()
        )));
    }

    if value_ignored {
        return Ok(());
    }

    for attribute in received.attributes() {
        validate_attribute(received, control, attribute.name(), ignored, vctx)?;
    }

    for (received_child, control_child) in received_children.iter().zip(control_children.iter()) {
        validate_node(*received_child, *control_child, ignored, vctx)?;
    }

    debug!(element = %received_name, "element validation successful");
    Ok(())
}

fn validate_attribute(
    received_element: Node<'_, '_>,
    control_element: Node<'_, '_>,
    attr_name: &str,
    ignored: &IgnoredNodes,
    vctx: &XmlValidationContext,
) -> Result<(), EngineError> {
    let element_name = received_element.tag_name().name();
    let received_value = received_element
        .attribute(attr_name)
        .expect("attribute taken from this element");

    let Some(control_value) = control_element.attribute(attr_name) else {
        return Err(EngineError::validation(format!(
            "attribute validation failed for element '{element_name}', unknown attribute '{attr_name}'"
        )));
    };

    if is_attribute_ignored(received_element, attr_name, ignored, vctx) {
        debug!(attribute = %attr_name, "attribute value is on the ignore list");
        return Ok(());
    }

    if received_value != control_value {
        return Err(EngineError::validation(format!(
            "values not equal for attribute '{attr_name}' on element '{element_name}', expected '{control_value}' but was '{received_value}'"
        )));
    }
    Ok(())
}

fn validate_text(received: Node<'_, '_>, control: Node<'_, '_>) -> Result<(), EngineError> {
    let parent = received
        .parent()
        .map(|p| p.tag_name().name().to_string())
        .unwrap_or_default();
    let received_text = received.text().map(str::trim);
    let control_text = control.text().map(str::trim);

    match (received_text, control_text) {
        (Some(r), Some(c)) if r == c => Ok(()),
        (None, None) => Ok(()),
        _ => Err(EngineError::validation(format!(
            "node value not equal for element '{parent}', expected '{}' but was '{}'",
            control_text.unwrap_or(""),
            received_text.unwrap_or("")
        ))),
    }
}
