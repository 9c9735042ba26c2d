//! Per-action validation expectations.
//!
//! A receiving action carries a set of validation contexts, one per concern:
//! expected headers, the XML tree-comparison configuration, path-expression
//! expectations. The engine dispatches each context to the validators that
//! declare support for its kind: a tagged variant plus a capability lookup
//! instead of downcasting.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::message::HeaderValue;

/// Discriminant used for validator capability lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Header,
    Xml,
    Path,
}

/// Expected header name/value pairs. Evaluation order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct HeaderValidationContext {
    pub expected: IndexMap<String, HeaderValue>,
}

impl HeaderValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.expected.insert(name.into(), value.into());
        self
    }
}

/// Configuration for structural XML comparison.
#[derive(Debug, Clone, Default)]
pub struct XmlValidationContext {
    /// Ignore addresses: full dot-path, short name or XPath expression.
    /// Marks element/attribute *values* as exempt from comparison; structure
    /// is still enforced.
    pub ignore_paths: Vec<String>,
    /// Expected namespace declarations at the root element, prefix to URI.
    /// The default namespace uses the empty prefix.
    pub expected_namespaces: IndexMap<String, String>,
    /// Prefix bindings for XPath expressions used in ignore addresses.
    pub namespace_context: HashMap<String, String>,
    /// When set, the payload must carry a namespaced root element before the
    /// tree comparison runs.
    pub schema_validation: bool,
}

impl XmlValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, path: impl Into<String>) -> Self {
        self.ignore_paths.push(path.into());
        self
    }

    pub fn expect_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.expected_namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn bind_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespace_context.insert(prefix.into(), uri.into());
        self
    }

    pub fn schema_validation(mut self, enabled: bool) -> Self {
        self.schema_validation = enabled;
        self
    }
}

/// Path-expression expectations: XPath or JSONPath expression mapped to the
/// expected value (which may itself be dynamic content or a matcher
/// expression).
#[derive(Debug, Clone, Default)]
pub struct PathValidationContext {
    pub expressions: IndexMap<String, String>,
    /// Prefix bindings for namespaced XPath steps.
    pub namespace_context: HashMap<String, String>,
}

impl PathValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(mut self, expression: impl Into<String>, value: impl Into<String>) -> Self {
        self.expressions.insert(expression.into(), value.into());
        self
    }

    pub fn bind_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespace_context.insert(prefix.into(), uri.into());
        self
    }
}

/// One validation concern attached to a receiving action.
#[derive(Debug, Clone)]
pub enum ValidationContext {
    Header(HeaderValidationContext),
    Xml(XmlValidationContext),
    Path(PathValidationContext),
}

impl ValidationContext {
    pub fn kind(&self) -> ContextKind {
        match self {
            ValidationContext::Header(_) => ContextKind::Header,
            ValidationContext::Xml(_) => ContextKind::Xml,
            ValidationContext::Path(_) => ContextKind::Path,
        }
    }
}

impl From<HeaderValidationContext> for ValidationContext {
    fn from(ctx: HeaderValidationContext) -> Self {
        ValidationContext::Header(ctx)
    }
}

impl From<XmlValidationContext> for ValidationContext {
    fn from(ctx: XmlValidationContext) -> Self {
        ValidationContext::Xml(ctx)
    }
}

impl From<PathValidationContext> for ValidationContext {
    fn from(ctx: PathValidationContext) -> Self {
        ValidationContext::Path(ctx)
    }
}
