//! Message model: a payload plus an ordered header map.
//!
//! A received message and its control (expected) counterpart are distinct
//! instances of the same type; the validators read both without mutating
//! either. Header order is preserved so that validation failures are reported
//! in a deterministic, declaration-driven order.

use std::fmt;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::errors::EngineError;

/// Header names starting with this prefix are engine-internal bookkeeping
/// (message id, timestamp) and are skipped during header validation.
pub const RESERVED_HEADER_PREFIX: &str = "veritas_";

/// Engine-generated unique message id header.
pub const MESSAGE_ID_HEADER: &str = "veritas_message_id";

/// Engine-generated creation timestamp header (RFC 3339).
pub const TIMESTAMP_HEADER: &str = "veritas_timestamp";

/// A single header value. Comparison during validation happens on the string
/// rendering, so the variants only need a faithful `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Str(s) => write!(f, "{s}"),
            HeaderValue::Int(i) => write!(f, "{i}"),
            HeaderValue::Float(x) => write!(f, "{x}"),
            HeaderValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Str(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Str(s)
    }
}

impl From<i64> for HeaderValue {
    fn from(i: i64) -> Self {
        HeaderValue::Int(i)
    }
}

impl From<f64> for HeaderValue {
    fn from(x: f64) -> Self {
        HeaderValue::Float(x)
    }
}

impl From<bool> for HeaderValue {
    fn from(b: bool) -> Self {
        HeaderValue::Bool(b)
    }
}

/// Message payload. Validators that need text fail on binary payloads instead
/// of guessing an encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Binary(_) => None,
        }
    }
}

/// Payload plus ordered headers. Immutable once handed to a validator.
#[derive(Debug, Clone)]
pub struct Message {
    payload: Payload,
    headers: IndexMap<String, HeaderValue>,
}

impl Message {
    /// Creates a message and stamps the engine-internal id and timestamp
    /// headers. Those carry the reserved prefix and are invisible to header
    /// validation.
    pub fn new(payload: Payload) -> Self {
        let mut headers = IndexMap::new();
        headers.insert(
            MESSAGE_ID_HEADER.to_string(),
            HeaderValue::Str(Uuid::new_v4().to_string()),
        );
        headers.insert(
            TIMESTAMP_HEADER.to_string(),
            HeaderValue::Str(chrono::Utc::now().to_rfc3339()),
        );
        Self { payload, headers }
    }

    pub fn text(payload: impl Into<String>) -> Self {
        Self::new(Payload::Text(payload.into()))
    }

    /// A message without the generated bookkeeping headers. Control messages
    /// are built this way so that expected headers are exactly what the test
    /// declared.
    pub fn plain(payload: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(payload.into()),
            headers: IndexMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &IndexMap<String, HeaderValue> {
        &self.headers
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Text payload or a `Parse` error for binary messages.
    pub fn payload_text(&self) -> Result<&str, EngineError> {
        self.payload.as_text().ok_or_else(|| {
            EngineError::parse("message carries a binary payload where text was expected")
        })
    }

    pub fn id(&self) -> Option<&HeaderValue> {
        self.headers.get(MESSAGE_ID_HEADER)
    }
}
