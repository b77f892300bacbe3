//! RESP value model
//!
//! A decoded value owns its payload outright. Values are built fresh for each
//! decode and are never shared between requests.

use std::fmt;

use bytes::Bytes;

use super::ValueKind;

/// A RESP protocol value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Simple string: `+OK\r\n`
    SimpleString(String),

    /// Bulk string: `$6\r\nfoobar\r\n`
    ///
    /// `None` is the null bulk string (`$-1\r\n`). `Some` of an empty buffer
    /// is the empty string (`$0\r\n\r\n`). The two never collapse.
    BulkString(Option<Bytes>),

    /// Integer: `:1000\r\n`
    Integer(i64),

    /// Error: `-ERR message\r\n`
    Error(String),

    /// Boolean: `#t\r\n` or `#f\r\n`
    Boolean(bool),

    /// Double: `,3.14\r\n`
    Double(f64),

    /// Big number, kept as its decimal text: `(3492890328409238509324850943850943825024385\r\n`
    BigNumber(String),

    /// Bulk error: `!21\r\nSYNTAX invalid syntax\r\n`
    BulkError(Bytes),

    /// Verbatim string: `=15\r\ntxt:Some string\r\n`
    VerbatimString {
        /// Three byte encoding hint, e.g. `txt` or `mkd`
        format: [u8; 3],
        text: Bytes,
    },

    /// Map: `%<count>\r\n` then `count` key/value pairs, order preserved
    Map(Vec<(Value, Value)>),

    /// Set: `~<count>\r\n` then `count` values
    Set(Vec<Value>),

    /// Push: `><count>\r\n` then `count` values
    Push(Vec<Value>),

    /// Null: `_\r\n`
    Null,

    /// Array: `*<count>\r\n` then `count` values
    Array(Vec<Value>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn simple(text: impl Into<String>) -> Self {
        Value::SimpleString(text.into())
    }

    /// `+OK`
    pub fn ok() -> Self {
        Value::SimpleString("OK".to_string())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::BulkString(Some(data.into()))
    }

    /// `$-1`
    pub fn null_bulk() -> Self {
        Value::BulkString(None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(elements)
    }

    /// Array of bulk strings, the shape of every client request
    pub fn command<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Value::Array(
            parts
                .into_iter()
                .map(|part| Value::bulk(Bytes::copy_from_slice(part.as_ref())))
                .collect(),
        )
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::SimpleString(_) => ValueKind::SimpleString,
            Value::BulkString(_) => ValueKind::BulkString,
            Value::Integer(_) => ValueKind::Integer,
            Value::Error(_) => ValueKind::Error,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Double(_) => ValueKind::Double,
            Value::BigNumber(_) => ValueKind::BigNumber,
            Value::BulkError(_) => ValueKind::BulkError,
            Value::VerbatimString { .. } => ValueKind::VerbatimString,
            Value::Map(_) => ValueKind::Map,
            Value::Set(_) => ValueKind::Set,
            Value::Push(_) => ValueKind::Push,
            Value::Null => ValueKind::Null,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// True for `_` and for the null bulk string
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::BulkString(None))
    }

    /// Element count written in an aggregate header (pairs for a map)
    pub fn declared_count(&self) -> Option<usize> {
        match self {
            Value::Array(items) | Value::Set(items) | Value::Push(items) => Some(items.len()),
            Value::Map(pairs) => Some(pairs.len()),
            _ => None,
        }
    }

    /// Raw payload of a string-like value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::SimpleString(s) | Value::Error(s) | Value::BigNumber(s) => Some(s.as_bytes()),
            Value::BulkString(Some(data))
            | Value::BulkError(data)
            | Value::VerbatimString { text: data, .. } => Some(data.as_ref()),
            _ => None,
        }
    }

    /// Text view of a simple or bulk string, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::SimpleString(s) => Some(s),
            Value::BulkString(Some(data)) => std::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::bulk(Bytes::from(s))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

// =============================================================================
// Human readable rendering (redis-cli style)
// =============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, 0)
    }
}

fn render(value: &Value, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    match value {
        Value::SimpleString(s) => f.write_str(s),
        Value::BulkString(None) | Value::Null => f.write_str("(nil)"),
        Value::BulkString(Some(data)) => write!(f, "\"{}\"", String::from_utf8_lossy(data)),
        Value::Integer(n) => write!(f, "(integer) {n}"),
        Value::Error(message) => write!(f, "(error) {message}"),
        Value::Boolean(b) => write!(f, "({})", if *b { "true" } else { "false" }),
        Value::Double(d) => write!(f, "(double) {d}"),
        Value::BigNumber(n) => write!(f, "(big number) {n}"),
        Value::BulkError(data) => write!(f, "(error) {}", String::from_utf8_lossy(data)),
        Value::VerbatimString { text, .. } => f.write_str(&String::from_utf8_lossy(text)),
        Value::Array(items) | Value::Set(items) | Value::Push(items) => {
            if items.is_empty() {
                return f.write_str("(empty array)");
            }
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, "\n{:indent$}", "")?;
                }
                write!(f, "{}) ", i + 1)?;
                render(item, f, indent + 3)?;
            }
            Ok(())
        }
        Value::Map(pairs) => {
            if pairs.is_empty() {
                return f.write_str("(empty hash)");
            }
            for (i, (key, val)) in pairs.iter().enumerate() {
                if i > 0 {
                    write!(f, "\n{:indent$}", "")?;
                }
                write!(f, "{}# ", i + 1)?;
                render(key, f, indent + 3)?;
                f.write_str(" => ")?;
                render(val, f, indent + 3)?;
            }
            Ok(())
        }
    }
}
