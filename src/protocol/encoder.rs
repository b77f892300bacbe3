//! RESP encoder
//!
//! Renders a [`Value`] tree into its canonical wire form. Encoding is a pure
//! function of the value: the only failures are values that have no valid
//! wire form (a line payload with an embedded CR/LF) and kinds disabled by
//! the codec configuration.

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::CodecConfig;
use crate::error::CodecError;
use super::{Value, ValueKind};

const CRLF: &[u8] = b"\r\n";

type EncodeResult<T> = std::result::Result<T, CodecError>;

/// Encode a value with every kind enabled
pub fn encode(value: &Value) -> EncodeResult<Bytes> {
    Encoder::default().encode(value)
}

/// Append the encoding of `value` to `dst` with every kind enabled
pub fn encode_into(value: &Value, dst: &mut BytesMut) -> EncodeResult<()> {
    Encoder::default().encode_into(value, dst)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    config: CodecConfig,
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn encode(&self, value: &Value) -> EncodeResult<Bytes> {
        let mut dst = BytesMut::new();
        self.encode_into(value, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Append to `dst`. On error `dst` is restored to its previous length.
    pub fn encode_into(&self, value: &Value, dst: &mut BytesMut) -> EncodeResult<()> {
        let start = dst.len();
        if let Err(e) = self.write_value(value, dst) {
            dst.truncate(start);
            return Err(e);
        }
        Ok(())
    }

    fn write_value(&self, value: &Value, dst: &mut BytesMut) -> EncodeResult<()> {
        let kind = value.kind();
        if kind.is_extended() && !self.config.extended_types {
            return Err(CodecError::NotImplemented(kind));
        }

        match value {
            Value::SimpleString(text) | Value::Error(text) | Value::BigNumber(text) => {
                write_line(dst, kind, text.as_bytes())?;
            }
            Value::Integer(n) => write_line(dst, kind, n.to_string().as_bytes())?,
            Value::Boolean(b) => write_line(dst, kind, if *b { b"t" } else { b"f" })?,
            Value::Double(d) => write_line(dst, kind, format_double(*d).as_bytes())?,
            Value::Null => write_line(dst, kind, b"")?,
            Value::BulkString(None) => write_line(dst, kind, b"-1")?,
            Value::BulkString(Some(data)) | Value::BulkError(data) => {
                write_header(dst, kind, data.len());
                dst.put_slice(data);
                dst.put_slice(CRLF);
            }
            Value::VerbatimString { format, text } => {
                write_header(dst, kind, format.len() + 1 + text.len());
                dst.put_slice(format);
                dst.put_u8(b':');
                dst.put_slice(text);
                dst.put_slice(CRLF);
            }
            Value::Array(items) | Value::Set(items) | Value::Push(items) => {
                write_header(dst, kind, items.len());
                for item in items {
                    self.write_value(item, dst)?;
                }
            }
            Value::Map(pairs) => {
                write_header(dst, kind, pairs.len());
                for (key, val) in pairs {
                    self.write_value(key, dst)?;
                    self.write_value(val, dst)?;
                }
            }
        }
        Ok(())
    }
}

fn write_line(dst: &mut BytesMut, kind: ValueKind, payload: &[u8]) -> EncodeResult<()> {
    if payload.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Err(CodecError::EmbeddedTerminator(kind));
    }
    dst.reserve(1 + payload.len() + CRLF.len());
    dst.put_u8(kind.marker());
    dst.put_slice(payload);
    dst.put_slice(CRLF);
    Ok(())
}

/// `<marker><len>\r\n`
fn write_header(dst: &mut BytesMut, kind: ValueKind, len: usize) {
    dst.put_u8(kind.marker());
    dst.put_slice(len.to_string().as_bytes());
    dst.put_slice(CRLF);
}

/// Magnitudes outside `[1e-4, 1e16)` are written in exponent form
const PLAIN_DOUBLE_MIN: f64 = 1e-4;
const PLAIN_DOUBLE_MAX: f64 = 1e16;

/// Shortest text that parses back to the same `f64`.
/// Infinities and NaN use the RESP3 spellings.
pub fn format_double(d: f64) -> String {
    let magnitude = d.abs();
    if d.is_nan() {
        "nan".to_string()
    } else if d == f64::INFINITY {
        "inf".to_string()
    } else if d == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if magnitude != 0.0 && !(PLAIN_DOUBLE_MIN..PLAIN_DOUBLE_MAX).contains(&magnitude) {
        format!("{:e}", d)
    } else {
        d.to_string()
    }
}
