//! RESP decoder
//!
//! Recursive descent over a borrowed byte buffer. Every decode takes a cursor
//! by exclusive reference and moves it past exactly one frame on success.
//! On failure the cursor is left where it was, so a caller that gets an
//! incomplete error can append bytes and call again with the same cursor.
//!
//! Line-based kinds (`+ - : # , ( _`) end at the first `\r\n`. Length-prefixed
//! kinds (`$ ! =`) read a `<len>\r\n` header and then exactly `len` bytes plus
//! `\r\n`. Aggregates (`* % ~ >`) read a `<count>\r\n` header and then decode
//! their children, failing as a whole if any child fails.

use bytes::Bytes;

use crate::config::CodecConfig;
use crate::error::CodecError;
use super::marker::peek_kind;
use super::{Value, ValueKind};

const CRLF: &[u8] = b"\r\n";

/// Null sentinel for bulk string lengths
const NULL_LENGTH: i64 = -1;

/// Smallest possible encoded child (`_\r\n`), used to cap preallocation
const MIN_FRAME_LEN: usize = 3;

type DecodeResult<T> = std::result::Result<T, CodecError>;

/// Decode one value from the start of `buf` using the default limits.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode(buf: &[u8]) -> DecodeResult<(Value, usize)> {
    let mut cursor = 0;
    let value = Decoder::default().decode(buf, &mut cursor)?;
    Ok((value, cursor))
}

/// Stateless RESP decoder carrying the configured limits
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    config: CodecConfig,
}

impl Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode the frame starting at `cursor`, whatever its kind
    pub fn decode(&self, buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
        let mut pos = *cursor;
        let value = self.decode_value(buf, &mut pos, 0)?;
        *cursor = pos;
        Ok(value)
    }

    /// Decode an array frame, rejecting any other kind with `MarkerMismatch`
    pub fn decode_array(&self, buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
        let mut pos = *cursor;
        let items = self.decode_sequence(buf, &mut pos, ValueKind::Array, 0)?;
        *cursor = pos;
        Ok(Value::Array(items))
    }

    fn decode_value(&self, buf: &[u8], pos: &mut usize, depth: usize) -> DecodeResult<Value> {
        let kind = peek_kind(buf, *pos)?;
        if kind.is_extended() && !self.config.extended_types {
            return Err(CodecError::NotImplemented(kind));
        }

        match kind {
            ValueKind::SimpleString => read_simple_string(buf, pos),
            ValueKind::Error => read_error(buf, pos),
            ValueKind::Integer => read_integer(buf, pos),
            ValueKind::Boolean => read_boolean(buf, pos),
            ValueKind::Double => read_double(buf, pos),
            ValueKind::Null => read_null(buf, pos),
            ValueKind::BigNumber => read_big_number(buf, pos),
            ValueKind::BulkString => {
                let body = read_length_prefixed(buf, pos, kind, self.config.max_frame_size)?;
                Ok(Value::BulkString(body.map(Bytes::copy_from_slice)))
            }
            ValueKind::BulkError => {
                let body = self.required_body(buf, pos, kind)?;
                Ok(Value::BulkError(Bytes::copy_from_slice(body)))
            }
            ValueKind::VerbatimString => {
                let body = self.required_body(buf, pos, kind)?;
                if body.len() < 4 || body[3] != b':' {
                    return Err(CodecError::MalformedPayload {
                        kind,
                        reason: "expected a three byte format followed by ':'",
                    });
                }
                Ok(Value::VerbatimString {
                    format: [body[0], body[1], body[2]],
                    text: Bytes::copy_from_slice(&body[4..]),
                })
            }
            ValueKind::Array => Ok(Value::Array(self.decode_sequence(buf, pos, kind, depth)?)),
            ValueKind::Set => Ok(Value::Set(self.decode_sequence(buf, pos, kind, depth)?)),
            ValueKind::Push => Ok(Value::Push(self.decode_sequence(buf, pos, kind, depth)?)),
            ValueKind::Map => Ok(Value::Map(self.decode_pairs(buf, pos, depth)?)),
        }
    }

    /// Length-prefixed body that may not be null
    fn required_body<'a>(
        &self,
        buf: &'a [u8],
        pos: &mut usize,
        kind: ValueKind,
    ) -> DecodeResult<&'a [u8]> {
        read_length_prefixed(buf, pos, kind, self.config.max_frame_size)?
            .ok_or_else(|| CodecError::MalformedInteger(NULL_LENGTH.to_string()))
    }

    /// Array, Set and Push: a count header followed by `count` children
    fn decode_sequence(
        &self,
        buf: &[u8],
        pos: &mut usize,
        kind: ValueKind,
        depth: usize,
    ) -> DecodeResult<Vec<Value>> {
        let count = self.read_count(buf, pos, kind, depth)?;
        let mut items = Vec::with_capacity(count.min(remaining(buf, *pos) / MIN_FRAME_LEN));
        for _ in 0..count {
            items.push(self.decode_value(buf, pos, depth + 1)?);
        }
        Ok(items)
    }

    /// Map: a count header followed by `count` key/value pairs
    fn decode_pairs(
        &self,
        buf: &[u8],
        pos: &mut usize,
        depth: usize,
    ) -> DecodeResult<Vec<(Value, Value)>> {
        let count = self.read_count(buf, pos, ValueKind::Map, depth)?;
        let mut pairs = Vec::with_capacity(count.min(remaining(buf, *pos) / (2 * MIN_FRAME_LEN)));
        for _ in 0..count {
            let key = self.decode_value(buf, pos, depth + 1)?;
            let value = self.decode_value(buf, pos, depth + 1)?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    /// Aggregate header. Negative counts read as an empty aggregate.
    fn read_count(
        &self,
        buf: &[u8],
        pos: &mut usize,
        kind: ValueKind,
        depth: usize,
    ) -> DecodeResult<usize> {
        let (header, next) = read_line(buf, *pos, kind)?;
        if depth >= self.config.max_depth {
            return Err(CodecError::DepthExceeded(self.config.max_depth));
        }

        let count = parse_integer(header)?;
        let count = usize::try_from(count).unwrap_or(0);
        if count > self.config.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                len: count,
                max: self.config.max_frame_size,
            });
        }

        *pos = next;
        Ok(count)
    }
}

// =============================================================================
// Per-variant decoders
// =============================================================================

/// `+<text>\r\n`
pub fn decode_simple_string(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    commit(buf, cursor, read_simple_string)
}

/// `-<message>\r\n`
pub fn decode_error(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    commit(buf, cursor, read_error)
}

/// `:<signed int>\r\n`
pub fn decode_integer(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    commit(buf, cursor, read_integer)
}

/// `#t\r\n` or `#f\r\n`
pub fn decode_boolean(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    commit(buf, cursor, read_boolean)
}

/// `,<decimal>\r\n`
pub fn decode_double(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    commit(buf, cursor, read_double)
}

/// `_\r\n`
pub fn decode_null(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    commit(buf, cursor, read_null)
}

/// `$<len>\r\n<bytes>\r\n` or `$-1\r\n`
pub fn decode_bulk_string(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    let max = CodecConfig::default().max_frame_size;
    commit(buf, cursor, |buf, pos| {
        let body = read_length_prefixed(buf, pos, ValueKind::BulkString, max)?;
        Ok(Value::BulkString(body.map(Bytes::copy_from_slice)))
    })
}

/// `*<count>\r\n` followed by `count` values, with the default limits
pub fn decode_array(buf: &[u8], cursor: &mut usize) -> DecodeResult<Value> {
    Decoder::default().decode_array(buf, cursor)
}

/// Run `read` on a scratch position and only publish it on success
fn commit<F>(buf: &[u8], cursor: &mut usize, read: F) -> DecodeResult<Value>
where
    F: FnOnce(&[u8], &mut usize) -> DecodeResult<Value>,
{
    let mut pos = *cursor;
    let value = read(buf, &mut pos)?;
    *cursor = pos;
    Ok(value)
}

fn read_simple_string(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::SimpleString)?;
    let text = line_text(line, ValueKind::SimpleString)?;
    *pos = next;
    Ok(Value::SimpleString(text))
}

fn read_error(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::Error)?;
    let text = line_text(line, ValueKind::Error)?;
    *pos = next;
    Ok(Value::Error(text))
}

fn read_integer(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::Integer)?;
    let n = parse_integer(line)?;
    *pos = next;
    Ok(Value::Integer(n))
}

fn read_boolean(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::Boolean)?;
    *pos = next;
    Ok(Value::Boolean(matches!(line, b"t" | b"T")))
}

fn read_double(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::Double)?;
    let d = std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| CodecError::MalformedFloat(String::from_utf8_lossy(line).into_owned()))?;
    *pos = next;
    Ok(Value::Double(d))
}

fn read_null(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::Null)?;
    if !line.is_empty() {
        return Err(CodecError::MalformedPayload {
            kind: ValueKind::Null,
            reason: "unexpected payload",
        });
    }
    *pos = next;
    Ok(Value::Null)
}

fn read_big_number(buf: &[u8], pos: &mut usize) -> DecodeResult<Value> {
    let (line, next) = read_line(buf, *pos, ValueKind::BigNumber)?;
    let digits = match line.first() {
        Some(b'-' | b'+') => &line[1..],
        _ => line,
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(CodecError::MalformedInteger(
            String::from_utf8_lossy(line).into_owned(),
        ));
    }
    let text = line_text(line, ValueKind::BigNumber)?;
    *pos = next;
    Ok(Value::BigNumber(text))
}

/// Payload of a text line. It must be valid UTF-8 and hold no bare CR or LF,
/// otherwise the value could not be encoded back to the same bytes.
fn line_text(line: &[u8], kind: ValueKind) -> DecodeResult<String> {
    if memchr::memchr2(b'\r', b'\n', line).is_some() {
        return Err(CodecError::MalformedPayload {
            kind,
            reason: "line contains a bare CR or LF",
        });
    }
    std::str::from_utf8(line)
        .map(str::to_owned)
        .map_err(|_| CodecError::MalformedPayload {
            kind,
            reason: "line is not valid UTF-8",
        })
}

// =============================================================================
// Framing helpers
// =============================================================================

/// Check the marker at `pos` and return the payload up to the next CRLF,
/// together with the position just past that CRLF.
fn read_line(buf: &[u8], pos: usize, kind: ValueKind) -> DecodeResult<(&[u8], usize)> {
    let start = expect_marker(buf, pos, kind)?;
    let rest = &buf[start..];
    let end = find_crlf(rest).ok_or(CodecError::UnterminatedFrame)?;
    Ok((&rest[..end], start + end + CRLF.len()))
}

/// `<len>\r\n<len bytes>\r\n`, or `None` for the `-1` sentinel
fn read_length_prefixed<'a>(
    buf: &'a [u8],
    pos: &mut usize,
    kind: ValueKind,
    max_len: usize,
) -> DecodeResult<Option<&'a [u8]>> {
    let (header, body_start) = read_line(buf, *pos, kind)?;
    let len = parse_integer(header)?;
    if len == NULL_LENGTH {
        *pos = body_start;
        return Ok(None);
    }

    let len = usize::try_from(len)
        .map_err(|_| CodecError::MalformedInteger(len.to_string()))?;
    if len > max_len {
        return Err(CodecError::FrameTooLarge { len, max: max_len });
    }

    let needed = len + CRLF.len();
    let available = remaining(buf, body_start);
    if available < needed {
        return Err(CodecError::TruncatedBody { needed, available });
    }

    let body_end = body_start + len;
    if &buf[body_end..body_end + CRLF.len()] != CRLF {
        return Err(CodecError::MalformedPayload {
            kind,
            reason: "body is not followed by CRLF",
        });
    }

    *pos = body_end + CRLF.len();
    Ok(Some(&buf[body_start..body_end]))
}

fn expect_marker(buf: &[u8], pos: usize, kind: ValueKind) -> DecodeResult<usize> {
    let found = *buf.get(pos).ok_or(CodecError::UnterminatedFrame)?;
    if found != kind.marker() {
        return Err(CodecError::MarkerMismatch {
            expected: kind.marker(),
            found,
        });
    }
    Ok(pos + 1)
}

/// Position of the first `\r\n`. A `\r` not followed by `\n` is skipped.
fn find_crlf(data: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = memchr::memchr(b'\r', &data[from..]) {
        let pos = from + offset;
        match data.get(pos + 1) {
            Some(b'\n') => return Some(pos),
            Some(_) => from = pos + 1,
            None => return None,
        }
    }
    None
}

fn parse_integer(text: &[u8]) -> DecodeResult<i64> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| CodecError::MalformedInteger(String::from_utf8_lossy(text).into_owned()))
}

#[inline]
fn remaining(buf: &[u8], pos: usize) -> usize {
    buf.len().saturating_sub(pos)
}
