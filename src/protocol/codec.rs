//! Stream helpers
//!
//! Glue between the in-memory codec and blocking `Read`/`Write` streams.
//! A caller owns one `BytesMut` per stream; bytes read past the end of a
//! frame stay in it, so pipelined requests are decoded on the next call.

use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};

use crate::error::{CodecError, KatError, Result};
use super::{Decoder, Encoder, Value};

/// Bytes requested from the reader per refill
pub const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Read one complete value from a stream
///
/// Blocks until a full frame is buffered. Returns `Io(UnexpectedEof)` if the
/// stream ends cleanly between frames, and the incomplete `CodecError` if it
/// ends in the middle of one.
///
/// After an incomplete decode the frame is only decoded again once the new
/// bytes can complete it, so a long line or body costs one scan overall
/// instead of one per refill.
pub fn read_value<R: Read>(reader: &mut R, buf: &mut BytesMut, decoder: &Decoder) -> Result<Value> {
    let max = decoder.config().max_frame_size;
    let mut pending: Option<CodecError> = None;
    let mut resume = Resume::Now;

    loop {
        if !buf.is_empty() && resume.ready(buf) {
            let mut cursor = 0;
            match decoder.decode(&buf[..], &mut cursor) {
                Ok(value) => {
                    buf.advance(cursor);
                    return Ok(value);
                }
                Err(e) if e.is_incomplete() => {
                    resume = Resume::after(&e, buf.len());
                    pending = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        if buf.len() > max {
            return Err(CodecError::FrameTooLarge { len: buf.len(), max }.into());
        }

        let filled = buf.len();
        buf.resize(filled + READ_CHUNK_SIZE, 0);
        let n = match reader.read(&mut buf[filled..]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                buf.truncate(filled);
                continue;
            }
            Err(e) => {
                buf.truncate(filled);
                return Err(e.into());
            }
        };
        buf.truncate(filled + n);

        if n == 0 {
            return Err(match pending {
                Some(e) => KatError::Codec(e),
                None => io::Error::from(io::ErrorKind::UnexpectedEof).into(),
            });
        }
    }
}

/// When an incomplete frame is worth decoding again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Now,

    /// A line had no CRLF. Every frame ends in `\n`, so nothing can complete
    /// until one arrives at or after `from`.
    Terminator { from: usize },

    /// A body was short. Retry once the buffer holds `len` bytes.
    Length(usize),
}

impl Resume {
    /// Hint for an incomplete error from decoding the first `buffered` bytes
    fn after(err: &CodecError, buffered: usize) -> Self {
        match *err {
            CodecError::UnterminatedFrame => Resume::Terminator { from: buffered },
            CodecError::TruncatedBody { needed, available } => {
                Resume::Length(buffered.saturating_sub(available) + needed)
            }
            _ => Resume::Now,
        }
    }

    fn ready(self, buf: &[u8]) -> bool {
        match self {
            Resume::Now => true,
            Resume::Terminator { from } => buf
                .get(from..)
                .map_or(false, |fresh| memchr::memchr(b'\n', fresh).is_some()),
            Resume::Length(len) => buf.len() >= len,
        }
    }
}

/// Write a value to a stream and flush it
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    write_value_with(writer, value, &Encoder::default())
}

/// Write a value with a specific encoder configuration
pub fn write_value_with<W: Write>(writer: &mut W, value: &Value, encoder: &Encoder) -> Result<()> {
    let bytes = encoder.encode(value)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
