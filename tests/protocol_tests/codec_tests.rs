//! Codec Tests
//!
//! Stream I/O: reading values from a `Read` in arbitrary chunk sizes,
//! pipelining, end-of-stream handling, and writing values out.

use std::io::{self, Cursor, Read};

use bytes::BytesMut;
use katredis::protocol::{read_value, write_value, Decoder, Value};
use katredis::{CodecConfig, CodecError, KatError};

/// Reader that hands out at most `step` bytes per call
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl Trickle {
    fn new(data: &[u8], step: usize) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
            step,
        }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_write_read_value() {
    let value = Value::command(["ECHO", "hello"]);

    let mut out = Vec::new();
    write_value(&mut out, &value).unwrap();
    assert_eq!(out, b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n");

    let mut buf = BytesMut::new();
    let decoded = read_value(&mut Cursor::new(out), &mut buf, &Decoder::default()).unwrap();
    assert_eq!(decoded, value);
    assert!(buf.is_empty());
}

#[test]
fn test_stream_one_byte_at_a_time() {
    let input = b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$10\r\n0123456789\r\n";
    let mut reader = Trickle::new(input, 1);
    let mut buf = BytesMut::new();

    let value = read_value(&mut reader, &mut buf, &Decoder::default()).unwrap();
    assert_eq!(value, Value::command(["SET", "key", "0123456789"]));
}

#[test]
fn test_stream_pipelined_values() {
    let values = vec![
        Value::command(["PING"]),
        Value::command(["ECHO", "a"]),
        Value::null_bulk(),
        Value::bulk(""),
    ];

    let mut out = Vec::new();
    for value in &values {
        write_value(&mut out, value).unwrap();
    }

    let mut reader = Trickle::new(&out, 7);
    let mut buf = BytesMut::new();
    let decoder = Decoder::default();
    for expected in &values {
        assert_eq!(&read_value(&mut reader, &mut buf, &decoder).unwrap(), expected);
    }

    let eof = read_value(&mut reader, &mut buf, &decoder).unwrap_err();
    assert!(matches!(eof, KatError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
}

#[test]
fn test_stream_leftover_bytes_are_kept() {
    let mut reader = Cursor::new(b"+OK\r\n:1".to_vec());
    let mut buf = BytesMut::new();

    let value = read_value(&mut reader, &mut buf, &Decoder::default()).unwrap();
    assert_eq!(value, Value::ok());
    assert_eq!(&buf[..], b":1");
}

#[test]
fn test_stream_eof_mid_frame() {
    let mut reader = Cursor::new(b"$10\r\nhello".to_vec());
    let mut buf = BytesMut::new();

    let err = read_value(&mut reader, &mut buf, &Decoder::default()).unwrap_err();
    match err {
        KatError::Codec(e) => assert!(e.is_incomplete()),
        other => panic!("Expected incomplete codec error, got {:?}", other),
    }
}

#[test]
fn test_stream_empty_input() {
    let mut reader = Cursor::new(Vec::new());
    let mut buf = BytesMut::new();

    let err = read_value(&mut reader, &mut buf, &Decoder::default()).unwrap_err();
    assert!(matches!(err, KatError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
}

#[test]
fn test_stream_corrupt_frame() {
    let mut reader = Cursor::new(b"?garbage\r\n".to_vec());
    let mut buf = BytesMut::new();

    let err = read_value(&mut reader, &mut buf, &Decoder::default()).unwrap_err();
    assert!(matches!(err, KatError::Codec(CodecError::UnknownType(b'?'))));
}

#[test]
fn test_stream_unterminated_line_over_frame_limit() {
    // A line that never ends must not be buffered forever
    let decoder = Decoder::new(CodecConfig::default().max_frame_size(64));
    let mut input = b"+".to_vec();
    input.extend(std::iter::repeat(b'a').take(10_000));
    let mut reader = Cursor::new(input);
    let mut buf = BytesMut::new();

    let err = read_value(&mut reader, &mut buf, &decoder).unwrap_err();
    assert!(matches!(
        err,
        KatError::Codec(CodecError::FrameTooLarge { max: 64, .. })
    ));
}
