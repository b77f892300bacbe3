//! Blocking RESP client
//!
//! Sends one request at a time and waits for its reply.

use std::io::BufWriter;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::BytesMut;

use crate::config::CodecConfig;
use crate::error::{KatError, Result};
use crate::protocol::{read_value, write_value_with, Decoder, Encoder, Value};

pub struct Client {
    reader: TcpStream,
    writer: BufWriter<TcpStream>,
    buffer: BytesMut,
    decoder: Decoder,
    encoder: Encoder,
}

impl Client {
    /// Connect with the default codec limits
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::connect_with(addr, CodecConfig::default())
    }

    pub fn connect_with(addr: impl ToSocketAddrs, codec: CodecConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| KatError::Network(format!("cannot connect: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: stream.try_clone()?,
            writer: BufWriter::new(stream),
            buffer: BytesMut::new(),
            decoder: Decoder::new(codec),
            encoder: Encoder::new(codec),
        })
    }

    /// Apply the same timeout to reads and writes
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.set_read_timeout(timeout)?;
        self.reader.set_write_timeout(timeout)?;
        Ok(())
    }

    /// Send a request and wait for the reply
    pub fn send(&mut self, request: &Value) -> Result<Value> {
        write_value_with(&mut self.writer, request, &self.encoder)?;
        self.read_reply()
    }

    /// Send `args` as an array of bulk strings
    pub fn command<S: AsRef<[u8]>>(&mut self, args: &[S]) -> Result<Value> {
        self.send(&Value::command(args))
    }

    /// Read the next reply without sending anything first
    pub fn read_reply(&mut self) -> Result<Value> {
        read_value(&mut self.reader, &mut self.buffer, &self.decoder)
    }
}
