//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;

use crate::config::CodecConfig;
use crate::engine::{ClientId, Engine};
use crate::error::{KatError, Result};
use crate::protocol::{read_value, write_value_with, Decoder, Encoder, Value};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader. `read_value` does its own chunked buffering.
    reader: TcpStream,

    /// TCP stream writer (buffered, flushed once per reply)
    writer: BufWriter<TcpStream>,

    /// Bytes received but not yet decoded (partial or pipelined frames)
    buffer: BytesMut,

    decoder: Decoder,

    encoder: Encoder,

    /// Reference to the command engine
    engine: Arc<Engine>,

    /// Id assigned by the engine's client registry
    client_id: ClientId,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler and register it with the engine
    pub fn new(stream: TcpStream, engine: Arc<Engine>, codec: CodecConfig) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        let client_id = engine.register_client(peer_addr.clone());

        Ok(Self {
            reader: read_stream,
            writer: BufWriter::new(write_stream),
            buffer: BytesMut::with_capacity(crate::protocol::READ_CHUNK_SIZE),
            decoder: Decoder::new(codec),
            encoder: Encoder::new(codec),
            engine,
            client_id,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables a timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends replies. Returns when the client
    /// disconnects, times out, or sends a frame that cannot be decoded.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection {} established from {}", self.client_id, self.peer_addr);

        loop {
            let request = match read_value(&mut self.reader, &mut self.buffer, &self.decoder) {
                Ok(value) => value,
                Err(KatError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(KatError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // Windows reports TimedOut where Unix reports WouldBlock
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(KatError::Codec(ref e)) if e.is_incomplete() => {
                    tracing::debug!("Client {} closed mid-frame: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(KatError::Codec(e)) => {
                    // The rest of the buffer cannot be trusted to start on a
                    // frame boundary, so reply once and hang up.
                    tracing::warn!("Malformed request from {}: {}", self.peer_addr, e);
                    let _ = self.send(&Value::error(format!("ERR Protocol error: {}", e)));
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received from {}: {:?}", self.peer_addr, request);

            let response = self.engine.handle_request(self.client_id, request);

            if let Err(e) = self.send(&response) {
                // The client went away before the reply could be written
                if let KatError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a reply to the client
    fn send(&mut self, response: &Value) -> Result<()> {
        match write_value_with(&mut self.writer, response, &self.encoder) {
            Err(KatError::Codec(e)) => {
                // The reply itself has no wire form; tell the client instead.
                tracing::warn!("Cannot encode reply for {}: {}", self.peer_addr, e);
                write_value_with(
                    &mut self.writer,
                    &Value::error(format!("ERR cannot encode reply: {}", e)),
                    &self.encoder,
                )
            }
            other => other,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.engine.unregister_client(self.client_id);
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
