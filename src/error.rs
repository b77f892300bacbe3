//! Error types for katredis
//!
//! Two layers:
//! - [`CodecError`]: the RESP decode/encode taxonomy. Plain data, cheap to
//!   clone and compare, so callers can match on it.
//! - [`KatError`]: the crate-wide error for I/O, networking and configuration.

use thiserror::Error;

use crate::protocol::ValueKind;

/// Result type alias using KatError
pub type Result<T> = std::result::Result<T, KatError>;

/// Errors produced while decoding or encoding RESP frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    // -------------------------------------------------------------------------
    // Recoverable: the frame is not complete yet
    // -------------------------------------------------------------------------
    /// No `\r\n` terminator after the cursor. Buffer more bytes and retry.
    #[error("unterminated frame: no CRLF found")]
    UnterminatedFrame,

    /// The declared body length exceeds the bytes available.
    #[error("truncated body: need {needed} bytes, have {available}")]
    TruncatedBody { needed: usize, available: usize },

    // -------------------------------------------------------------------------
    // Fatal for the frame
    // -------------------------------------------------------------------------
    /// The byte at the cursor is not the marker the variant decoder expects.
    #[error("marker mismatch: expected '{}', found {found:#04x}", char::from(*.expected))]
    MarkerMismatch { expected: u8, found: u8 },

    #[error("unknown type marker: {0:#04x}")]
    UnknownType(u8),

    #[error("malformed integer: {0:?}")]
    MalformedInteger(String),

    #[error("malformed float: {0:?}")]
    MalformedFloat(String),

    /// Framing is intact but the payload breaks the variant's rules.
    #[error("malformed {kind}: {reason}")]
    MalformedPayload {
        kind: ValueKind,
        reason: &'static str,
    },

    #[error("nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    #[error("frame too large: {len} exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// A line payload would contain CR or LF and could never be decoded back.
    #[error("{0} payload contains an embedded CR or LF")]
    EmbeddedTerminator(ValueKind),

    /// The variant is recognised but disabled in this codec configuration.
    #[error("{0} is not implemented")]
    NotImplemented(ValueKind),
}

impl CodecError {
    /// Returns true if more input may complete the frame.
    ///
    /// The transport should keep buffering on these, and treat every other
    /// variant as a corrupt frame.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            CodecError::UnterminatedFrame | CodecError::TruncatedBody { .. }
        )
    }
}

/// Unified error type for katredis operations
#[derive(Debug, Error)]
pub enum KatError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Codec(#[from] CodecError),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
