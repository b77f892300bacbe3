//! # katredis
//!
//! A RESP (REdis Serialization Protocol) implementation with:
//! - A typed value model covering RESP2 and the RESP3 extended kinds
//! - A recursive decoder with depth and frame size limits
//! - A canonical encoder
//! - A small threaded TCP server and blocking client on top of the codec
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │             (one thread per connection)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              Decoder  ◄── peek_kind (marker table)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Value::Array
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │          Command::from_value  ─►  Engine::execute            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Value
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Encoder                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CodecError, KatError, Result};
pub use config::{CodecConfig, Config};
pub use engine::Engine;
pub use protocol::{decode, encode, Value, ValueKind};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of katredis
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
