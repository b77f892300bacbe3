//! Configuration for katredis
//!
//! Centralized configuration with sensible defaults.

use crate::error::{KatError, Result};

/// Default maximum nesting depth for aggregate values
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum frame size (512 MB, the Redis `proto-max-bulk-len`)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Limits and feature switches for the RESP codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum aggregate nesting depth. The top-level value is depth 0, so
    /// `max_depth = 1` allows an array of scalars but not an array of arrays.
    pub max_depth: usize,

    /// Maximum bulk payload length and aggregate element count, and the
    /// most bytes a stream reader buffers for a single frame
    pub max_frame_size: usize,

    /// Decode and encode the RESP3 extended kinds
    /// (BigNumber, BulkError, VerbatimString, Map, Set, Push)
    pub extended_types: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            extended_types: true,
        }
    }
}

impl CodecConfig {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    pub fn extended_types(mut self, enabled: bool) -> Self {
        self.extended_types = enabled;
        self
    }
}

/// Main configuration for a katredis server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    pub codec: CodecConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:6379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            codec: CodecConfig::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(KatError::Config("max_connections must be at least 1".to_string()));
        }
        if self.codec.max_frame_size == 0 {
            return Err(KatError::Config("max_frame_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the maximum aggregate nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.codec.max_depth = depth;
        self
    }

    /// Set the maximum frame size (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.codec.max_frame_size = size;
        self
    }

    /// Enable or disable the RESP3 extended kinds
    pub fn extended_types(mut self, enabled: bool) -> Self {
        self.config.codec.extended_types = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
