//! Codec configuration.
//!
//! # Example
//!
//! ```
//! use egts_transport::CodecConfig;
//!
//! let config = CodecConfig::from_json(r#"{ "max_payload_size": 1024 }"#).unwrap();
//! assert_eq!(config.max_payload_size, 1024);
//! assert_eq!(config.max_buffer_size, CodecConfig::default().max_buffer_size);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EgtsError, Result};
use crate::protocol::{MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE};

/// Default initial capacity of a packet buffer (64KB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Default cap on bytes held by a packet buffer (4 full-size packets).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 4 * MAX_PACKET_SIZE;

/// Limits applied by [`PacketCodec`](crate::PacketCodec) and
/// [`PacketBuffer`](crate::protocol::PacketBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest FDL accepted on decode.
    pub max_payload_size: usize,
    /// Largest number of bytes a packet buffer may hold.
    pub max_buffer_size: usize,
    /// Initial packet buffer capacity.
    pub buffer_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl CodecConfig {
    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(EgtsError::Config(format!(
                "max_payload_size {} exceeds protocol maximum {}",
                self.max_payload_size, MAX_PAYLOAD_SIZE
            )));
        }

        if self.max_buffer_size < MAX_PACKET_SIZE {
            return Err(EgtsError::Config(format!(
                "max_buffer_size {} is smaller than one packet ({})",
                self.max_buffer_size, MAX_PACKET_SIZE
            )));
        }

        Ok(())
    }
}
