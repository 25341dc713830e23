//! Configured packet codec.
//!
//! Wraps the free encode/decode functions with configured limits and
//! tracing. Holds no mutable state, so one instance can be shared by
//! every connection handler.
//!
//! # Example
//!
//! ```
//! use egts_transport::{CodecConfig, PacketCodec};
//! use egts_transport::protocol::{Header, PacketType};
//!
//! let codec = PacketCodec::new(CodecConfig::default()).unwrap();
//! let bytes = codec.encode(Header::new(1, PacketType::AppData), &[1, 2, 3]).unwrap();
//! let packet = codec.decode(&bytes).unwrap();
//! assert_eq!(packet.payload(), &[1, 2, 3]);
//! ```

use bytes::Bytes;

use crate::config::CodecConfig;
use crate::error::{EgtsError, EncodeError, Result};
use crate::protocol::{parse_frame, Header, Packet};

/// Packet encoder/decoder bound to a [`CodecConfig`].
#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    config: CodecConfig,
}

impl PacketCodec {
    /// Create a codec, validating the configuration.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a codec from a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            config: CodecConfig::from_json(json)?,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode `header` and `payload` into a frame; FDL is set from `payload`.
    pub fn encode(&self, header: Header, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > self.config.max_payload_size {
            return Err(EgtsError::Encode(EncodeError::InvalidField {
                field: "FDL",
                value: u32::try_from(payload.len()).unwrap_or(u32::MAX),
                limit: self.config.max_payload_size as u32,
            }));
        }
        let packet = Packet::from_parts(header, payload)?;
        self.encode_packet(&packet)
    }

    /// Encode an already assembled packet.
    pub fn encode_packet(&self, packet: &Packet) -> Result<Vec<u8>> {
        let bytes = packet.encode()?;
        tracing::trace!(
            packet_id = packet.packet_id(),
            len = bytes.len(),
            "Encoded packet"
        );
        Ok(bytes)
    }

    /// Decode exactly one frame from the start of `buf`.
    pub fn decode(&self, buf: &[u8]) -> Result<Packet> {
        let (packet, _) = self.decode_prefix(buf)?;
        Ok(packet)
    }

    /// Decode one frame from the start of `buf`, returning the bytes consumed.
    pub fn decode_prefix(&self, buf: &[u8]) -> Result<(Packet, usize)> {
        match parse_frame(buf, self.config.max_payload_size) {
            Ok(layout) => {
                let len = layout.len;
                let frame = Bytes::copy_from_slice(&buf[..len]);
                let packet = Packet::from_frame(frame, layout);
                tracing::trace!(
                    packet_id = packet.packet_id(),
                    payload_len = packet.payload_len(),
                    "Decoded packet"
                );
                Ok((packet, len))
            }
            Err(e) if e.is_truncated() => {
                tracing::debug!(available = buf.len(), "Incomplete frame: {}", e);
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(code = ?e.result_code(), "Rejected frame: {}", e);
                Err(e.into())
            }
        }
    }
}
