//! Packet buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management. The packet codec
//! only decodes one contiguous frame; this buffer sits at the transport
//! boundary, appends socket reads, and re-runs the whole-frame decode
//! whenever it previously reported `Truncated`.
//!
//! # Example
//!
//! ```
//! use egts_transport::protocol::{build_packet, Header, PacketBuffer, PacketType};
//!
//! let bytes = build_packet(&Header::new(1, PacketType::AppData), b"hi").unwrap();
//!
//! let mut buffer = PacketBuffer::new();
//! assert!(buffer.push(&bytes[..5]).unwrap().is_empty());
//! let packets = buffer.push(&bytes[5..]).unwrap();
//! assert_eq!(packets[0].payload(), b"hi");
//! ```

use bytes::BytesMut;

use super::packet::parse_frame;
use super::Packet;
use crate::config::CodecConfig;
use crate::error::DecodeError;

/// Buffer for accumulating incoming bytes and extracting complete packets.
pub struct PacketBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Limits for payload size and buffered bytes.
    config: CodecConfig,
}

impl PacketBuffer {
    /// Create a new packet buffer with default settings.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create a new packet buffer with custom limits.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(config.buffer_capacity),
            config,
        }
    }

    /// Push data into the buffer and extract all complete packets.
    ///
    /// Partial data stays buffered for the next push.
    ///
    /// # Errors
    ///
    /// Returns the decode error of a corrupt frame at the front of the
    /// buffer. The corrupt bytes stay in place, so the caller decides whether
    /// to [`skip`](Self::skip) past them or [`clear`](Self::clear) the stream.
    /// Packets preceding a corrupt frame are returned first; the error is
    /// reported by the following push.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Packet>, DecodeError> {
        let size = self.buffer.len() + data.len();
        if size > self.config.max_buffer_size {
            return Err(DecodeError::BufferOverflow {
                size,
                max: self.config.max_buffer_size,
            });
        }
        self.buffer.extend_from_slice(data);

        let mut layouts = Vec::new();
        let mut offset = 0;
        loop {
            match parse_frame(&self.buffer[offset..], self.config.max_payload_size) {
                Ok(layout) => {
                    offset += layout.len;
                    layouts.push(layout);
                }
                Err(e) if e.is_truncated() => {
                    tracing::debug!(
                        buffered = self.buffer.len() - offset,
                        "Waiting for more bytes: {}",
                        e
                    );
                    break;
                }
                Err(e) if layouts.is_empty() => {
                    tracing::warn!("Corrupt frame in stream: {}", e);
                    return Err(e);
                }
                Err(_) => break,
            }
        }

        let mut packets = Vec::with_capacity(layouts.len());
        for layout in layouts {
            let frame = self.buffer.split_to(layout.len).freeze();
            let packet = Packet::from_frame(frame, layout);
            tracing::trace!(packet_id = packet.packet_id(), "Extracted packet");
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Append data to the buffer without extracting packets.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Drop `n` bytes from the front of the buffer, e.g. to resynchronise
    /// after a corrupt frame.
    pub fn skip(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        let _ = self.buffer.split_to(n);
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}
