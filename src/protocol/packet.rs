//! Packet struct composing header, payload and payload checksum.
//!
//! ```text
//! ┌────────────────┬──────────────┬──────────────────────┐
//! │ Header (HL)    │ SFRD (FDL)   │ SFRCS (2 LE, FDL > 0) │
//! └────────────────┴──────────────┴──────────────────────┘
//! ```
//!
//! The packet computes FDL from its payload, so the two cannot drift.
//! SFRCS is written only for non-empty payloads.
//!
//! # Example
//!
//! ```
//! use egts_transport::protocol::{Header, Packet, PacketType};
//! use bytes::Bytes;
//!
//! let header = Header::new(1, PacketType::AppData);
//! let packet = Packet::new(header, Bytes::from_static(&[1, 2, 3])).unwrap();
//! let bytes = packet.encode().unwrap();
//! assert_eq!(bytes.len(), 16);
//!
//! let decoded = Packet::decode(&bytes).unwrap();
//! assert_eq!(decoded, packet);
//! ```

use std::ops::Range;

use bytes::{BufMut, Bytes};

use super::checksum::payload_crc;
use super::header::{Header, PacketType, MAX_PAYLOAD_SIZE, PAYLOAD_CRC_LEN};
use super::response::{ResponseBody, ResultCode};
use crate::error::{DecodeError, EncodeError};

/// A complete Transport Layer packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: Header,
    payload: Bytes,
}

/// Where the pieces of one frame sit inside a buffer.
#[derive(Debug, Clone)]
pub(crate) struct FrameLayout {
    pub(crate) header: Header,
    pub(crate) payload: Range<usize>,
    pub(crate) len: usize,
}

impl Packet {
    /// Create a packet, setting the header's FDL from the payload length.
    pub fn new(header: Header, payload: Bytes) -> Result<Self, EncodeError> {
        let frame_data_length = payload_length(payload.len())?;
        Ok(Self {
            header: header.with_frame_data_length(frame_data_length),
            payload,
        })
    }

    /// Create a packet from header and raw bytes (copies data).
    pub fn from_parts(header: Header, payload: &[u8]) -> Result<Self, EncodeError> {
        Self::new(header, Bytes::copy_from_slice(payload))
    }

    /// Build an acknowledgement for `to` carrying `result`.
    ///
    /// ```
    /// use egts_transport::protocol::{Packet, ResultCode};
    ///
    /// let ack = Packet::response(2, 1, ResultCode::Ok);
    /// let body = ack.response_body().unwrap().unwrap();
    /// assert_eq!(body.response_packet_id, 1);
    /// ```
    pub fn response(packet_id: u16, to: u16, result: ResultCode) -> Self {
        let body = ResponseBody::new(to, result).encode();
        let header = Header::new(packet_id, PacketType::Response)
            .with_frame_data_length(body.len() as u16);
        Self {
            header,
            payload: Bytes::copy_from_slice(&body),
        }
    }

    /// Get a reference to the header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the payload length (FDL).
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the packet identifier.
    #[inline]
    pub fn packet_id(&self) -> u16 {
        self.header.packet_id
    }

    /// Typed packet type, if known.
    #[inline]
    pub fn packet_type(&self) -> Option<PacketType> {
        self.header.kind()
    }

    /// SFRCS, or `None` for a header-only packet.
    pub fn payload_checksum(&self) -> Option<u16> {
        if self.payload.is_empty() {
            None
        } else {
            Some(payload_crc(&self.payload))
        }
    }

    /// Total encoded length: header, payload and SFRCS if present.
    pub fn encoded_len(&self) -> usize {
        frame_len(self.header.encoded_len(), self.payload.len())
    }

    /// Parse the RPID + PR prefix of a response packet.
    ///
    /// Returns `None` if this is not a response.
    pub fn response_body(&self) -> Option<Result<ResponseBody, DecodeError>> {
        if !self.header.is_response() {
            return None;
        }
        Some(ResponseBody::decode(&self.payload).map(|(body, _)| body))
    }

    /// Split into header and payload.
    pub fn into_parts(self) -> (Header, Bytes) {
        (self.header, self.payload)
    }

    /// Encode to a single contiguous byte vector.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.header.encode_into(&mut buf)?;
        if !self.payload.is_empty() {
            buf.extend_from_slice(&self.payload);
            buf.put_u16_le(payload_crc(&self.payload));
        }
        Ok(buf)
    }

    /// Decode a packet from the start of `buf`; trailing bytes are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_prefix(buf).map(|(packet, _)| packet)
    }

    /// Decode a packet from the start of `buf`, returning the bytes consumed.
    pub fn decode_prefix(buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        let layout = parse_frame(buf, MAX_PAYLOAD_SIZE)?;
        let packet = Self {
            header: layout.header,
            payload: Bytes::copy_from_slice(&buf[layout.payload]),
        };
        Ok((packet, layout.len))
    }

    /// Decode from an owned buffer, sharing its memory for the payload.
    pub(crate) fn from_frame(frame: Bytes, layout: FrameLayout) -> Self {
        Self {
            header: layout.header,
            payload: frame.slice(layout.payload),
        }
    }
}

fn payload_length(len: usize) -> Result<u16, EncodeError> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(EncodeError::InvalidField {
            field: "FDL",
            value: u32::try_from(len).unwrap_or(u32::MAX),
            limit: MAX_PAYLOAD_SIZE as u32,
        });
    }
    Ok(len as u16)
}

#[inline]
fn frame_len(header_len: usize, payload_len: usize) -> usize {
    let crc_len = if payload_len > 0 { PAYLOAD_CRC_LEN } else { 0 };
    header_len + payload_len + crc_len
}

/// Locate and verify one frame at the start of `buf`.
///
/// `Start → HeaderParsed → PayloadRead → ChecksumValidated | ChecksumFailed`
pub(crate) fn parse_frame(buf: &[u8], max_payload_size: usize) -> Result<FrameLayout, DecodeError> {
    let (header, header_len) = Header::decode(buf)?;

    let payload_len = usize::from(header.frame_data_length);
    if payload_len > max_payload_size {
        return Err(DecodeError::PayloadTooLarge {
            length: payload_len,
            max: max_payload_size,
        });
    }

    let len = frame_len(header_len, payload_len);
    if buf.len() < len {
        return Err(DecodeError::Truncated {
            needed: len,
            available: buf.len(),
        });
    }

    let payload = header_len..header_len + payload_len;
    if payload_len > 0 {
        let offset = payload.end;
        let actual = u16::from_le_bytes([buf[offset], buf[offset + 1]]);
        let expected = payload_crc(&buf[payload.clone()]);
        if expected != actual {
            return Err(DecodeError::PayloadChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }
    }

    Ok(FrameLayout {
        header,
        payload,
        len,
    })
}

/// Build a complete packet as a single byte vector.
///
/// FDL is taken from `payload`, whatever the header carries.
///
/// # Example
///
/// ```
/// use egts_transport::protocol::{build_packet, Header, PacketType, Route};
///
/// let header = Header::new(1, PacketType::AppData).with_route(Route::new(100, 200, 5));
/// let bytes = build_packet(&header, &[1, 2, 3]).unwrap();
/// assert_eq!(bytes.len(), 16 + 3 + 2);
/// ```
pub fn build_packet(header: &Header, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    Packet::from_parts(*header, payload)?.encode()
}

/// Decode a complete packet (standalone function).
#[inline]
pub fn decode_packet(buf: &[u8]) -> Result<Packet, DecodeError> {
    Packet::decode(buf)
}
