//! Error types for egts-transport.

use thiserror::Error;

use crate::protocol::ResultCode;

/// Failure packing or unpacking a bit-field byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitFieldError {
    /// A value does not fit its declared width.
    #[error("bit-field {index}: value {value} does not fit in {width} bits")]
    Overflow { index: usize, value: u8, width: u8 },

    /// Field widths do not add up to exactly 8 bits.
    #[error("bit-field widths sum to {total} bits, expected 8")]
    WidthMismatch { total: u32 },
}

/// Failure encoding a header or packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A caller-supplied field is out of range.
    #[error("invalid field {field}: value {value}, limit {limit}")]
    InvalidField {
        field: &'static str,
        value: u32,
        limit: u32,
    },

    /// Flags byte could not be packed.
    #[error("flags byte: {0}")]
    BitField(#[from] BitFieldError),
}

/// Failure decoding a header or packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes are available than the frame declares.
    #[error("truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// HCS does not match the CRC-8 of the header bytes.
    #[error("header checksum mismatch at offset {offset}: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { offset: usize, expected: u8, actual: u8 },

    /// SFRCS does not match the CRC-16 of the payload.
    #[error("payload checksum mismatch at offset {offset}: expected {expected:#06x}, got {actual:#06x}")]
    PayloadChecksumMismatch {
        offset: usize,
        expected: u16,
        actual: u16,
    },

    /// PRV is not a header version this codec understands.
    #[error("unsupported protocol version {version}")]
    UnsupportedVersion { version: u8 },

    /// PRF is not the prefix defined for this protocol version.
    #[error("unsupported header prefix {prefix}")]
    UnsupportedPrefix { prefix: u8 },

    /// HL disagrees with the layout implied by RTE.
    #[error("invalid header length {declared}, expected {expected}")]
    InvalidHeaderLength { declared: u8, expected: u8 },

    /// FDL exceeds the configured payload limit.
    #[error("payload length {length} exceeds maximum {max}")]
    PayloadTooLarge { length: usize, max: usize },

    /// Buffered bytes exceed the configured limit without yielding a packet.
    #[error("buffer size {size} exceeds maximum {max}")]
    BufferOverflow { size: usize, max: usize },
}

impl DecodeError {
    /// Whether more input could turn this failure into a success.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::Truncated { .. })
    }

    /// Processing result a platform reports back for this failure.
    pub fn result_code(&self) -> ResultCode {
        match self {
            DecodeError::Truncated { .. }
            | DecodeError::PayloadTooLarge { .. }
            | DecodeError::BufferOverflow { .. } => ResultCode::InvalidDataLength,
            DecodeError::ChecksumMismatch { .. } => ResultCode::HeaderCrcError,
            DecodeError::PayloadChecksumMismatch { .. } => ResultCode::DataCrcError,
            DecodeError::UnsupportedVersion { .. } | DecodeError::UnsupportedPrefix { .. } => {
                ResultCode::UnsupportedProtocol
            }
            DecodeError::InvalidHeaderLength { .. } => ResultCode::IncorrectHeaderForm,
        }
    }
}

/// Main error type for all egts-transport operations.
#[derive(Debug, Error)]
pub enum EgtsError {
    /// Encoding failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration rejected by validation.
    #[error("config error: {0}")]
    Config(String),

    /// Configuration JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using EgtsError.
pub type Result<T> = std::result::Result<T, EgtsError>;
