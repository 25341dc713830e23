//! Transport Layer acknowledgement body.
//!
//! A packet with PT = 0 starts its SFRD with the id of the packet being
//! acknowledged and a processing result:
//!
//! ```text
//! ┌──────────┬────┬──────────────────────────┐
//! │ RPID     │ PR │ service records (opaque) │
//! │ 2 LE     │ 1  │ FDL - 3                  │
//! └──────────┴────┴──────────────────────────┘
//! ```

use bytes::{Buf, BufMut};

use crate::error::DecodeError;

/// Size of the RPID + PR prefix.
pub const RESPONSE_BODY_LEN: usize = 3;

/// Processing result codes reported in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    /// Processed successfully (EGTS_PC_OK).
    Ok = 0,
    /// Accepted, processing continues (EGTS_PC_IN_PROGRESS).
    InProgress = 1,
    /// Protocol version or prefix not supported (EGTS_PC_UNS_PROTOCOL).
    UnsupportedProtocol = 128,
    /// SFRD could not be decrypted (EGTS_PC_DECRYPT_ERROR).
    DecryptError = 129,
    /// Processing refused (EGTS_PC_PROC_DENIED).
    ProcessingDenied = 130,
    /// Malformed header (EGTS_PC_INC_HEADERFORM).
    IncorrectHeaderForm = 131,
    /// Malformed SFRD (EGTS_PC_INC_DATAFORM).
    IncorrectDataForm = 132,
    /// Packet type not supported (EGTS_PC_UNS_TYPE).
    UnsupportedType = 133,
    /// Packet already processed (EGTS_PC_DBL_PROC).
    DuplicateProcessing = 135,
    /// HCS mismatch (EGTS_PC_HEADERCRC_ERROR).
    HeaderCrcError = 137,
    /// SFRCS mismatch (EGTS_PC_DATACRC_ERROR).
    DataCrcError = 138,
    /// FDL inconsistent with the data received (EGTS_PC_INVDATALEN).
    InvalidDataLength = 139,
    /// Hop budget exhausted while routing (EGTS_PC_TTLEXPIRED).
    TtlExpired = 144,
}

impl ResultCode {
    /// Convert from the wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => ResultCode::Ok,
            1 => ResultCode::InProgress,
            128 => ResultCode::UnsupportedProtocol,
            129 => ResultCode::DecryptError,
            130 => ResultCode::ProcessingDenied,
            131 => ResultCode::IncorrectHeaderForm,
            132 => ResultCode::IncorrectDataForm,
            133 => ResultCode::UnsupportedType,
            135 => ResultCode::DuplicateProcessing,
            137 => ResultCode::HeaderCrcError,
            138 => ResultCode::DataCrcError,
            139 => ResultCode::InvalidDataLength,
            144 => ResultCode::TtlExpired,
            _ => return None,
        })
    }

    /// Whether the code reports success.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Ok | ResultCode::InProgress)
    }
}

impl From<ResultCode> for u8 {
    #[inline]
    fn from(value: ResultCode) -> Self {
        value as u8
    }
}

/// RPID + PR prefix of a response SFRD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseBody {
    /// PID of the acknowledged packet (RPID).
    pub response_packet_id: u16,
    /// Raw processing result (PR); see [`ResultCode`].
    pub result: u8,
}

impl ResponseBody {
    /// Create a response body.
    pub fn new(response_packet_id: u16, result: ResultCode) -> Self {
        Self {
            response_packet_id,
            result: result.into(),
        }
    }

    /// Typed result, if known.
    #[inline]
    pub fn result_code(&self) -> Option<ResultCode> {
        ResultCode::from_u8(self.result)
    }

    /// Encode the 3-byte prefix.
    pub fn encode(&self) -> [u8; RESPONSE_BODY_LEN] {
        let mut buf = [0u8; RESPONSE_BODY_LEN];
        let mut cursor = &mut buf[..];
        cursor.put_u16_le(self.response_packet_id);
        cursor.put_u8(self.result);
        buf
    }

    /// Decode the prefix, returning it and the remaining service records.
    pub fn decode(sfrd: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if sfrd.len() < RESPONSE_BODY_LEN {
            return Err(DecodeError::Truncated {
                needed: RESPONSE_BODY_LEN,
                available: sfrd.len(),
            });
        }
        let mut cursor = sfrd;
        let body = Self {
            response_packet_id: cursor.get_u16_le(),
            result: cursor.get_u8(),
        };
        Ok((body, cursor))
    }
}
