//! Transport Layer header encoding and decoding.
//!
//! ```text
//! ┌─────┬──────┬───────┬────┬────┬─────────┬─────────┬────┬─────────┬─────────┬─────┬─────┐
//! │ PRV │ SKID │ flags │ HL │ HE │ FDL     │ PID     │ PT │ PRA     │ RCA     │ TTL │ HCS │
//! │ 1   │ 1    │ 1     │ 1  │ 1  │ 2 LE    │ 2 LE    │ 1  │ 2 LE    │ 2 LE    │ 1   │ 1   │
//! └─────┴──────┴───────┴────┴────┴─────────┴─────────┴────┴─────────┴─────────┴─────┴─────┘
//!                                                          └──── present iff RTE = 1 ───┘
//! ```
//!
//! The flags byte is `PRF(2) RTE(1) ENA(2) CMP(1) PR(2)`, most-significant
//! bit first. HL counts every header byte including HCS: 11 without the
//! routing block, 16 with it. HCS is the CRC-8 of all bytes before it.

use bytes::{Buf, BufMut};

use super::bitfield;
use super::checksum::header_crc;
use crate::error::{BitFieldError, DecodeError, EncodeError};

/// Header version understood by this codec (PRV).
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Header prefix defined for this version (PRF).
pub const HEADER_PREFIX: u8 = 0;

/// Header length without the routing block, HCS included.
pub const HEADER_LEN: usize = 11;

/// Header length with PRA, RCA and TTL present, HCS included.
pub const ROUTED_HEADER_LEN: usize = 16;

/// Size of the routing block (PRA + RCA + TTL).
pub const ROUTE_LEN: usize = 5;

/// Size of SFRCS when present.
pub const PAYLOAD_CRC_LEN: usize = 2;

/// Largest complete Transport Layer packet.
pub const MAX_PACKET_SIZE: usize = 65_535;

/// Largest SFRD that still fits a routed packet.
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - ROUTED_HEADER_LEN - PAYLOAD_CRC_LEN;

/// Offset of HL; the minimum prefix needed to size a header.
const HL_OFFSET: usize = 3;

/// Flags byte layout.
pub mod flags {
    use super::bitfield;
    use crate::error::BitFieldError;

    /// Field widths, most-significant first: PRF, RTE, ENA, CMP, PR.
    pub const WIDTHS: [u8; 5] = [2, 1, 2, 1, 2];

    /// PRF bits 7-6.
    pub const PRF_MASK: u8 = 0b1100_0000;
    /// RTE bit 5.
    pub const RTE: u8 = 0b0010_0000;
    /// ENA bits 4-3.
    pub const ENA_MASK: u8 = 0b0001_1000;
    /// CMP bit 2.
    pub const CMP: u8 = 0b0000_0100;
    /// PR bits 1-0.
    pub const PR_MASK: u8 = 0b0000_0011;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }

    /// Unpacked flags byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags {
        pub prefix: u8,
        pub route: bool,
        pub encryption: u8,
        pub compressed: bool,
        pub priority: u8,
    }

    impl Flags {
        /// Pack into the wire byte, rejecting values wider than their field.
        pub fn pack(&self) -> Result<u8, BitFieldError> {
            bitfield::pack(&[
                (self.prefix, WIDTHS[0]),
                (u8::from(self.route), WIDTHS[1]),
                (self.encryption, WIDTHS[2]),
                (u8::from(self.compressed), WIDTHS[3]),
                (self.priority, WIDTHS[4]),
            ])
        }

        /// Unpack a wire byte. Every byte is a valid flags byte.
        pub fn unpack(byte: u8) -> Self {
            let [prefix, route, encryption, compressed, priority] =
                match bitfield::unpack(byte, WIDTHS) {
                    Ok(fields) => fields,
                    Err(_) => unreachable!("flag widths total 8 bits"),
                };
            Self {
                prefix,
                route: route == 1,
                encryption,
                compressed: compressed == 1,
                priority,
            }
        }
    }
}

/// Transport Layer packet type (PT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Acknowledgement of a transport packet (EGTS_PT_RESPONSE).
    Response = 0,
    /// Service-layer data (EGTS_PT_APPDATA).
    AppData = 1,
    /// Service-layer data with a digital signature (EGTS_PT_SIGNED_APPDATA).
    SignedAppData = 2,
}

impl PacketType {
    /// Convert from the wire byte.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PacketType::Response),
            1 => Some(PacketType::AppData),
            2 => Some(PacketType::SignedAppData),
            _ => None,
        }
    }
}

impl From<PacketType> for u8 {
    #[inline]
    fn from(value: PacketType) -> Self {
        value as u8
    }
}

/// Routing block, present when RTE = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    /// Address of the platform that generated the packet (PRA).
    pub sender: u16,
    /// Address of the platform the packet is destined for (RCA).
    pub recipient: u16,
    /// Remaining routing hops (TTL).
    pub ttl: u8,
}

impl Route {
    /// Create a routing block.
    pub fn new(sender: u16, recipient: u16, ttl: u8) -> Self {
        Self {
            sender,
            recipient,
            ttl,
        }
    }

    /// The route for the next hop, or `None` once the hop budget is spent.
    pub fn forwarded(&self) -> Option<Self> {
        let ttl = self.ttl.checked_sub(1)?;
        Some(Self { ttl, ..*self })
    }
}

/// Decoded Transport Layer header.
///
/// HCS is not stored: it is computed by [`Header::encode`] and verified by
/// [`Header::decode`], so a decoded header compares equal to the one that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Header structure version (PRV).
    pub version: u8,
    /// Encryption key identifier (SKID).
    pub security_key_id: u8,
    /// Header prefix (PRF), 2 bits.
    pub prefix: u8,
    /// Encryption algorithm (ENA), 2 bits; 0 = none.
    pub encryption: u8,
    /// SFRD is compressed (CMP).
    pub compressed: bool,
    /// Routing priority (PR), 2 bits; 0 = highest.
    pub priority: u8,
    /// Header length including HCS (HL).
    pub header_length: u8,
    /// Header encoding method (HE).
    pub header_encoding: u8,
    /// SFRD length in bytes (FDL).
    pub frame_data_length: u16,
    /// Cyclic packet identifier (PID).
    pub packet_id: u16,
    /// Packet type (PT), kept raw so unknown types round-trip.
    pub packet_type: u8,
    /// Routing block; `Some` iff RTE = 1.
    pub route: Option<Route>,
}

impl Header {
    /// Create an unrouted version-1 header with every flag cleared.
    pub fn new(packet_id: u16, packet_type: PacketType) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            security_key_id: 0,
            prefix: HEADER_PREFIX,
            encryption: 0,
            compressed: false,
            priority: 0,
            header_length: HEADER_LEN as u8,
            header_encoding: 0,
            frame_data_length: 0,
            packet_id,
            packet_type: packet_type.into(),
            route: None,
        }
    }

    /// Attach a routing block (sets RTE and HL).
    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self.header_length = ROUTED_HEADER_LEN as u8;
        self
    }

    /// Remove the routing block (clears RTE and resets HL).
    pub fn without_route(mut self) -> Self {
        self.route = None;
        self.header_length = HEADER_LEN as u8;
        self
    }

    /// Set the routing priority (PR).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Set the encryption algorithm (ENA) and key id (SKID).
    pub fn with_encryption(mut self, algorithm: u8, key_id: u8) -> Self {
        self.encryption = algorithm;
        self.security_key_id = key_id;
        self
    }

    /// Mark the SFRD as compressed (CMP).
    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Set the header encoding method (HE).
    pub fn with_header_encoding(mut self, encoding: u8) -> Self {
        self.header_encoding = encoding;
        self
    }

    /// Set SFRD length (FDL).
    pub fn with_frame_data_length(mut self, length: u16) -> Self {
        self.frame_data_length = length;
        self
    }

    /// Header length implied by RTE, HCS included.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        if self.route.is_some() {
            ROUTED_HEADER_LEN
        } else {
            HEADER_LEN
        }
    }

    /// RTE flag.
    #[inline]
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Typed packet type, if known.
    #[inline]
    pub fn kind(&self) -> Option<PacketType> {
        PacketType::from_u8(self.packet_type)
    }

    /// Whether this acknowledges another transport packet.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.packet_type == PacketType::Response as u8
    }

    /// The flags byte fields.
    pub fn flags(&self) -> flags::Flags {
        flags::Flags {
            prefix: self.prefix,
            route: self.route.is_some(),
            encryption: self.encryption,
            compressed: self.compressed,
            priority: self.priority,
        }
    }

    /// Check every encode-time constraint without writing bytes.
    ///
    /// Fails with [`EncodeError::InvalidField`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), EncodeError> {
        let widths = flags::WIDTHS;
        check_width("PRF", self.prefix, widths[0])?;
        check_width("ENA", self.encryption, widths[2])?;
        check_width("PR", self.priority, widths[4])?;

        if self.encryption == 0 && self.security_key_id != 0 {
            return Err(EncodeError::InvalidField {
                field: "SKID",
                value: self.security_key_id.into(),
                limit: 0,
            });
        }

        let expected = self.encoded_len();
        if usize::from(self.header_length) != expected {
            return Err(EncodeError::InvalidField {
                field: "HL",
                value: self.header_length.into(),
                limit: expected as u32,
            });
        }

        if usize::from(self.frame_data_length) > MAX_PAYLOAD_SIZE {
            return Err(EncodeError::InvalidField {
                field: "FDL",
                value: self.frame_data_length.into(),
                limit: MAX_PAYLOAD_SIZE as u32,
            });
        }

        Ok(())
    }

    /// Encode header to bytes, HCS appended.
    ///
    /// # Example
    ///
    /// ```
    /// use egts_transport::protocol::{Header, PacketType};
    ///
    /// let header = Header::new(1, PacketType::AppData).with_frame_data_length(3);
    /// let bytes = header.encode().unwrap();
    /// assert_eq!(bytes.len(), 11);
    /// assert_eq!(bytes[10], 0x27);
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Append the encoded header to `buf`, returning the bytes written.
    ///
    /// Nothing is written if validation fails.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        self.validate()?;
        let flags = self.flags().pack()?;

        let start = buf.len();
        buf.put_u8(self.version);
        buf.put_u8(self.security_key_id);
        buf.put_u8(flags);
        buf.put_u8(self.header_length);
        buf.put_u8(self.header_encoding);
        buf.put_u16_le(self.frame_data_length);
        buf.put_u16_le(self.packet_id);
        buf.put_u8(self.packet_type);
        if let Some(route) = &self.route {
            buf.put_u16_le(route.sender);
            buf.put_u16_le(route.recipient);
            buf.put_u8(route.ttl);
        }
        let hcs = header_crc(&buf[start..]);
        buf.put_u8(hcs);

        Ok(buf.len() - start)
    }

    /// Decode a header from the start of `buf`.
    ///
    /// Returns the header and the number of bytes it occupied (HL). Trailing
    /// bytes are left for the caller.
    ///
    /// # Example
    ///
    /// ```
    /// use egts_transport::protocol::Header;
    ///
    /// let bytes = [0x01, 0x00, 0x00, 0x0B, 0x00, 0x03, 0x00, 0x01, 0x00, 0x01, 0x27];
    /// let (header, consumed) = Header::decode(&bytes).unwrap();
    /// assert_eq!(consumed, 11);
    /// assert_eq!(header.packet_id, 1);
    /// assert_eq!(header.frame_data_length, 3);
    /// ```
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        if buf.len() <= HL_OFFSET {
            return Err(DecodeError::Truncated {
                needed: HL_OFFSET + 1,
                available: buf.len(),
            });
        }

        let header_length = buf[HL_OFFSET];
        let span = usize::from(header_length);
        if span == 0 {
            return Err(DecodeError::InvalidHeaderLength {
                declared: header_length,
                expected: HEADER_LEN as u8,
            });
        }
        if buf.len() < span {
            return Err(DecodeError::Truncated {
                needed: span,
                available: buf.len(),
            });
        }

        let hcs_offset = span - 1;
        let expected = header_crc(&buf[..hcs_offset]);
        let actual = buf[hcs_offset];
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch {
                offset: hcs_offset,
                expected,
                actual,
            });
        }

        let version = buf[0];
        if version != PROTOCOL_VERSION {
            return Err(DecodeError::UnsupportedVersion { version });
        }

        let flags = flags::Flags::unpack(buf[2]);
        if flags.prefix != HEADER_PREFIX {
            return Err(DecodeError::UnsupportedPrefix {
                prefix: flags.prefix,
            });
        }

        let layout_len = if flags.route {
            ROUTED_HEADER_LEN
        } else {
            HEADER_LEN
        };
        if span != layout_len {
            return Err(DecodeError::InvalidHeaderLength {
                declared: header_length,
                expected: layout_len as u8,
            });
        }

        let mut cursor = &buf[..hcs_offset];
        let version = cursor.get_u8();
        let security_key_id = cursor.get_u8();
        cursor.advance(2); // flags, HL
        let header_encoding = cursor.get_u8();
        let frame_data_length = cursor.get_u16_le();
        let packet_id = cursor.get_u16_le();
        let packet_type = cursor.get_u8();
        let route = if flags.route {
            Some(Route {
                sender: cursor.get_u16_le(),
                recipient: cursor.get_u16_le(),
                ttl: cursor.get_u8(),
            })
        } else {
            None
        };

        let header = Self {
            version,
            security_key_id,
            prefix: flags.prefix,
            encryption: flags.encryption,
            compressed: flags.compressed,
            priority: flags.priority,
            header_length,
            header_encoding,
            frame_data_length,
            packet_id,
            packet_type,
            route,
        };
        Ok((header, span))
    }
}

fn check_width(field: &'static str, value: u8, width: u8) -> Result<(), EncodeError> {
    if bitfield::fits(value, width) {
        Ok(())
    } else {
        Err(EncodeError::InvalidField {
            field,
            value: value.into(),
            limit: bitfield::max_value(width).into(),
        })
    }
}

/// Encode a header to bytes (standalone function).
#[inline]
pub fn encode_header(header: &Header) -> Result<Vec<u8>, EncodeError> {
    header.encode()
}

/// Decode a header from bytes (standalone function).
#[inline]
pub fn decode_header(buf: &[u8]) -> Result<(Header, usize), DecodeError> {
    Header::decode(buf)
}

/// Pack the flags byte from raw field values (standalone function).
#[inline]
pub fn pack_flags(
    prefix: u8,
    route: bool,
    encryption: u8,
    compressed: bool,
    priority: u8,
) -> Result<u8, BitFieldError> {
    flags::Flags {
        prefix,
        route,
        encryption,
        compressed,
        priority,
    }
    .pack()
}
