//! Protocol module - wire format, checksums, and packet framing.
//!
//! This module implements the EGTS Transport Layer:
//! - 11- or 16-byte header encoding/decoding with CRC-8 (HCS)
//! - Packet composition with CRC-16 payload checksum (SFRCS)
//! - Bit-field packing for the flags byte
//! - Packet buffer for accumulating partial reads
//! - Cyclic packet identifiers

pub mod bitfield;
pub mod checksum;
mod header;
mod packet;
mod packet_buffer;
mod packet_id;
mod response;

pub use header::{
    decode_header, encode_header, flags, pack_flags, Header, PacketType, Route, HEADER_LEN,
    HEADER_PREFIX, MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE, PAYLOAD_CRC_LEN, PROTOCOL_VERSION,
    ROUTED_HEADER_LEN, ROUTE_LEN,
};
pub use packet::{build_packet, decode_packet, Packet};
pub use packet_buffer::PacketBuffer;
pub use packet_id::{distance, is_newer, successor, PacketIdCounter, HALF_RANGE};
pub use response::{ResponseBody, ResultCode, RESPONSE_BODY_LEN};

pub(crate) use packet::parse_frame;
