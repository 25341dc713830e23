//! # egts-transport
//!
//! Codec for the Transport Layer packet of the EGTS telematics protocol,
//! used by vehicle-tracking terminals to exchange data with a dispatch
//! platform.
//!
//! ## Architecture
//!
//! - **Header codec**: fixed and routed header layouts, bit-packed flags
//!   byte, CRC-8 header checksum (HCS)
//! - **Packet codec**: header + opaque service-layer payload (SFRD) +
//!   CRC-16 payload checksum (SFRCS)
//! - **Packet buffer**: reassembles packets from a byte stream
//!
//! Every codec operation is a pure function over its input buffer.
//!
//! ## Example
//!
//! ```
//! use egts_transport::protocol::{Header, Packet, PacketIdCounter, PacketType};
//!
//! let pids = PacketIdCounter::new();
//! let header = Header::new(pids.next(), PacketType::AppData);
//! let packet = Packet::from_parts(header, &[0x01, 0x02, 0x03]).unwrap();
//!
//! let bytes = packet.encode().unwrap();
//! assert_eq!(bytes.len(), 16);
//! assert_eq!(Packet::decode(&bytes).unwrap(), packet);
//! ```

pub mod config;
pub mod error;
pub mod protocol;

mod codec;

pub use codec::PacketCodec;
pub use config::CodecConfig;
pub use error::{BitFieldError, DecodeError, EgtsError, EncodeError};
