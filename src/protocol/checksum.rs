//! Header and payload checksums.
//!
//! - HCS: CRC-8, polynomial 0x31, init 0xFF, no reflection (CRC-8/NRSC-5)
//! - SFRCS: CRC-16, polynomial 0x1021, init 0xFFFF, no reflection
//!   (CRC-16/CCITT-FALSE, catalogued as CRC-16/IBM-3740)

use crc::{Crc, CRC_16_IBM_3740, CRC_8_NRSC_5};

const HEADER_CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);
const PAYLOAD_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// CRC-8 of the header bytes preceding HCS.
#[inline]
pub fn header_crc(data: &[u8]) -> u8 {
    HEADER_CRC.checksum(data)
}

/// CRC-16 of the SFRD bytes.
///
/// Only meaningful for non-empty payloads: a packet with FDL = 0 carries
/// no SFRCS at all.
#[inline]
pub fn payload_crc(data: &[u8]) -> u16 {
    PAYLOAD_CRC.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_crc_check_value() {
        assert_eq!(header_crc(b"123456789"), 0xF7);
    }

    #[test]
    fn test_payload_crc_check_value() {
        assert_eq!(payload_crc(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_header_crc_known_header() {
        // PRV=1 SKID=0 flags=0 HL=11 HE=0 FDL=3 PID=1 PT=1
        let header = [0x01, 0x00, 0x00, 0x0B, 0x00, 0x03, 0x00, 0x01, 0x00, 0x01];
        assert_eq!(header_crc(&header), 0x27);
    }

    #[test]
    fn test_payload_crc_known_payload() {
        assert_eq!(payload_crc(&[0x01, 0x02, 0x03]), 0xADAD);
    }

    #[test]
    fn test_empty_inputs_yield_init_values() {
        assert_eq!(header_crc(&[]), 0xFF);
        assert_eq!(payload_crc(&[]), 0xFFFF);
    }

    #[test]
    fn test_deterministic() {
        let data = b"telematics";
        assert_eq!(header_crc(data), header_crc(data));
        assert_eq!(payload_crc(data), payload_crc(data));
    }

    #[test]
    fn test_single_bit_flip_changes_crc() {
        let data = [0x10u8, 0x20, 0x30, 0x40];
        let crc8 = header_crc(&data);
        let crc16 = payload_crc(&data);
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[i] ^= 1 << bit;
                assert_ne!(header_crc(&flipped), crc8);
                assert_ne!(payload_crc(&flipped), crc16);
            }
        }
    }
}
