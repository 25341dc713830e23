//! Integration tests for egts-transport.
//!
//! These tests verify the integration between different modules.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use egts_transport::protocol::{
    build_packet, Header, Packet, PacketBuffer, PacketIdCounter, PacketType, ResultCode, Route,
    HEADER_LEN, ROUTED_HEADER_LEN,
};
use egts_transport::{CodecConfig, DecodeError, EgtsError, EncodeError, PacketCodec};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scenario_header() -> Header {
    Header::new(1, PacketType::AppData)
}

/// Unrouted app-data packet with a 3-byte payload.
#[test]
fn test_basic_scenario() {
    let payload = [0x01, 0x02, 0x03];
    let bytes = build_packet(&scenario_header(), &payload).unwrap();

    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[3], 11); // HL
    assert_eq!(&bytes[5..7], &[3, 0]); // FDL

    let packet = Packet::decode(&bytes).unwrap();
    let header = packet.header();
    assert_eq!(header.version, 1);
    assert_eq!(header.security_key_id, 0);
    assert_eq!(header.prefix, 0);
    assert!(!header.has_route());
    assert_eq!(header.encryption, 0);
    assert!(!header.compressed);
    assert_eq!(header.priority, 0);
    assert_eq!(header.header_encoding, 0);
    assert_eq!(header.packet_id, 1);
    assert_eq!(header.kind(), Some(PacketType::AppData));
    assert_eq!(header.frame_data_length, 3);
    assert_eq!(packet.payload(), &payload);
}

/// Same packet with a routing block.
#[test]
fn test_routed_scenario() {
    let header = scenario_header().with_route(Route::new(100, 200, 5));
    let bytes = build_packet(&header, &[0x01, 0x02, 0x03]).unwrap();

    assert_eq!(bytes[3] as usize, ROUTED_HEADER_LEN);
    assert_eq!(bytes.len(), ROUTED_HEADER_LEN + 3 + 2);

    let packet = Packet::decode(&bytes).unwrap();
    let route = packet.header().route.unwrap();
    assert_eq!(route.sender, 100);
    assert_eq!(route.recipient, 200);
    assert_eq!(route.ttl, 5);
}

/// Round trip across flag combinations, routing, and payload sizes.
#[test]
fn test_roundtrip_matrix() {
    let payloads: [&[u8]; 4] = [&[], &[0x00], b"service layer records", &[0xFF; 1024]];

    for priority in 0..=3u8 {
        for encryption in 0..=3u8 {
            for compressed in [false, true] {
                for route in [None, Some(Route::new(0x1234, 0xFFFF, 0))] {
                    for payload in payloads {
                        let key_id = if encryption == 0 { 0 } else { 42 };
                        let mut header = Header::new(0xBEEF, PacketType::SignedAppData)
                            .with_priority(priority)
                            .with_encryption(encryption, key_id)
                            .with_compression(compressed);
                        if let Some(route) = route {
                            header = header.with_route(route);
                        }

                        let packet = Packet::from_parts(header, payload).unwrap();
                        let bytes = packet.encode().unwrap();
                        let decoded = Packet::decode(&bytes).unwrap();

                        assert_eq!(decoded, packet);
                        assert_eq!(decoded.payload(), payload);
                    }
                }
            }
        }
    }
}

/// Header-only packets carry no payload and no SFRCS.
#[test]
fn test_header_only_packet() {
    let bytes = build_packet(&scenario_header(), &[]).unwrap();
    assert_eq!(bytes.len(), HEADER_LEN);

    let routed = scenario_header().with_route(Route::new(1, 2, 3));
    let bytes = build_packet(&routed, &[]).unwrap();
    assert_eq!(bytes.len(), ROUTED_HEADER_LEN);

    let packet = Packet::decode(&bytes).unwrap();
    assert_eq!(packet.payload_len(), 0);
    assert_eq!(packet.payload_checksum(), None);
}

/// Any single-bit flip in the header (HL and HCS aside) is a header checksum failure.
#[test]
fn test_header_bit_flips_detected() {
    for header in [
        scenario_header(),
        scenario_header().with_route(Route::new(100, 200, 5)),
    ] {
        let bytes = build_packet(&header, &[0x01, 0x02, 0x03]).unwrap();
        let hcs_offset = header.encoded_len() - 1;

        for offset in (0..hcs_offset).filter(|&o| o != 3) {
            for bit in 0..8 {
                let mut corrupted = bytes.clone();
                corrupted[offset] ^= 1 << bit;
                let result = Packet::decode(&corrupted);
                assert!(
                    matches!(result, Err(DecodeError::ChecksumMismatch { .. })),
                    "offset {offset} bit {bit}: {result:?}"
                );
            }
        }
    }
}

/// A damaged HL byte never yields a packet.
#[test]
fn test_header_length_flips_rejected() {
    let bytes = build_packet(&scenario_header(), &[0x01, 0x02, 0x03]).unwrap();
    for bit in 0..8 {
        let mut corrupted = bytes.clone();
        corrupted[3] ^= 1 << bit;
        assert!(Packet::decode(&corrupted).is_err(), "bit {bit}");
    }
}

/// Any single-byte change in the payload or SFRCS is a payload checksum failure.
#[test]
fn test_payload_byte_flips_detected() {
    let payload: Vec<u8> = (0..64).collect();
    let bytes = build_packet(&scenario_header(), &payload).unwrap();

    for offset in HEADER_LEN..bytes.len() {
        for mask in [0x01u8, 0x80, 0xFF] {
            let mut corrupted = bytes.clone();
            corrupted[offset] ^= mask;
            let result = Packet::decode(&corrupted);
            assert!(
                matches!(result, Err(DecodeError::PayloadChecksumMismatch { .. })),
                "offset {offset} mask {mask:#x}: {result:?}"
            );
        }
    }
}

/// PID survives encode/decode over the whole range and the counter wraps.
#[test]
fn test_packet_id_full_range() {
    for pid in 0..=u16::MAX {
        let bytes = Header::new(pid, PacketType::AppData).encode().unwrap();
        let (header, _) = Header::decode(&bytes).unwrap();
        assert_eq!(header.packet_id, pid);
    }

    let counter = PacketIdCounter::with_start(65535);
    assert_eq!(counter.next(), 65535);
    assert_eq!(counter.next(), 0);
}

/// Bit-field overflow is an error, never a silent mask.
#[test]
fn test_priority_overflow() {
    let header = scenario_header().with_priority(4);
    let result = build_packet(&header, &[1, 2, 3]);
    assert!(matches!(
        result,
        Err(EncodeError::InvalidField {
            field: "PR",
            value: 4,
            ..
        })
    ));
}

/// Truncated input asks for more bytes; completing it succeeds.
#[test]
fn test_truncated_then_complete() {
    let bytes = build_packet(&scenario_header(), b"abcdef").unwrap();

    for cut in 0..bytes.len() {
        let err = Packet::decode(&bytes[..cut]).unwrap_err();
        assert!(err.is_truncated(), "cut {cut}: {err:?}");
    }
    assert!(Packet::decode(&bytes).is_ok());
}

/// Decoding failures map to the result code a platform would answer with.
#[test]
fn test_response_for_corrupt_packet() {
    let mut bytes = build_packet(&scenario_header(), b"data").unwrap();
    bytes[HEADER_LEN] ^= 0x10;

    let err = Packet::decode(&bytes).unwrap_err();
    let ack = Packet::response(77, 1, err.result_code());

    let decoded = Packet::decode(&ack.encode().unwrap()).unwrap();
    let body = decoded.response_body().unwrap().unwrap();
    assert_eq!(body.response_packet_id, 1);
    assert_eq!(body.result_code(), Some(ResultCode::DataCrcError));
}

/// Packets streamed in uneven chunks come out whole and in order.
#[test]
fn test_stream_reassembly() {
    init_tracing();

    let counter = PacketIdCounter::with_start(65533);
    let mut stream = Vec::new();
    let mut expected = Vec::new();
    for i in 0..6u8 {
        let payload = vec![i; i as usize * 7];
        let mut header = Header::new(counter.next(), PacketType::AppData);
        if i % 2 == 1 {
            header = header.with_route(Route::new(10, 20, i));
        }
        stream.extend(build_packet(&header, &payload).unwrap());
        expected.push((header.packet_id, payload));
    }

    let mut buffer = PacketBuffer::new();
    let mut packets = Vec::new();
    for chunk in stream.chunks(5) {
        packets.extend(buffer.push(chunk).unwrap());
    }

    assert!(buffer.is_empty());
    assert_eq!(packets.len(), expected.len());
    for (packet, (pid, payload)) in packets.iter().zip(&expected) {
        assert_eq!(packet.packet_id(), *pid);
        assert_eq!(packet.payload(), payload.as_slice());
    }
    let ids: Vec<u16> = packets.iter().map(|p| p.packet_id()).collect();
    assert_eq!(ids, [65533, 65534, 65535, 0, 1, 2]);
}

/// The configured codec enforces limits from JSON configuration.
#[test]
fn test_codec_from_json_config() {
    init_tracing();

    let codec = PacketCodec::from_json(r#"{ "max_payload_size": 16 }"#).unwrap();
    assert_eq!(codec.config().max_payload_size, 16);

    let bytes = codec.encode(scenario_header(), &[0; 16]).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap().payload_len(), 16);

    assert!(matches!(
        codec.encode(scenario_header(), &[0; 17]),
        Err(EgtsError::Encode(_))
    ));

    let bad = PacketCodec::from_json(r#"{ "max_payload_size": "big" }"#);
    assert!(matches!(bad, Err(EgtsError::Json(_))));
}

/// Codec calls share nothing and can run from many threads at once.
#[test]
fn test_concurrent_codec_use() {
    init_tracing();

    let codec = Arc::new(PacketCodec::new(CodecConfig::default()).unwrap());
    let counter = Arc::new(PacketIdCounter::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let codec = Arc::clone(&codec);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for i in 0..250u32 {
                    let payload = Bytes::from(format!("thread {t} packet {i}"));
                    let header = Header::new(counter.next(), PacketType::AppData);
                    let bytes = codec.encode(header, &payload).unwrap();
                    let packet = codec.decode(&bytes).unwrap();
                    assert_eq!(packet.payload_bytes(), payload);
                    assert_eq!(packet.packet_id(), header.packet_id);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.peek(), 2000);
}
