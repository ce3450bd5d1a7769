use std::convert::TryFrom;
use std::iter::repeat;

use usb_line_codec::usb::byte::ByteIteratorExt;
use usb_line_codec::usb::crc::{check_crc16, check_crc5, crc5};
use usb_line_codec::usb::packet::{self, BusEvent, PacketIteratorExt};
use usb_line_codec::usb::types::{Data, DataPid, HandShake, Pid, Token, TokenType};
use usb_line_codec::{Decoder, Encoder, Error, LineState, Packet, PacketError};

/// Drives the encoder into a fresh decoder and classifies what comes out.
fn over_the_wire(bytes: &[u8]) -> Option<Packet> {
    let mut decoder = Decoder::new();
    for line in Encoder::new(bytes.iter().copied()) {
        decoder.step(line).expect("framing error");
    }
    assert!(decoder.is_complete());
    packet::decode(decoder.decoded())
}

#[test]
fn setup_token_over_the_wire() {
    let bytes = packet::token(TokenType::Setup, 0x00, 0x0).unwrap();
    assert_eq!(bytes, vec![Pid::Setup.byte(), 0x00, crc5(0) << 3]);
    assert_eq!(
        over_the_wire(&bytes),
        Some(Packet::Token(Token {
            token_type: TokenType::Setup,
            address: 0,
            endpoint: 0,
        }))
    );
}

#[test]
fn data0_setup_request_over_the_wire() {
    let payload = vec![0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x40, 0x00];
    let bytes = packet::data(DataPid::Data0, &payload);
    assert_eq!(&bytes[bytes.len() - 2..], &[0xDD, 0x94]);
    assert_eq!(
        over_the_wire(&bytes),
        Some(Packet::Data(Data {
            pid: DataPid::Data0,
            payload,
        }))
    );
}

#[test]
fn every_token_passes_its_own_crc_check() {
    for token_type in [
        TokenType::Out,
        TokenType::In,
        TokenType::Setup,
        TokenType::Ping,
    ]
    .iter()
    {
        for address in 0..=packet::MAX_ADDRESS {
            for endpoint in 0..=packet::MAX_ENDPOINT {
                let bytes = packet::token(*token_type, address, endpoint).unwrap();
                assert_eq!(bytes.len(), 3);
                assert!(check_crc5([bytes[1], bytes[2]]));
                assert_eq!(
                    packet::decode(&bytes),
                    Some(Packet::Token(Token {
                        token_type: *token_type,
                        address,
                        endpoint
                    }))
                );
            }
        }
    }
}

#[test]
fn data_packets_pass_their_own_crc_check() {
    for len in 0..=64u8 {
        let payload: Vec<u8> = (0..len).map(|i| i.wrapping_mul(37)).collect();
        let bytes = packet::data(DataPid::Data1, &payload);
        assert!(check_crc16(&bytes[1..]));
    }
}

#[test]
fn every_packet_kind_survives_the_wire() {
    let packets = vec![
        Packet::SoF(0x000),
        Packet::SoF(0x7FF),
        Packet::HandShake(HandShake::Ack),
        Packet::HandShake(HandShake::NAck),
        Packet::HandShake(HandShake::Stall),
        Packet::HandShake(HandShake::NYet),
        Packet::Token(Token {
            token_type: TokenType::Out,
            address: 0x7F,
            endpoint: 0xF,
        }),
        Packet::Data(Data {
            pid: DataPid::Data2,
            payload: vec![0xFF; 32],
        }),
        Packet::Data(Data {
            pid: DataPid::MData,
            payload: vec![],
        }),
    ];
    for packet in packets {
        let mut decoder = Decoder::new();
        for line in packet.encoder().unwrap() {
            decoder.step(line).unwrap();
        }
        assert_eq!(
            Packet::try_from(decoder.decoded()),
            Ok(packet.clone()),
            "{:?}",
            packet
        );
    }
}

#[test]
fn corrupted_crc_is_not_a_packet() {
    let mut bytes = packet::sof(0x123).unwrap();
    bytes[1] ^= 0x01;
    assert_eq!(over_the_wire(&bytes), None);

    let mut bytes = packet::data(DataPid::Data0, &[1, 2, 3]);
    bytes[2] ^= 0x40;
    assert_eq!(over_the_wire(&bytes), None);
}

#[test]
fn setup_transaction_on_a_live_bus() {
    let setup = packet::token(TokenType::Setup, 0x00, 0x0).unwrap();
    let request = packet::data(
        DataPid::Data0,
        &[0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x40, 0x00],
    );
    let ack = packet::handshake(HandShake::Ack);

    let bus: Vec<LineState> = repeat(LineState::SE0)
        .take(64)
        .chain(repeat(LineState::J).take(16))
        .chain(Encoder::new(setup))
        .chain(repeat(LineState::J).take(8))
        .chain(Encoder::new(request))
        .chain(repeat(LineState::J).take(8))
        .chain(Encoder::new(ack))
        .chain(repeat(LineState::J).take(8))
        .collect();

    let events: Vec<_> = bus
        .into_iter()
        .into_byte()
        .with_reset_ticks(64)
        .into_packet()
        .map(|(_, ev)| ev)
        .collect();

    assert_eq!(
        events,
        vec![
            Ok(BusEvent::Reset),
            Ok(BusEvent::Packet(Packet::Token(Token {
                token_type: TokenType::Setup,
                address: 0,
                endpoint: 0,
            }))),
            Ok(BusEvent::Packet(Packet::Data(Data {
                pid: DataPid::Data0,
                payload: vec![0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x40, 0x00],
            }))),
            Ok(BusEvent::Packet(Packet::HandShake(HandShake::Ack))),
        ]
    );
}

#[test]
fn invalid_packet_on_the_bus_is_reported_and_skipped() {
    let bus: Vec<LineState> = Encoder::new(vec![0x2E, 0x00, 0x10])
        .chain(repeat(LineState::J).take(4))
        .chain(Encoder::new(packet::handshake(HandShake::NAck)))
        .collect();

    let events: Vec<_> = bus
        .into_iter()
        .into_byte()
        .into_packet()
        .map(|(_, ev)| ev)
        .collect();
    assert_eq!(
        events,
        vec![
            Err(Error::Packet(PacketError::PidCheck { byte: 0x2E })),
            Ok(BusEvent::Packet(Packet::HandShake(HandShake::NAck))),
        ]
    );
}
