use std::convert::TryFrom;

use tracing::debug;

use super::byte::Byte;
use super::crc::{crc16, crc5};
use super::encoder::Encoder;
use super::types::{Data, DataPid, HandShake, Pid, Token, TokenType};
use crate::error::{BuildError, Error, FramingError, PacketError};

pub const MAX_ADDRESS: u8 = 0x7F;
pub const MAX_ENDPOINT: u8 = 0xF;
pub const MAX_FRAME: u16 = 0x7FF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    SoF(u16),
    HandShake(HandShake),
    Token(Token),
    Data(Data),
}

fn check_range(field: &'static str, value: u16, max: u16) -> Result<(), BuildError> {
    if value > max {
        return Err(BuildError::OutOfRange { field, value, max });
    }
    Ok(())
}

/// PID followed by an 11-bit field and its CRC5, little-endian.
fn crc5_packet(pid: Pid, field: u16) -> Vec<u8> {
    let [lsb, msb] = (field | u16::from(crc5(field)) << 11).to_le_bytes();
    vec![pid.byte(), lsb, msb]
}

pub fn token(token_type: TokenType, address: u8, endpoint: u8) -> Result<Vec<u8>, BuildError> {
    check_range("address", address.into(), MAX_ADDRESS.into())?;
    check_range("endpoint", endpoint.into(), MAX_ENDPOINT.into())?;
    Ok(crc5_packet(
        token_type.pid(),
        u16::from(endpoint) << 7 | u16::from(address),
    ))
}

pub fn sof(frame: u16) -> Result<Vec<u8>, BuildError> {
    check_range("frame", frame, MAX_FRAME)?;
    Ok(crc5_packet(Pid::Sof, frame))
}

pub fn handshake(handshake: HandShake) -> Vec<u8> {
    vec![handshake.pid().byte()]
}

pub fn data(pid: DataPid, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + 3);
    buf.push(pid.pid().byte());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&crc16(payload).to_le_bytes());
    buf
}

/// Classifies a decoded byte sequence. Any validation failure yields `None`.
pub fn decode(buf: &[u8]) -> Option<Packet> {
    let res = Packet::try_from(buf);
    if let Err(e) = &res {
        debug!("rejected {:02x?}: {}", buf, e);
    }
    res.ok()
}

/// Validates the length and CRC5 of a token or SOF packet and returns its 11-bit field.
fn crc5_field(pid: Pid, buf: &[u8]) -> Result<u16, PacketError> {
    match *buf {
        [_, lsb, msb] => {
            let word = u16::from_le_bytes([lsb, msb]);
            let field = word & MAX_FRAME;
            let expected = (word >> 11) as u8;
            let calculated = crc5(field);
            if expected != calculated {
                return Err(PacketError::Crc5Mismatch {
                    expected,
                    calculated,
                });
            }
            Ok(field)
        }
        _ => Err(PacketError::Length {
            pid,
            expected: 3,
            found: buf.len(),
        }),
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = PacketError;
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        let first = *buf.first().ok_or(PacketError::Empty)?;
        let pid = Pid::from_byte(first)?;

        if let Ok(token_type) = TokenType::try_from(pid) {
            let field = crc5_field(pid, buf)?;
            return Ok(Packet::Token(Token {
                token_type,
                address: (field & u16::from(MAX_ADDRESS)) as u8,
                endpoint: (field >> 7) as u8,
            }));
        }
        if let Ok(data_pid) = DataPid::try_from(pid) {
            if buf.len() < 3 {
                return Err(PacketError::TooShort {
                    pid,
                    minimum: 3,
                    found: buf.len(),
                });
            }
            let (payload, crc) = buf[1..].split_at(buf.len() - 3);
            let expected = u16::from_le_bytes([crc[0], crc[1]]);
            let calculated = crc16(payload);
            if expected != calculated {
                return Err(PacketError::Crc16Mismatch {
                    expected,
                    calculated,
                });
            }
            return Ok(Packet::Data(Data {
                pid: data_pid,
                payload: payload.to_vec(),
            }));
        }
        if let Ok(handshake) = HandShake::try_from(pid) {
            if buf.len() != 1 {
                return Err(PacketError::Length {
                    pid,
                    expected: 1,
                    found: buf.len(),
                });
            }
            return Ok(Packet::HandShake(handshake));
        }
        match pid {
            Pid::Sof => Ok(Packet::SoF(crc5_field(pid, buf)?)),
            _ => Err(PacketError::UnsupportedPid { pid }),
        }
    }
}

impl Packet {
    pub fn pid(&self) -> Pid {
        match self {
            Packet::SoF(_) => Pid::Sof,
            Packet::HandShake(hs) => hs.pid(),
            Packet::Token(token) => token.token_type.pid(),
            Packet::Data(data) => data.pid.pid(),
        }
    }

    /// Byte sequence for the encoder: PID, fields and CRC.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BuildError> {
        match self {
            Packet::SoF(frame) => sof(*frame),
            Packet::HandShake(hs) => Ok(handshake(*hs)),
            Packet::Token(t) => token(t.token_type, t.address, t.endpoint),
            Packet::Data(d) => Ok(data(d.pid, &d.payload)),
        }
    }

    pub fn encoder(&self) -> Result<Encoder, BuildError> {
        Ok(Encoder::new(self.to_bytes()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Reset,
    Packet(Packet),
}

pub struct PacketIterator<T> {
    it: T,
}

impl<T> Iterator for PacketIterator<T>
where
    T: Iterator<Item = (u64, Result<Byte, FramingError>)>,
{
    type Item = (u64, Result<BusEvent, Error>);
    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();

        let out = loop {
            let (ts, byte) = match self.it.next()? {
                (ts, Ok(byte)) => (ts, byte),
                (ts, Err(e)) => return Some((ts, Err(e.into()))),
            };
            match byte {
                Byte::Reset => break (ts, Ok(BusEvent::Reset)),
                Byte::Byte(b) => buf.push(b),
                Byte::Eop => {
                    let res = Packet::try_from(&buf as &[u8]);
                    if let Err(e) = &res {
                        debug!("rejected {:02x?}: {}", buf, e);
                    }
                    break (ts, res.map(BusEvent::Packet).map_err(Error::from));
                }
            }
        };
        Some(out)
    }
}

pub trait PacketIteratorExt: Sized {
    fn into_packet(self) -> PacketIterator<Self> {
        PacketIterator { it: self }
    }
}
impl<T> PacketIteratorExt for T where T: Iterator<Item = (u64, Result<Byte, FramingError>)> {}
