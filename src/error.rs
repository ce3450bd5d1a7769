use thiserror::Error;

use crate::usb::line::LineState;
use crate::usb::types::Pid;

/// Fatal to the decoder session that reported it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("SYNC: expected {expected:?} at sync position {position}, found {found:?}")]
    Sync {
        position: u8,
        expected: LineState,
        found: LineState,
    },
    #[error("PAYLOAD: bus in invalid state {found:?} after {bits} payload bits ({bytes} bytes)")]
    InvalidLineState {
        found: LineState,
        bits: usize,
        bytes: usize,
    },
    #[error("PAYLOAD: expected bitstuff after six ones, at payload bit {bits} ({bytes} bytes)")]
    MissingBitStuff { bits: usize, bytes: usize },
    #[error("PAYLOAD: expected final bitstuff before EOP, at payload bit {bits} ({bytes} bytes)")]
    BitStuffBeforeEop { bits: usize, bytes: usize },
}

/// A decoded byte sequence that is not a well formed packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,
    #[error("PID check failed on byte {byte:#04x}")]
    PidCheck { byte: u8 },
    #[error("Unsupported PID {pid:?}")]
    UnsupportedPid { pid: Pid },
    #[error("{pid:?} packet must be {expected} bytes long, got {found}")]
    Length {
        pid: Pid,
        expected: usize,
        found: usize,
    },
    #[error("{pid:?} packet must be at least {minimum} bytes long, got {found}")]
    TooShort {
        pid: Pid,
        minimum: usize,
        found: usize,
    },
    #[error("CRC5 mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    Crc5Mismatch { expected: u8, calculated: u8 },
    #[error("CRC16 mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    Crc16Mismatch { expected: u16, calculated: u16 },
}

/// Caller supplied field values that cannot be put on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{field} {value:#x} exceeds maximum {max:#x}")]
    OutOfRange {
        field: &'static str,
        value: u16,
        max: u16,
    },
    #[error("{pid:?} is not a {category} PID")]
    WrongCategory { pid: Pid, category: &'static str },
    #[error("Unknown PID name {0:?}")]
    UnknownPid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("Unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { offset: usize, found: char },
}

/// Errors surfaced by the byte and packet stream adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
}
