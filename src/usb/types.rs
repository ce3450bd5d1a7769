use std::convert::TryFrom;
use std::str::FromStr;

use crate::error::{BuildError, PacketError};

/// 4-bit packet identifier. On the wire it is followed by its complement in the upper nibble.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Pid {
    Out,
    In,
    Sof,
    Setup,
    Data0,
    Data1,
    Data2,
    MData,
    Ack,
    Nak,
    Stall,
    NYet,
    Err,
    Split,
    Ping,
    Invalid,
}

impl Pid {
    pub const ALL: [Pid; 16] = [
        Pid::Out,
        Pid::In,
        Pid::Sof,
        Pid::Setup,
        Pid::Data0,
        Pid::Data1,
        Pid::Data2,
        Pid::MData,
        Pid::Ack,
        Pid::Nak,
        Pid::Stall,
        Pid::NYet,
        Pid::Err,
        Pid::Split,
        Pid::Ping,
        Pid::Invalid,
    ];

    pub fn nibble(self) -> u8 {
        match self {
            Pid::Out => 0x1,
            Pid::In => 0x9,
            Pid::Sof => 0x5,
            Pid::Setup => 0xD,
            Pid::Data0 => 0x3,
            Pid::Data1 => 0xB,
            Pid::Data2 => 0x7,
            Pid::MData => 0xF,
            Pid::Ack => 0x2,
            Pid::Nak => 0xA,
            Pid::Stall => 0xE,
            Pid::NYet => 0x6,
            Pid::Err => 0xC,
            Pid::Split => 0x8,
            Pid::Ping => 0x4,
            Pid::Invalid => 0x0,
        }
    }

    /// Unassigned nibbles classify as `Invalid`.
    pub fn from_nibble(nibble: u8) -> Pid {
        Pid::ALL
            .iter()
            .copied()
            .find(|pid| pid.nibble() == nibble & 0xF)
            .unwrap_or(Pid::Invalid)
    }

    /// PID byte as transmitted: PID in the low nibble, its complement in the high one.
    pub fn byte(self) -> u8 {
        let pid = self.nibble();
        pid | (!(pid << 4) & 0xF0)
    }

    pub fn from_byte(byte: u8) -> Result<Pid, PacketError> {
        if byte & 0xF != !(byte >> 4) & 0xF {
            return Err(PacketError::PidCheck { byte });
        }
        Ok(Pid::from_nibble(byte))
    }
}

impl FromStr for Pid {
    type Err = BuildError;
    fn from_str(s: &str) -> Result<Self, BuildError> {
        Pid::ALL
            .iter()
            .copied()
            .find(|pid| format!("{:?}", pid).eq_ignore_ascii_case(s))
            .ok_or_else(|| BuildError::UnknownPid(s.into()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenType {
    Setup,
    Out,
    In,
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub address: u8,
    pub endpoint: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPid {
    Data0,
    Data1,
    Data2,
    MData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub pid: DataPid,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandShake {
    Ack,
    NAck,
    Stall,
    NYet,
}

macro_rules! pid_category {
    ($ty:ident, $category:expr, { $($variant:ident => $pid:ident),+ $(,)? }) => {
        impl $ty {
            pub fn pid(self) -> Pid {
                match self {
                    $($ty::$variant => Pid::$pid,)+
                }
            }
        }

        impl From<$ty> for Pid {
            fn from(v: $ty) -> Pid {
                v.pid()
            }
        }

        impl TryFrom<Pid> for $ty {
            type Error = BuildError;
            fn try_from(pid: Pid) -> Result<Self, Self::Error> {
                match pid {
                    $(Pid::$pid => Ok($ty::$variant),)+
                    _ => Err(BuildError::WrongCategory {
                        pid,
                        category: $category,
                    }),
                }
            }
        }
    };
}

pid_category!(TokenType, "token", {
    Out => Out,
    In => In,
    Setup => Setup,
    Ping => Ping,
});
pid_category!(DataPid, "data", {
    Data0 => Data0,
    Data1 => Data1,
    Data2 => Data2,
    MData => MData,
});
pid_category!(HandShake, "handshake", {
    Ack => Ack,
    NAck => Nak,
    Stall => Stall,
    NYet => NYet,
});
