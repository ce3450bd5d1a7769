//! Receive side of the bit codec: one session per packet, advanced one line state per tick.

use tracing::{debug, trace};

use super::line::LineState;
use crate::error::FramingError;

/// Ticks per bit period.
pub const OVERSAMPLING: u8 = 4;
/// Consecutive ones after which a zero is stuffed.
pub const MAX_RUN: u8 = 6;
/// Line state of each bit period of the SYNC field. Position 0 is the idle-to-K edge.
pub const SYNC_PATTERN: [LineState; 8] = [
    LineState::K,
    LineState::J,
    LineState::K,
    LineState::J,
    LineState::K,
    LineState::J,
    LineState::K,
    LineState::K,
];
/// The trailing K-K of SYNC is a 1 bit and counts toward the first stuffing run.
pub(crate) const SYNC_TRAILING_ONES: u8 = 1;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    Idle,
    /// `count` is the last SYNC position checked.
    Sync { count: u8 },
    /// `bitstuff` counts consecutive ones, `bits` counts payload bits kept.
    Payload { bitstuff: u8, bits: usize },
    /// `count` counts SE0 bit periods seen so far. Data states are ignored until a J after SE0.
    Eop { count: u8 },
    Complete,
}

/// What a single tick produced.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Decoded {
    /// A payload bit that was kept. Stuffed bits never show up here.
    pub bit: Option<bool>,
    /// Set on the tick that completes a byte.
    pub byte: Option<u8>,
    /// Set on the tick that ends the packet.
    pub eop: bool,
}

pub struct Decoder {
    state: State,
    phase: u8,
    last: Option<LineState>,
    shift_reg: u8,
    decoded: Vec<u8>,
    error: Option<FramingError>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            phase: 0,
            last: None,
            shift_reg: 0,
            decoded: Vec::new(),
            error: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    pub fn error(&self) -> Option<&FramingError> {
        self.error.as_ref()
    }

    pub fn decoded(&self) -> &[u8] {
        &self.decoded
    }

    pub fn into_decoded(self) -> Vec<u8> {
        self.decoded
    }

    /// Advances the session by one tick.
    ///
    /// Bit recovery only happens on phase 0 of each bit period; the three other ticks are held.
    /// Once an error has been reported the session is dead and keeps returning it.
    pub fn step(&mut self, line: LineState) -> Result<Decoded, FramingError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        match self.state {
            State::Idle => {
                if line == LineState::K {
                    trace!("start of SYNC");
                    self.state = State::Sync { count: 0 };
                    self.phase = 1;
                }
                return Ok(Decoded::default());
            }
            State::Complete => return Ok(Decoded::default()),
            _ => {}
        }

        if self.phase != 0 {
            self.phase = (self.phase + 1) % OVERSAMPLING;
            return Ok(Decoded::default());
        }
        self.phase = 1;

        let bit = self.nrzi(line);
        self.last = Some(line);
        let res = self.sample(line, bit);
        if let Err(e) = &res {
            debug!("decoder failed in {:?}: {}", self.state, e);
            self.error = Some(e.clone());
        }
        res
    }

    /// A repeated data state is a 1, a change is a 0. Anything involving SE0/SE1 carries no bit.
    fn nrzi(&self, line: LineState) -> Option<bool> {
        match self.last {
            Some(last) if last.is_data() && line.is_data() => Some(last == line),
            _ => None,
        }
    }

    fn sample(&mut self, line: LineState, bit: Option<bool>) -> Result<Decoded, FramingError> {
        let mut out = Decoded::default();
        match self.state {
            State::Sync { count } => {
                let position = count + 1;
                let expected = SYNC_PATTERN[usize::from(position)];
                if line != expected {
                    return Err(FramingError::Sync {
                        position,
                        expected,
                        found: line,
                    });
                }
                self.state = if usize::from(position) == SYNC_PATTERN.len() - 1 {
                    trace!("SYNC acquired");
                    State::Payload {
                        bitstuff: SYNC_TRAILING_ONES,
                        bits: 0,
                    }
                } else {
                    State::Sync { count: position }
                };
            }
            State::Payload { bitstuff, bits } => match line {
                LineState::SE1 => {
                    return Err(FramingError::InvalidLineState {
                        found: line,
                        bits,
                        bytes: self.decoded.len(),
                    })
                }
                LineState::SE0 => {
                    if bitstuff == MAX_RUN {
                        return Err(FramingError::BitStuffBeforeEop {
                            bits,
                            bytes: self.decoded.len(),
                        });
                    }
                    trace!("start of EOP after {} bits", bits);
                    self.state = State::Eop { count: 1 };
                }
                LineState::J | LineState::K => {
                    let one = bit == Some(true);
                    if bitstuff == MAX_RUN {
                        if one {
                            return Err(FramingError::MissingBitStuff {
                                bits,
                                bytes: self.decoded.len(),
                            });
                        }
                        trace!("dropped stuffed bit after {} bits", bits);
                        self.state = State::Payload { bitstuff: 0, bits };
                    } else {
                        self.shift_reg = (self.shift_reg >> 1) | (u8::from(one) << 7);
                        let bits = bits + 1;
                        out.bit = Some(one);
                        if bits % 8 == 0 {
                            self.decoded.push(self.shift_reg);
                            out.byte = Some(self.shift_reg);
                            self.shift_reg = 0;
                        }
                        self.state = State::Payload {
                            bitstuff: if one { bitstuff + 1 } else { 0 },
                            bits,
                        };
                    }
                }
            },
            State::Eop { count } => {
                if line == LineState::J {
                    debug!("packet complete: {:02x?}", self.decoded);
                    self.state = State::Complete;
                    out.eop = true;
                } else if line == LineState::SE0 {
                    self.state = State::Eop {
                        count: count.saturating_add(1),
                    };
                }
            }
            State::Idle | State::Complete => unreachable!(),
        }
        Ok(out)
    }
}
