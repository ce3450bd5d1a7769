//! Transmit side of the bit codec. Mirrors the decoder's timing so that its output replays
//! straight into a [`Decoder`](super::decoder::Decoder).

use std::collections::VecDeque;

use tracing::trace;

use super::decoder::{MAX_RUN, OVERSAMPLING, SYNC_PATTERN};
use super::line::LineState;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    Idle,
    Sync { count: u8 },
    Payload,
    Eop { count: u8 },
    Complete,
}

pub struct Encoder {
    state: State,
    to_write: VecDeque<u8>,
    bit_counter: u8,
    phase: u8,
    bitstuff: u8,
    last: LineState,
}

impl Encoder {
    pub fn new<T: IntoIterator<Item = u8>>(bytes: T) -> Self {
        Self {
            state: State::Idle,
            to_write: bytes.into_iter().collect(),
            bit_counter: 0,
            phase: 0,
            bitstuff: 0,
            last: LineState::SE0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Line state for the next tick, or `None` once the EOP's trailing J has been emitted.
    pub fn step(&mut self) -> Option<LineState> {
        let line = match self.state {
            State::Complete => return None,
            State::Idle => {
                self.state = State::Sync { count: 0 };
                self.phase = 1;
                self.last = SYNC_PATTERN[0];
                return Some(self.last);
            }
            _ if self.phase != 0 => {
                self.phase = (self.phase + 1) % OVERSAMPLING;
                return Some(self.last);
            }
            State::Sync { count } => {
                let position = count + 1;
                self.state = if usize::from(position) == SYNC_PATTERN.len() - 1 {
                    State::Payload
                } else {
                    State::Sync { count: position }
                };
                SYNC_PATTERN[usize::from(position)]
            }
            State::Payload => self.payload_bit(),
            State::Eop { count } if count < 2 => {
                self.state = State::Eop { count: count + 1 };
                LineState::SE0
            }
            State::Eop { .. } => {
                trace!("EOP sent");
                self.state = State::Complete;
                LineState::J
            }
        };
        self.phase = 1;

        if line == self.last {
            self.bitstuff += 1;
        } else {
            self.bitstuff = 0;
        }
        debug_assert!(self.bitstuff <= MAX_RUN, "bitstuff counter overflow");
        self.last = line;
        Some(line)
    }

    fn payload_bit(&mut self) -> LineState {
        if self.bitstuff == MAX_RUN {
            trace!("stuffing a zero");
            return self.nrzi(false);
        }
        let byte = match self.to_write.front() {
            Some(byte) => *byte,
            None => {
                trace!("start of EOP");
                self.state = State::Eop { count: 1 };
                return LineState::SE0;
            }
        };
        let line = self.nrzi((byte >> self.bit_counter) & 1 == 1);
        self.bit_counter += 1;
        if self.bit_counter == 8 {
            self.to_write.pop_front();
            self.bit_counter = 0;
        }
        line
    }

    fn nrzi(&self, one: bool) -> LineState {
        if one {
            self.last
        } else {
            self.last.toggled()
        }
    }
}

impl Iterator for Encoder {
    type Item = LineState;
    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}
