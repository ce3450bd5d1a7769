use std::collections::VecDeque;

use tracing::{debug, warn};

use super::decoder::Decoder;
use super::line::LineState;
use crate::error::FramingError;

/// SE0 ticks that make a bus reset when no packet is in flight (7.5ms at 48MHz).
pub const DEFAULT_RESET_TICKS: u32 = 360_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Byte {
    Reset,
    Byte(u8),
    Eop,
}

/// Runs one decoder session per packet over an unbounded line-state stream.
///
/// Items are tagged with the index of the tick that produced them.
pub struct ByteIterator<T> {
    it: T,
    tick: u64,

    session: Option<Decoder>,
    armed: bool,
    se0_ticks: u32,
    reset_ticks: u32,

    ev_queue: VecDeque<(u64, Result<Byte, FramingError>)>,
}

impl<T> ByteIterator<T> {
    pub fn new(input: T) -> Self {
        Self {
            it: input,
            tick: 0,
            session: None,
            armed: true,
            se0_ticks: 0,
            reset_ticks: DEFAULT_RESET_TICKS,
            ev_queue: VecDeque::new(),
        }
    }

    /// Sets the SE0 duration reported as a bus reset. 0 disables reset detection.
    pub fn with_reset_ticks(mut self, reset_ticks: u32) -> Self {
        self.reset_ticks = reset_ticks;
        self
    }

    /// Counts SE0 ticks whether or not a packet is in flight. Returns true on the tick that
    /// makes a reset, after dropping any open session.
    fn watch_reset(&mut self, ts: u64, line: LineState) -> bool {
        if line != LineState::SE0 {
            self.se0_ticks = 0;
            return false;
        }
        self.se0_ticks = self.se0_ticks.saturating_add(1);
        if self.se0_ticks != self.reset_ticks {
            return false;
        }
        if self.session.take().is_some() {
            debug!("bus reset at tick {} aborted the packet in flight", ts);
        } else {
            debug!("bus reset at tick {}", ts);
        }
        self.ev_queue.push_back((ts, Ok(Byte::Reset)));
        self.armed = true;
        true
    }

    /// Tracks the bus between packets. A K on an idle bus opens a new session.
    fn watch_idle(&mut self, line: LineState) {
        match line {
            LineState::J => self.armed = true,
            LineState::K if self.armed => self.session = Some(Decoder::new()),
            LineState::K | LineState::SE0 | LineState::SE1 => {}
        }
    }
}

impl<T> Iterator for ByteIterator<T>
where
    T: Iterator<Item = LineState>,
{
    type Item = (u64, Result<Byte, FramingError>);
    fn next(&mut self) -> Option<Self::Item> {
        while self.ev_queue.is_empty() {
            let line = self.it.next()?;
            let ts = self.tick;
            self.tick += 1;

            if self.watch_reset(ts, line) {
                continue;
            }
            if self.session.is_none() {
                self.watch_idle(line);
            }
            let res = match &mut self.session {
                Some(decoder) => decoder.step(line),
                None => continue,
            };

            match res {
                Ok(decoded) => {
                    if let Some(byte) = decoded.byte {
                        self.ev_queue.push_back((ts, Ok(Byte::Byte(byte))));
                    }
                    if decoded.eop {
                        self.ev_queue.push_back((ts, Ok(Byte::Eop)));
                        self.session = None;
                        self.armed = true;
                    }
                }
                Err(e) => {
                    // wait for the bus to go idle before looking for the next SYNC
                    warn!("framing error at tick {}: {}", ts, e);
                    self.ev_queue.push_back((ts, Err(e)));
                    self.session = None;
                    self.armed = false;
                }
            }
        }
        self.ev_queue.pop_front()
    }
}

pub trait ByteIteratorExt: Sized {
    fn into_byte(self) -> ByteIterator<Self> {
        ByteIterator::new(self)
    }
}
impl<T> ByteIteratorExt for T where T: Iterator<Item = LineState> {}
