use std::fmt;

/// Differential state of the D+/D- pair during one sample tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineState {
    /// Both lines low (differential zero), used by EOP and bus reset.
    SE0,
    J,
    K,
    /// Both lines high. Never driven on a healthy bus.
    SE1,
}

impl LineState {
    /// Maps one (D+, D-) sample to its line state, using full-speed polarity.
    pub fn classify(dp: bool, dm: bool) -> Self {
        match (dp, dm) {
            (false, false) => LineState::SE0,
            (true, false) => LineState::J,
            (false, true) => LineState::K,
            (true, true) => LineState::SE1,
        }
    }

    /// The (D+, D-) levels that produce this state.
    pub fn levels(self) -> (bool, bool) {
        match self {
            LineState::SE0 => (false, false),
            LineState::J => (true, false),
            LineState::K => (false, true),
            LineState::SE1 => (true, true),
        }
    }

    /// The opposite data state. Only meaningful for `J` and `K`.
    pub fn toggled(self) -> Self {
        match self {
            LineState::J => LineState::K,
            LineState::K => LineState::J,
            other => other,
        }
    }

    pub fn is_data(self) -> bool {
        matches!(self, LineState::J | LineState::K)
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = match self {
            LineState::SE0 => '0',
            LineState::J => 'J',
            LineState::K => 'K',
            LineState::SE1 => '1',
        };
        write!(f, "{}", c)
    }
}

pub struct LineStateIterator<T> {
    it: T,
}

impl<T> Iterator for LineStateIterator<T>
where
    T: Iterator<Item = (bool, bool)>,
{
    type Item = LineState;
    fn next(&mut self) -> Option<Self::Item> {
        let (dp, dm) = self.it.next()?;
        Some(LineState::classify(dp, dm))
    }
}

pub trait LineStateIteratorExt: Sized {
    /// Classifies every (D+, D-) sample, one line state per tick.
    fn into_line_state(self) -> LineStateIterator<Self> {
        LineStateIterator { it: self }
    }
}
impl<T> LineStateIteratorExt for T where T: Iterator<Item = (bool, bool)> {}
