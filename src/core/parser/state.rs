//! Shared shape of the line parsers: `Idle -> Accumulating(ctx) -> Idle`.
//!
//! A context only leaves the state through `open` (which hands back the previous one)
//! or `flush`; callers flush once more at end of input so the last record is kept.

#[derive(Debug, PartialEq, Eq)]
pub enum LineState<C> {
    Idle,
    Accumulating(C),
}

impl<C> Default for LineState<C> {
    fn default() -> Self {
        LineState::Idle
    }
}

impl<C> LineState<C> {
    /// Start a new context, returning the one that was open before it.
    pub fn open(&mut self, ctx: C) -> Option<C> {
        match std::mem::replace(self, LineState::Accumulating(ctx)) {
            LineState::Accumulating(prev) => Some(prev),
            LineState::Idle => None,
        }
    }

    pub fn flush(&mut self) -> Option<C> {
        match std::mem::replace(self, LineState::Idle) {
            LineState::Accumulating(ctx) => Some(ctx),
            LineState::Idle => None,
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut C> {
        match self {
            LineState::Accumulating(ctx) => Some(ctx),
            LineState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LineState::Idle)
    }
}
