//! Kitty keyboard protocol flags and the per-screen flag stack.
//!
//! Set with `CSI = flags ; mode u`, pushed with `CSI > flags u`, popped with
//! `CSI < n u`, queried with `CSI ? u`. The flag bits are part of the wire
//! protocol and therefore stable.

/// Progressive-enhancement flag bits. The bit values are the wire encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyFlags(u8);

impl KeyFlags {
    /// Disambiguate escape codes.
    pub const DISAMBIGUATE: Self = Self(1);
    /// Report key press and release events.
    pub const REPORT_EVENTS: Self = Self(2);
    /// Report alternate keys.
    pub const REPORT_ALTERNATES: Self = Self(4);
    /// Report all keys as escape codes.
    pub const REPORT_ALL: Self = Self(8);
    /// Report associated text.
    pub const REPORT_ASSOCIATED: Self = Self(16);

    /// Mask of every defined bit.
    pub const ALL: Self = Self(0b11111);

    /// Construct from wire bits, dropping undefined bits.
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// The wire encoding.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether no flag is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether all bits of `other` are set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bits in `self` that are not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

/// How `CSI = flags ; mode u` combines the new flags with the current set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeySetMode {
    /// Replace the current flags.
    #[default]
    Set = 1,
    /// Union with the current flags.
    Or = 2,
    /// Clear the given bits.
    Not = 3,
}

impl KeySetMode {
    /// Construct from the wire parameter.
    pub fn from_param(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::Set,
            2 => Self::Or,
            3 => Self::Not,
            _ => return None,
        })
    }
}

/// The per-screen stack of keyboard flags.
///
/// The stack is bounded; pushing past the bound drops the oldest entry, as
/// the protocol requires the terminal to cap stack growth.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyFlagStack {
    stack: Vec<KeyFlags>,
}

impl KeyFlagStack {
    /// Maximum stack depth.
    pub const MAX_DEPTH: usize = 8;

    /// The active flags: the top of the stack, or empty.
    pub fn current(&self) -> KeyFlags {
        self.stack.last().copied().unwrap_or_default()
    }

    /// Push a new flag set.
    pub fn push(&mut self, flags: KeyFlags) {
        if self.stack.len() == Self::MAX_DEPTH {
            self.stack.remove(0);
        }
        self.stack.push(flags);
    }

    /// Pop `n` entries. Popping an empty stack is a no-op.
    pub fn pop(&mut self, n: usize) {
        let keep = self.stack.len().saturating_sub(n.max(1));
        self.stack.truncate(keep);
    }

    /// Apply `CSI = flags ; mode u` to the top of the stack.
    pub fn apply(&mut self, mode: KeySetMode, flags: KeyFlags) {
        let current = self.current();
        let next = match mode {
            KeySetMode::Set => flags,
            KeySetMode::Or => current.union(flags),
            KeySetMode::Not => current.difference(flags),
        };
        match self.stack.last_mut() {
            Some(top) => *top = next,
            None => self.stack.push(next),
        }
    }

    /// Whether the stack is in its power-on state.
    pub fn is_default(&self) -> bool {
        self.stack.iter().all(|f| f.is_empty())
    }
}
