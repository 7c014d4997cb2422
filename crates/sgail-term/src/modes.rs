//! ANSI and DEC private mode state.
//!
//! Only the modes this core acts on (or must replay) are modeled. Each mode
//! knows its wire number, whether it is DEC private, and its power-on
//! default, which is what lets the terminal formatter emit just the modes
//! that deviate.

/// A mode this terminal tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// IRM: insert rather than replace on print (mode 4).
    Insert,
    /// LNM: linefeed implies carriage return (mode 20).
    Linefeed,
    /// DECOM: cursor addressing is relative to the scrolling region
    /// (private 6).
    Origin,
    /// DECAWM: wrap at the right margin (private 7).
    Autowrap,
    /// DECSCNM: reverse video for the whole screen (private 5).
    ReverseColors,
    /// ATT160: cursor blinking (private 12).
    CursorBlinking,
    /// DECTCEM: cursor visible (private 25).
    CursorVisible,
    /// DECLRMM: left/right margin mode (private 69).
    LeftRightMargins,
    /// Focus in/out reporting (private 1004).
    FocusEvents,
    /// Bracketed paste (private 2004).
    BracketedPaste,
}

impl Mode {
    /// Every tracked mode.
    pub const ALL: [Mode; 10] = [
        Mode::Insert,
        Mode::Linefeed,
        Mode::Origin,
        Mode::Autowrap,
        Mode::ReverseColors,
        Mode::CursorBlinking,
        Mode::CursorVisible,
        Mode::LeftRightMargins,
        Mode::FocusEvents,
        Mode::BracketedPaste,
    ];

    /// The wire parameter number.
    pub fn number(self) -> u16 {
        match self {
            Self::Insert => 4,
            Self::Linefeed => 20,
            Self::Origin => 6,
            Self::Autowrap => 7,
            Self::ReverseColors => 5,
            Self::CursorBlinking => 12,
            Self::CursorVisible => 25,
            Self::LeftRightMargins => 69,
            Self::FocusEvents => 1004,
            Self::BracketedPaste => 2004,
        }
    }

    /// Whether this is a DEC private mode (`?` prefix on the wire).
    pub fn is_private(self) -> bool {
        !matches!(self, Self::Insert | Self::Linefeed)
    }

    /// Power-on default.
    pub fn default_value(self) -> bool {
        matches!(
            self,
            Self::Autowrap | Self::CursorBlinking | Self::CursorVisible
        )
    }

    /// Look up a mode from its wire number.
    pub fn from_number(number: u16, private: bool) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.number() == number && m.is_private() == private)
    }
}

/// The value of every tracked mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeState {
    values: [bool; Mode::ALL.len()],
}

impl Default for ModeState {
    fn default() -> Self {
        let mut values = [false; Mode::ALL.len()];
        for (slot, mode) in values.iter_mut().zip(Mode::ALL) {
            *slot = mode.default_value();
        }
        Self { values }
    }
}

impl ModeState {
    /// Read a mode.
    pub fn get(&self, mode: Mode) -> bool {
        self.values[Self::index(mode)]
    }

    /// Set a mode.
    pub fn set(&mut self, mode: Mode, value: bool) {
        self.values[Self::index(mode)] = value;
    }

    /// Modes whose value deviates from the power-on default.
    pub fn non_default(&self) -> impl Iterator<Item = (Mode, bool)> + '_ {
        Mode::ALL
            .into_iter()
            .map(|m| (m, self.get(m)))
            .filter(|&(m, v)| v != m.default_value())
    }

    fn index(mode: Mode) -> usize {
        // Position in ALL; the array is tiny.
        Mode::ALL.iter().position(|&m| m == mode).unwrap_or(0)
    }
}
