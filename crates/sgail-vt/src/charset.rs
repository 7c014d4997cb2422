//! Character set designations, slots, and translation.
//!
//! The VT model designates one of four character sets into each of the
//! G0..G3 slots (`ESC ( ) * +`), then invokes a slot into GL or GR
//! (`SO`/`SI`, `LS2`, `LS3`, `LS1R`, `LS2R`, `LS3R`). Printing maps
//! codepoints through the invoked set.

/// A character set that can be designated into a slot. Discriminants are
/// stable across the ABI boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Charset {
    /// Pass-through UTF-8.
    #[default]
    Utf8 = 0,
    /// US ASCII (`ESC ( B`).
    Ascii = 1,
    /// British (`ESC ( A`): `#` becomes `£`.
    British = 2,
    /// DEC Special Graphics (`ESC ( 0`): line-drawing glyphs.
    DecSpecial = 3,
}

impl Charset {
    /// The designation final byte for this charset, as used in
    /// `ESC ( Ps` and friends.
    pub fn designation_byte(self) -> char {
        match self {
            // UTF-8 has no designation escape; treated as ASCII on the wire.
            Self::Utf8 | Self::Ascii => 'B',
            Self::British => 'A',
            Self::DecSpecial => '0',
        }
    }

    /// Map a codepoint through this charset.
    pub fn map(self, cp: char) -> char {
        match self {
            Self::Utf8 | Self::Ascii => cp,
            Self::British => {
                if cp == '#' {
                    '£'
                } else {
                    cp
                }
            }
            Self::DecSpecial => dec_special(cp),
        }
    }
}

/// DEC Special Graphics mapping for `0x60..=0x7e`.
fn dec_special(cp: char) -> char {
    match cp {
        '`' => '◆',
        'a' => '▒',
        'b' => '␉',
        'c' => '␌',
        'd' => '␍',
        'e' => '␊',
        'f' => '°',
        'g' => '±',
        'h' => '␤',
        'i' => '␋',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'q' => '─',
        'r' => '⎼',
        's' => '⎽',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        _ => cp,
    }
}

/// A designation slot. Discriminants are stable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Slot {
    /// G0.
    #[default]
    G0 = 0,
    /// G1.
    G1 = 1,
    /// G2.
    G2 = 2,
    /// G3.
    G3 = 3,
}

impl Slot {
    /// All slots in order.
    pub const ALL: [Slot; 4] = [Slot::G0, Slot::G1, Slot::G2, Slot::G3];

    /// The designation intermediate byte selecting this slot
    /// (`ESC ( B` designates G0, `ESC ) B` G1, ...).
    pub fn designation_intermediate(self) -> char {
        match self {
            Self::G0 => '(',
            Self::G1 => ')',
            Self::G2 => '*',
            Self::G3 => '+',
        }
    }
}

/// Which half of the code table a slot is invoked into. Discriminants are
/// stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActiveSlot {
    /// The left (GL) half.
    Gl = 0,
    /// The right (GR) half.
    Gr = 1,
}

/// The full charset state of one screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharsetState {
    charsets: [Charset; 4],
    gl: Slot,
    gr: Slot,
    /// One-shot GL override from SS2/SS3.
    single_shift: Option<Slot>,
}

impl Default for CharsetState {
    fn default() -> Self {
        Self {
            charsets: [Charset::Utf8; 4],
            gl: Slot::G0,
            gr: Slot::G2,
            single_shift: None,
        }
    }
}

impl CharsetState {
    /// Designate a charset into a slot.
    pub fn designate(&mut self, slot: Slot, charset: Charset) {
        self.charsets[slot as usize] = charset;
    }

    /// The charset designated in a slot.
    pub fn designated(&self, slot: Slot) -> Charset {
        self.charsets[slot as usize]
    }

    /// Invoke a slot into GL or GR.
    pub fn invoke(&mut self, active: ActiveSlot, slot: Slot) {
        match active {
            ActiveSlot::Gl => self.gl = slot,
            ActiveSlot::Gr => self.gr = slot,
        }
    }

    /// The slot currently invoked into GL or GR.
    pub fn invoked(&self, active: ActiveSlot) -> Slot {
        match active {
            ActiveSlot::Gl => self.gl,
            ActiveSlot::Gr => self.gr,
        }
    }

    /// Arm a single shift: the next printed codepoint maps through `slot`.
    pub fn single_shift(&mut self, slot: Slot) {
        self.single_shift = Some(slot);
    }

    /// Map a printable codepoint through the invoked charset, consuming
    /// any armed single shift.
    pub fn map(&mut self, cp: char) -> char {
        let slot = match self.single_shift.take() {
            Some(slot) => slot,
            None if (cp as u32) >= 0x80 && (cp as u32) <= 0xff => self.gr,
            None => self.gl,
        };
        self.charsets[slot as usize].map(cp)
    }

    /// Whether the state differs from the power-on default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dec_special_box_drawing() {
        assert_eq!(Charset::DecSpecial.map('j'), '┘');
        assert_eq!(Charset::DecSpecial.map('q'), '─');
        assert_eq!(Charset::DecSpecial.map('x'), '│');
        // Outside the graphics range, identity.
        assert_eq!(Charset::DecSpecial.map('A'), 'A');
    }

    #[test]
    fn british_pound() {
        assert_eq!(Charset::British.map('#'), '£');
        assert_eq!(Charset::British.map('a'), 'a');
    }

    #[test]
    fn designate_and_invoke() {
        let mut state = CharsetState::default();
        state.designate(Slot::G1, Charset::DecSpecial);
        assert_eq!(state.map('q'), 'q');
        state.invoke(ActiveSlot::Gl, Slot::G1);
        assert_eq!(state.map('q'), '─');
        state.invoke(ActiveSlot::Gl, Slot::G0);
        assert_eq!(state.map('q'), 'q');
    }

    #[test]
    fn single_shift_applies_once() {
        let mut state = CharsetState::default();
        state.designate(Slot::G2, Charset::DecSpecial);
        state.single_shift(Slot::G2);
        assert_eq!(state.map('q'), '─');
        assert_eq!(state.map('q'), 'q');
    }

    #[test]
    fn default_detection() {
        let mut state = CharsetState::default();
        assert!(state.is_default());
        state.designate(Slot::G0, Charset::DecSpecial);
        assert!(!state.is_default());
    }
}
