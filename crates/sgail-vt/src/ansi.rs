//! ABI-stable ANSI enumerations.
//!
//! These types cross binary boundaries (embedder callbacks, response
//! generation), so their discriminants are explicit and documented; new
//! variants must be appended, and removed variants leave holes.

use std::fmt;

/// How an OSC request was terminated, echoed back in any response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Terminator {
    /// String terminator, `ESC \`.
    #[default]
    St = 0,
    /// BEL, `0x07`.
    Bel = 1,
}

impl Terminator {
    /// Infer the terminator from the final byte of a sequence. Anything
    /// other than BEL (including absence) is treated as ST.
    pub fn from_byte(byte: Option<u8>) -> Self {
        match byte {
            Some(0x07) => Self::Bel,
            _ => Self::St,
        }
    }

    /// The bytes that terminate a response sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::St => "\x1b\\",
            Self::Bel => "\x07",
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cursor shape as set by DECSCUSR (`CSI Ps SP q`); values are the wire
/// parameter values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CursorStyle {
    /// Terminal default.
    #[default]
    Default = 0,
    /// Blinking block.
    BlinkingBlock = 1,
    /// Steady block.
    SteadyBlock = 2,
    /// Blinking underline.
    BlinkingUnderline = 3,
    /// Steady underline.
    SteadyUnderline = 4,
    /// Blinking bar.
    BlinkingBar = 5,
    /// Steady bar.
    SteadyBar = 6,
}

impl CursorStyle {
    /// Construct from the DECSCUSR parameter value.
    pub fn from_param(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Default,
            1 => Self::BlinkingBlock,
            2 => Self::SteadyBlock,
            3 => Self::BlinkingUnderline,
            4 => Self::SteadyUnderline,
            5 => Self::BlinkingBar,
            6 => Self::SteadyBar,
            _ => return None,
        })
    }
}

/// Device attributes request classes (`CSI c`, `CSI > c`, `CSI = c`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceAttributeReq {
    /// Primary DA.
    Primary = 0,
    /// Secondary DA.
    Secondary = 1,
    /// Tertiary DA.
    Tertiary = 2,
}

/// Target of DECSSDT (`CSI Ps $ ~`): which display the host writes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusDisplay {
    /// The main display.
    #[default]
    Main = 0,
    /// The status line.
    StatusLine = 1,
}

/// xterm `modifyOtherKeys` resource levels (`CSI > 4 ; Ps m`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModifyKeyFormat {
    /// Legacy encoding only.
    #[default]
    Disabled = 0,
    /// Modified keys for well-known exceptions.
    AllowModified = 1,
    /// Report all modified keys as CSI sequences.
    ReportAll = 2,
}

impl ModifyKeyFormat {
    /// Construct from the `CSI > 4 ; Ps m` parameter.
    pub fn from_param(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Disabled,
            1 => Self::AllowModified,
            2 => Self::ReportAll,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_from_byte() {
        assert_eq!(Terminator::from_byte(Some(0x07)), Terminator::Bel);
        assert_eq!(Terminator::from_byte(Some(0x1b)), Terminator::St);
        assert_eq!(Terminator::from_byte(None), Terminator::St);
    }

    #[test]
    fn terminator_bytes() {
        assert_eq!(Terminator::Bel.as_str(), "\x07");
        assert_eq!(Terminator::St.as_str(), "\x1b\\");
    }

    #[test]
    fn cursor_style_wire_values() {
        assert_eq!(CursorStyle::BlinkingBlock as u8, 1);
        assert_eq!(CursorStyle::SteadyBar as u8, 6);
        assert_eq!(CursorStyle::from_param(3), Some(CursorStyle::BlinkingUnderline));
        assert_eq!(CursorStyle::from_param(7), None);
    }

    #[test]
    fn modify_key_format_params() {
        assert_eq!(ModifyKeyFormat::from_param(2), Some(ModifyKeyFormat::ReportAll));
        assert_eq!(ModifyKeyFormat::from_param(3), None);
    }
}
