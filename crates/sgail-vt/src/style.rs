//! SGR style attributes for terminal cells.
//!
//! A [`Style`] is the full set of graphic-rendition attributes a cell can
//! carry. Styles are small, `Copy`, and hashable so the page store can
//! intern them behind 16-bit ids.

use std::fmt;

use crate::rgb::Rgb;

/// A color as referenced by a style: unset, a palette slot, or true color.
///
/// Keeping palette references symbolic (instead of resolving them to RGB at
/// write time) lets a later palette change restyle existing cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpec {
    /// Use the terminal default for this slot.
    #[default]
    Default,
    /// An index into the 256-color palette.
    Palette(u8),
    /// A 24-bit color.
    Rgb(Rgb),
}

/// Underline rendition (SGR 4 and its colon subparameters).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnderlineStyle {
    /// No underline.
    #[default]
    None,
    /// Single straight underline.
    Single,
    /// Double underline.
    Double,
    /// Curly (undercurl) underline.
    Curly,
    /// Dotted underline.
    Dotted,
    /// Dashed underline.
    Dashed,
}

/// The full set of SGR attributes for one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    /// Foreground color.
    pub fg: ColorSpec,
    /// Background color.
    pub bg: ColorSpec,
    /// Underline color; `Default` follows the foreground.
    pub underline_color: ColorSpec,
    /// Underline rendition.
    pub underline: UnderlineStyle,
    /// Bold intensity.
    pub bold: bool,
    /// Faint intensity.
    pub faint: bool,
    /// Italic.
    pub italic: bool,
    /// Blinking.
    pub blink: bool,
    /// Reverse video.
    pub inverse: bool,
    /// Concealed.
    pub invisible: bool,
    /// Struck through.
    pub strikethrough: bool,
}

impl Style {
    /// Whether every attribute is at its default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Write this style as one combined SGR sequence (`ESC [ ... m`).
    ///
    /// Emits nothing for a default style. Palette colors use the 256-color
    /// forms `38;5;N` / `48;5;N`; RGB colors use `38;2;R;G;B` / `48;2;R;G;B`.
    pub fn write_sgr<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        if self.is_default() {
            return Ok(());
        }
        let mut params = SgrParams::new(out);
        if self.bold {
            params.push("1")?;
        }
        if self.faint {
            params.push("2")?;
        }
        if self.italic {
            params.push("3")?;
        }
        match self.underline {
            UnderlineStyle::None => {}
            UnderlineStyle::Single => params.push("4")?,
            UnderlineStyle::Double => params.push("4:2")?,
            UnderlineStyle::Curly => params.push("4:3")?,
            UnderlineStyle::Dotted => params.push("4:4")?,
            UnderlineStyle::Dashed => params.push("4:5")?,
        }
        if self.blink {
            params.push("5")?;
        }
        if self.inverse {
            params.push("7")?;
        }
        if self.invisible {
            params.push("8")?;
        }
        if self.strikethrough {
            params.push("9")?;
        }
        match self.fg {
            ColorSpec::Default => {}
            ColorSpec::Palette(i) => params.push_fmt(format_args!("38;5;{i}"))?,
            ColorSpec::Rgb(c) => {
                params.push_fmt(format_args!("38;2;{};{};{}", c.r, c.g, c.b))?;
            }
        }
        match self.bg {
            ColorSpec::Default => {}
            ColorSpec::Palette(i) => params.push_fmt(format_args!("48;5;{i}"))?,
            ColorSpec::Rgb(c) => {
                params.push_fmt(format_args!("48;2;{};{};{}", c.r, c.g, c.b))?;
            }
        }
        match self.underline_color {
            ColorSpec::Default => {}
            ColorSpec::Palette(i) => params.push_fmt(format_args!("58;5;{i}"))?,
            ColorSpec::Rgb(c) => {
                params.push_fmt(format_args!("58;2;{};{};{}", c.r, c.g, c.b))?;
            }
        }
        params.finish()
    }

    /// The combined SGR sequence as a string; empty for the default style.
    pub fn sgr(&self) -> String {
        let mut s = String::new();
        // Infallible for String targets.
        let _ = self.write_sgr(&mut s);
        s
    }
}

/// Incremental writer for a single `ESC [ p1 ; p2 ; ... m` sequence.
struct SgrParams<'a, W: fmt::Write> {
    out: &'a mut W,
    any: bool,
}

impl<'a, W: fmt::Write> SgrParams<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self { out, any: false }
    }

    fn separator(&mut self) -> fmt::Result {
        if self.any {
            self.out.write_char(';')
        } else {
            self.any = true;
            self.out.write_str("\x1b[")
        }
    }

    fn push(&mut self, param: &str) -> fmt::Result {
        self.separator()?;
        self.out.write_str(param)
    }

    fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.separator()?;
        self.out.write_fmt(args)
    }

    fn finish(self) -> fmt::Result {
        if self.any {
            self.out.write_char('m')
        } else {
            Ok(())
        }
    }
}
