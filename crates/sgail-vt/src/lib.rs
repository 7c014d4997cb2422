//! sgail-vt: wire-level VT building blocks.
//!
//! This crate holds the pieces of a terminal emulator that deal with bytes
//! and values rather than screen state: the incremental OSC parser and its
//! command model, the color model (RGB specifications, the 256-color
//! palette, dynamic overrides, luminance and contrast), the SGR style type
//! cells reference, character-set designation and translation, the kitty
//! keyboard flag stack, and the ABI-stable ANSI enumerations.

pub mod ansi;
pub mod charset;
pub mod error;
pub mod kitty;
pub mod osc;
pub mod palette;
pub mod rgb;
pub mod style;

mod x11;

pub use ansi::{CursorStyle, DeviceAttributeReq, ModifyKeyFormat, StatusDisplay, Terminator};
pub use error::{Result, VtError};
pub use osc::{Command, Parser};
pub use palette::{DynamicPalette, DynamicRgb, Palette, PaletteMask};
pub use rgb::Rgb;
pub use style::{ColorSpec, Style, UnderlineStyle};
