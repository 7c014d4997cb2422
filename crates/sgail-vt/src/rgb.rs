//! 24-bit RGB color type and the X11-style color specification parser.
//!
//! [`Rgb::parse`] accepts the four specification forms used by OSC color
//! operations: `rgb:h/h/h`, `rgbi:f/f/f`, `#hex`, and X11 color names.

use std::fmt;

use crate::error::{Result, VtError};
use crate::x11;

/// A 24-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

impl Rgb {
    /// Construct a color from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse an X11-style color specification.
    ///
    /// Supported forms:
    /// - `rgb:h/h/h` with 1–4 hex digits per channel, scaled to 8 bits via
    ///   `floor(value * 255 / (16^n - 1))`.
    /// - `rgbi:f/f/f` with floats in `[0.0, 1.0]`, scaled by 255.
    /// - `#hex` with 3, 6, 9, or 12 hex digits total, split evenly across
    ///   channels; each channel keeps its most significant 8 bits
    ///   (XParseColor semantics).
    /// - X11 color names, case-insensitive with surrounding whitespace
    ///   trimmed.
    ///
    /// Every malformed input yields [`VtError::InvalidFormat`].
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix("rgb:") {
            return Self::parse_rgb_scaled(rest);
        }
        if let Some(rest) = input.strip_prefix("rgbi:") {
            return Self::parse_rgb_intensity(rest);
        }
        if let Some(rest) = input.strip_prefix('#') {
            return Self::parse_hex(rest);
        }
        x11::lookup(input).ok_or(VtError::InvalidFormat)
    }

    /// Parse the `h/h/h` tail of an `rgb:` specification.
    fn parse_rgb_scaled(rest: &str) -> Result<Self> {
        let mut channels = [0u8; 3];
        let mut parts = rest.split('/');
        for channel in &mut channels {
            let part = parts.next().ok_or(VtError::InvalidFormat)?;
            if part.is_empty() || part.len() > 4 {
                return Err(VtError::InvalidFormat);
            }
            let value =
                u32::from_str_radix(part, 16).map_err(|_| VtError::InvalidFormat)?;
            // Scale an n-digit channel to 8 bits.
            let max = (1u32 << (4 * part.len() as u32)) - 1;
            *channel = (value * 255 / max) as u8;
        }
        if parts.next().is_some() {
            return Err(VtError::InvalidFormat);
        }
        Ok(Self::new(channels[0], channels[1], channels[2]))
    }

    /// Parse the `f/f/f` tail of an `rgbi:` specification.
    fn parse_rgb_intensity(rest: &str) -> Result<Self> {
        let mut channels = [0u8; 3];
        let mut parts = rest.split('/');
        for channel in &mut channels {
            let part = parts.next().ok_or(VtError::InvalidFormat)?;
            let value: f64 = part.parse().map_err(|_| VtError::InvalidFormat)?;
            if !(0.0..=1.0).contains(&value) {
                return Err(VtError::InvalidFormat);
            }
            *channel = (value * 255.0).round() as u8;
        }
        if parts.next().is_some() {
            return Err(VtError::InvalidFormat);
        }
        Ok(Self::new(channels[0], channels[1], channels[2]))
    }

    /// Parse the digits of a `#hex` specification.
    fn parse_hex(digits: &str) -> Result<Self> {
        if !digits.is_ascii() {
            return Err(VtError::InvalidFormat);
        }
        let per_channel = match digits.len() {
            3 => 1,
            6 => 2,
            9 => 3,
            12 => 4,
            _ => return Err(VtError::InvalidFormat),
        };
        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            let part = &digits[i * per_channel..(i + 1) * per_channel];
            let value =
                u32::from_str_radix(part, 16).map_err(|_| VtError::InvalidFormat)?;
            // Keep the most significant 8 bits of the channel.
            *channel = match per_channel {
                1 => (value << 4) as u8,
                2 => value as u8,
                3 => (value >> 4) as u8,
                _ => (value >> 8) as u8,
            };
        }
        Ok(Self::new(channels[0], channels[1], channels[2]))
    }

    /// WCAG 2.0 relative luminance (sRGB component transform,
    /// coefficients 0.2126 / 0.7152 / 0.0722).
    pub fn luminance(self) -> f64 {
        fn linear(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// WCAG 2.0 contrast ratio against another color, always >= 1.0.
    pub fn contrast(self, other: Self) -> f64 {
        let a = self.luminance();
        let b = other.luminance();
        let (light, dark) = if a > b { (a, b) } else { (b, a) };
        (light + 0.05) / (dark + 0.05)
    }

    /// Perceived luminance using the W3C AERT coefficients
    /// 0.299 / 0.587 / 0.114, in `[0.0, 1.0]`.
    pub fn perceived_luminance(self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b))
            / 255.0
    }
}

impl fmt::Display for Rgb {
    /// Formats as `#RRGGBB`, the canonical round-trippable form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
