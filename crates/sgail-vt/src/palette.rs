//! 256-color palettes and runtime color overrides.
//!
//! [`Palette`] is the standard xterm 256-color table. [`DynamicPalette`]
//! layers OSC 4/104 mutations over a default palette while remembering which
//! slots were touched, so the default can be swapped underneath (theme
//! change) without losing user overrides. [`DynamicRgb`] is the same idea for
//! single slots such as the default foreground, background, and cursor
//! colors.

use crate::rgb::Rgb;

/// A 256-entry RGB palette.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette(pub [Rgb; 256]);

impl Default for Palette {
    /// The standard xterm table: 16 named colors, the 6x6x6 cube, and the
    /// 24-step gray ramp.
    fn default() -> Self {
        let mut table = [Rgb::default(); 256];
        const NAMED: [(u8, u8, u8); 16] = [
            (0x00, 0x00, 0x00), // black
            (0xcd, 0x00, 0x00), // red
            (0x00, 0xcd, 0x00), // green
            (0xcd, 0xcd, 0x00), // yellow
            (0x00, 0x00, 0xee), // blue
            (0xcd, 0x00, 0xcd), // magenta
            (0x00, 0xcd, 0xcd), // cyan
            (0xe5, 0xe5, 0xe5), // white
            (0x7f, 0x7f, 0x7f), // bright black
            (0xff, 0x00, 0x00), // bright red
            (0x00, 0xff, 0x00), // bright green
            (0xff, 0xff, 0x00), // bright yellow
            (0x5c, 0x5c, 0xff), // bright blue
            (0xff, 0x00, 0xff), // bright magenta
            (0x00, 0xff, 0xff), // bright cyan
            (0xff, 0xff, 0xff), // bright white
        ];
        for (i, &(r, g, b)) in NAMED.iter().enumerate() {
            table[i] = Rgb::new(r, g, b);
        }
        // 6x6x6 color cube.
        for i in 0..216 {
            let cube = |v: usize| -> u8 {
                if v == 0 { 0 } else { (v * 40 + 55) as u8 }
            };
            table[16 + i] = Rgb::new(cube(i / 36), cube((i / 6) % 6), cube(i % 6));
        }
        // Gray ramp.
        for i in 0..24 {
            let v = (8 + i * 10) as u8;
            table[232 + i] = Rgb::new(v, v, v);
        }
        Self(table)
    }
}

impl std::ops::Index<u8> for Palette {
    type Output = Rgb;

    fn index(&self, index: u8) -> &Rgb {
        &self.0[usize::from(index)]
    }
}

impl std::ops::IndexMut<u8> for Palette {
    fn index_mut(&mut self, index: u8) -> &mut Rgb {
        &mut self.0[usize::from(index)]
    }
}

/// A 256-bit set of palette indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaletteMask([u64; 4]);

impl PaletteMask {
    /// Add an index to the set.
    pub fn insert(&mut self, index: u8) {
        self.0[usize::from(index) / 64] |= 1 << (u32::from(index) % 64);
    }

    /// Remove an index from the set.
    pub fn remove(&mut self, index: u8) {
        self.0[usize::from(index) / 64] &= !(1 << (u32::from(index) % 64));
    }

    /// Whether an index is in the set.
    pub fn contains(&self, index: u8) -> bool {
        self.0[usize::from(index) / 64] & (1 << (u32::from(index) % 64)) != 0
    }

    /// Remove every index.
    pub fn clear(&mut self) {
        self.0 = [0; 4];
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }
}

/// A palette plus the default it deviates from.
///
/// `current` is what rendering reads. `original` is the configured default.
/// `changed` records every slot that was explicitly set since the last
/// full reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicPalette {
    /// The live palette.
    pub current: Palette,
    /// The configured default palette.
    pub original: Palette,
    /// Slots explicitly overridden via [`DynamicPalette::set`].
    pub changed: PaletteMask,
}

impl DynamicPalette {
    /// Override one slot.
    pub fn set(&mut self, index: u8, color: Rgb) {
        self.current[index] = color;
        self.changed.insert(index);
    }

    /// Restore one slot to its default.
    pub fn reset(&mut self, index: u8) {
        self.current[index] = self.original[index];
        self.changed.remove(index);
    }

    /// Restore every slot to its default.
    pub fn reset_all(&mut self) {
        self.current = self.original.clone();
        self.changed.clear();
    }

    /// Swap the default palette underneath the overrides.
    ///
    /// Slots in `changed` keep their current value; all others adopt the
    /// new default.
    pub fn change_default(&mut self, new_default: Palette) {
        for i in 0..=255u8 {
            if !self.changed.contains(i) {
                self.current[i] = new_default[i];
            }
        }
        self.original = new_default;
    }
}

/// A single overridable color slot (default foreground, background, cursor).
///
/// `get` prefers the runtime override, then the configured default, then
/// reports unset with `None` so the consumer can pick its own fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DynamicRgb {
    /// Runtime override (OSC 10/11/12).
    pub overridden: Option<Rgb>,
    /// Configured default.
    pub default: Option<Rgb>,
}

impl DynamicRgb {
    /// Construct with a configured default.
    pub fn with_default(default: Rgb) -> Self {
        Self {
            overridden: None,
            default: Some(default),
        }
    }

    /// The effective color, if any.
    pub fn get(&self) -> Option<Rgb> {
        self.overridden.or(self.default)
    }

    /// Apply a runtime override.
    pub fn set(&mut self, color: Rgb) {
        self.overridden = Some(color);
    }

    /// Drop the runtime override.
    pub fn reset(&mut self) {
        self.overridden = None;
    }
}
