//! The primary/alternate screen pair.
//!
//! The primary screen always exists and cannot be removed. The alternate is
//! created lazily on first use (typically mode 1047/1049) and carries no
//! scrollback.

use crate::error::{Result, TermError};
use crate::screen::Screen;

/// Which screen. Discriminants are stable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScreenKey {
    /// The normal screen with scrollback.
    #[default]
    Primary = 0,
    /// The alternate screen (fullscreen apps), no scrollback.
    Alternate = 1,
}

/// Owns the primary and (optionally) alternate screens and tracks which is
/// active.
pub struct ScreenSet {
    primary: Screen,
    alternate: Option<Screen>,
    active: ScreenKey,
    cols: usize,
    rows: usize,
}

impl ScreenSet {
    /// Create the set with its primary screen.
    pub fn new(cols: usize, rows: usize, max_scrollback: usize) -> Self {
        Self {
            primary: Screen::new(cols, rows, max_scrollback),
            alternate: None,
            active: ScreenKey::Primary,
            cols,
            rows,
        }
    }

    /// A screen, if initialized.
    pub fn get(&self, key: ScreenKey) -> Option<&Screen> {
        match key {
            ScreenKey::Primary => Some(&self.primary),
            ScreenKey::Alternate => self.alternate.as_ref(),
        }
    }

    /// Mutable access to a screen, if initialized.
    pub fn get_mut(&mut self, key: ScreenKey) -> Option<&mut Screen> {
        match key {
            ScreenKey::Primary => Some(&mut self.primary),
            ScreenKey::Alternate => self.alternate.as_mut(),
        }
    }

    /// A screen, created on first request. The alternate is created
    /// without scrollback.
    pub fn get_init(&mut self, key: ScreenKey) -> &mut Screen {
        match key {
            ScreenKey::Primary => &mut self.primary,
            ScreenKey::Alternate => self
                .alternate
                .get_or_insert_with(|| Screen::new(self.cols, self.rows, 0)),
        }
    }

    /// Switch the active screen. The target must already be initialized.
    pub fn switch_to(&mut self, key: ScreenKey) -> Result<()> {
        if self.get(key).is_none() {
            return Err(TermError::ScreenNotInitialized);
        }
        self.active = key;
        Ok(())
    }

    /// Remove a screen. The primary cannot be removed; removing the active
    /// alternate switches back to the primary.
    pub fn remove(&mut self, key: ScreenKey) -> Result<()> {
        match key {
            ScreenKey::Primary => Err(TermError::PrimaryScreenRemoval),
            ScreenKey::Alternate => {
                self.alternate = None;
                if self.active == ScreenKey::Alternate {
                    self.active = ScreenKey::Primary;
                }
                Ok(())
            }
        }
    }

    /// The active screen's key.
    pub fn active_key(&self) -> ScreenKey {
        self.active
    }

    /// The active screen.
    pub fn active(&self) -> &Screen {
        match self.active {
            ScreenKey::Primary => &self.primary,
            ScreenKey::Alternate => self.alternate.as_ref().unwrap_or(&self.primary),
        }
    }

    /// The active screen, mutably.
    pub fn active_mut(&mut self) -> &mut Screen {
        match self.active {
            ScreenKey::Primary => &mut self.primary,
            ScreenKey::Alternate => match self.alternate.as_mut() {
                Some(alt) => alt,
                None => &mut self.primary,
            },
        }
    }

    /// Keys of every initialized screen, primary first.
    pub fn keys(&self) -> Vec<ScreenKey> {
        let mut keys = vec![ScreenKey::Primary];
        if self.alternate.is_some() {
            keys.push(ScreenKey::Alternate);
        }
        keys
    }
}
