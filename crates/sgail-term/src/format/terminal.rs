//! The terminal formatter: active-area content plus whole-terminal VT
//! extras.
//!
//! The emission order is chosen so that replaying the output into a fresh
//! terminal of the same dimensions reconstructs the enumerated state:
//! content first (a fresh terminal has default modes and no region), then
//! palette, modes, tabstops, the scrolling region, modify-other-keys and
//! pwd, and the screen extras (cursor state) last.

use crate::error::Result;
use crate::format::{Emit, Extras, Options, PageListFormatter, ScreenFormatter, Sink};
use crate::modes::Mode;
use crate::point::Space;
use crate::terminal::Terminal;

/// Formats a whole terminal.
pub struct TerminalFormatter<'a> {
    terminal: &'a Terminal,
    opts: Options,
    extras: Extras,
}

impl<'a> TerminalFormatter<'a> {
    /// A formatter over `terminal` with no extras.
    pub fn new(terminal: &'a Terminal, opts: Options) -> Self {
        Self {
            terminal,
            opts,
            extras: Extras::default(),
        }
    }

    /// Enable extras.
    #[must_use]
    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    /// Format the active area and the enabled extras.
    pub fn format(&self, sink: &mut Sink<'_>) -> Result<()> {
        let screen = self.terminal.active_screen();
        let content = PageListFormatter::new(&screen.pages, self.opts);
        content.format(
            sink,
            screen.pages.top_left(Space::Active),
            screen.pages.bottom_right(Space::Active),
        )?;
        if self.opts.emit != Emit::Vt {
            return Ok(());
        }

        // Extra bytes map to the cursor's pin.
        let pin = screen.cursor_pin();

        if self.extras.palette {
            let palette = &self.terminal.colors.palette.current;
            for i in 0..=255u16 {
                let c = palette[i as u8];
                sink.put(
                    &format!(
                        "\x1b]4;{i};rgb:{:02x}/{:02x}/{:02x}\x1b\\",
                        c.r, c.g, c.b
                    ),
                    pin,
                )?;
            }
        }

        if self.extras.modes {
            for (mode, value) in self.terminal.modes.non_default() {
                let prefix = if mode.is_private() { "?" } else { "" };
                let action = if value { 'h' } else { 'l' };
                sink.put(&format!("\x1b[{prefix}{}{action}", mode.number()), pin)?;
            }
        }

        if self.extras.tabstops && !self.terminal.tabstops.is_default() {
            sink.put("\x1b[3g", pin)?;
            for col in self.terminal.tabstops.iter() {
                sink.put(&format!("\x1b[{}G\x1bH", col + 1), pin)?;
            }
        }

        if self.extras.scroll_region {
            let region = self.terminal.stored_region();
            if region.top != 0 || region.bottom != self.terminal.rows() - 1 {
                sink.put(
                    &format!("\x1b[{};{}r", region.top + 1, region.bottom + 1),
                    pin,
                )?;
            }
            if self.terminal.modes.get(Mode::LeftRightMargins)
                && (region.left != 0 || region.right != self.terminal.cols() - 1)
            {
                sink.put(
                    &format!("\x1b[{};{}s", region.left + 1, region.right + 1),
                    pin,
                )?;
            }
        }

        if self.extras.modify_other_keys {
            let level = self.terminal.modify_other_keys as u8;
            if level != 0 {
                sink.put(&format!("\x1b[>4;{level}m"), pin)?;
            }
        }

        if self.extras.pwd && !self.terminal.pwd.is_empty() {
            sink.put(&format!("\x1b]7;{}\x1b\\", self.terminal.pwd), pin)?;
        }

        let screen_extras = ScreenFormatter::new(screen, self.opts).with_extras(self.extras);
        if self.terminal.modes.get(Mode::Origin) {
            screen_extras
                .with_origin(self.terminal.stored_region())
                .write_extras(sink)?;
        } else {
            screen_extras.write_extras(sink)?;
        }
        Ok(())
    }
}
