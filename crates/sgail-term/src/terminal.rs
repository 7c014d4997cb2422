//! The terminal aggregate: screens plus the state shared across them.
//!
//! The external VT byte-stream parser drives this type. Operations that
//! depend on modes or the scrolling region live here and delegate to the
//! active [`Screen`]'s primitives with that context supplied.

use sgail_vt::ansi::{CursorStyle, ModifyKeyFormat, Terminator};
use sgail_vt::osc::{ColorRequest, ColorTarget, DynamicColor};
use sgail_vt::{DynamicPalette, DynamicRgb, Rgb};
use tracing::debug;

use crate::error::Result;
use crate::hyperlink::Hyperlink;
use crate::modes::{Mode, ModeState};
use crate::screen::{EraseDisplay, PrintOptions, Screen, ScrollRegion};
use crate::screenset::{ScreenKey, ScreenSet};
use crate::tabstops::Tabstops;

/// Terminal-level dirty bits. Writers set, the render snapshot clears.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminalDirty(u32);

impl TerminalDirty {
    /// Palette or dynamic colors changed.
    pub const PALETTE: u32 = 1 << 0;
    /// A mode changed.
    pub const MODES: u32 = 1 << 1;
    /// The scrolling region changed.
    pub const SCROLL_REGION: u32 = 1 << 2;
    /// Tab stops changed.
    pub const TABSTOPS: u32 = 1 << 3;
    /// The working directory changed.
    pub const PWD: u32 = 1 << 4;
    /// The active screen changed.
    pub const SCREEN_SWITCH: u32 = 1 << 5;

    /// Set bits.
    pub fn set(&mut self, bits: u32) {
        self.0 |= bits;
    }

    /// Whether any bit is set.
    pub fn any(&self) -> bool {
        self.0 != 0
    }

    /// Whether specific bits are set.
    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits != 0
    }

    /// Reader acknowledgment: clear everything.
    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Dynamic color state shared across screens.
#[derive(Clone, Debug, Default)]
pub struct TerminalColors {
    /// The 256-color palette with override tracking.
    pub palette: DynamicPalette,
    /// Default foreground.
    pub foreground: DynamicRgb,
    /// Default background.
    pub background: DynamicRgb,
    /// Cursor color.
    pub cursor: DynamicRgb,
}

/// Construction options.
#[derive(Clone, Copy, Debug)]
pub struct TerminalOptions {
    /// Column count.
    pub cols: usize,
    /// Row count.
    pub rows: usize,
    /// Scrollback rows kept beyond the active area.
    pub max_scrollback: usize,
}

/// A full terminal: screen set plus shared state.
pub struct Terminal {
    /// The primary/alternate screen pair.
    pub screens: ScreenSet,
    /// Mode state.
    pub modes: ModeState,
    /// Tab stops.
    pub tabstops: Tabstops,
    /// Working directory from OSC 7.
    pub pwd: String,
    /// xterm modifyOtherKeys level.
    pub modify_other_keys: ModifyKeyFormat,
    /// DECSCUSR cursor shape.
    pub cursor_style: CursorStyle,
    /// Palette and dynamic colors.
    pub colors: TerminalColors,
    /// Terminal-level dirty bits.
    pub dirty: TerminalDirty,
    scroll_region: ScrollRegion,
    cols: usize,
    rows: usize,
}

impl Terminal {
    /// A fresh terminal.
    pub fn new(opts: TerminalOptions) -> Self {
        Self {
            screens: ScreenSet::new(opts.cols, opts.rows, opts.max_scrollback),
            modes: ModeState::default(),
            tabstops: Tabstops::new(opts.cols),
            pwd: String::new(),
            modify_other_keys: ModifyKeyFormat::default(),
            cursor_style: CursorStyle::default(),
            colors: TerminalColors::default(),
            dirty: TerminalDirty::default(),
            scroll_region: ScrollRegion::full(opts.cols, opts.rows),
            cols: opts.cols,
            rows: opts.rows,
        }
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The effective scrolling region: left/right margins apply only while
    /// DECLRMM is set.
    pub fn region(&self) -> ScrollRegion {
        let mut region = self.scroll_region;
        if !self.modes.get(Mode::LeftRightMargins) {
            region.left = 0;
            region.right = self.cols - 1;
        }
        region
    }

    /// The stored scrolling region as set by DECSTBM/DECSLRM.
    pub fn stored_region(&self) -> ScrollRegion {
        self.scroll_region
    }

    // --- Printing and C0 controls ---

    /// Print one codepoint at the cursor.
    pub fn print(&mut self, cp: char) -> Result<()> {
        let opts = PrintOptions {
            autowrap: self.modes.get(Mode::Autowrap),
            insert: self.modes.get(Mode::Insert),
            region: self.region(),
        };
        self.screens.active_mut().print(cp, opts)
    }

    /// LF (and VT/FF): index, plus carriage return under LNM.
    pub fn linefeed(&mut self) -> Result<()> {
        let region = self.region();
        self.screens.active_mut().linefeed(region)?;
        if self.modes.get(Mode::Linefeed) {
            self.carriage_return();
        }
        Ok(())
    }

    /// CR.
    pub fn carriage_return(&mut self) {
        let region = self.region();
        self.screens.active_mut().carriage_return(region);
    }

    /// BS.
    pub fn backspace(&mut self) {
        self.screens.active_mut().backspace();
    }

    /// HT: advance to the next tab stop.
    pub fn horizontal_tab(&mut self) {
        let screen = self.screens.active_mut();
        let x = screen.cursor.x;
        screen.cursor.pending_wrap = false;
        let next = self.tabstops.next_stop(x);
        screen.set_cursor(next, screen.cursor.y);
    }

    /// CBT: move back to the previous tab stop.
    pub fn horizontal_tab_back(&mut self) {
        let screen = self.screens.active_mut();
        let x = screen.cursor.x;
        screen.cursor.pending_wrap = false;
        let prev = self.tabstops.prev_stop(x);
        screen.set_cursor(prev, screen.cursor.y);
    }

    // --- Cursor addressing ---

    /// CUP/HVP with origin-mode translation. Coordinates are 0-based.
    pub fn cursor_to(&mut self, x: usize, y: usize) {
        let region = self.region();
        let (x, y) = if self.modes.get(Mode::Origin) {
            (
                (region.left + x).min(region.right),
                (region.top + y).min(region.bottom),
            )
        } else {
            (x, y)
        };
        self.screens.active_mut().set_cursor(x, y);
    }

    /// CUU.
    pub fn cursor_up(&mut self, n: usize) {
        let screen = self.screens.active_mut();
        let y = screen.cursor.y.saturating_sub(n.max(1));
        screen.set_cursor(screen.cursor.x, y);
    }

    /// CUD.
    pub fn cursor_down(&mut self, n: usize) {
        let screen = self.screens.active_mut();
        let y = screen.cursor.y + n.max(1);
        screen.set_cursor(screen.cursor.x, y);
    }

    /// CUB.
    pub fn cursor_left(&mut self, n: usize) {
        let screen = self.screens.active_mut();
        let x = screen.cursor.x.saturating_sub(n.max(1));
        screen.set_cursor(x, screen.cursor.y);
    }

    /// CUF.
    pub fn cursor_right(&mut self, n: usize) {
        let screen = self.screens.active_mut();
        let x = screen.cursor.x + n.max(1);
        screen.set_cursor(x, screen.cursor.y);
    }

    // --- Modes ---

    /// Set or reset a mode, with its side effects.
    pub fn set_mode(&mut self, mode: Mode, value: bool) {
        self.modes.set(mode, value);
        self.dirty.set(TerminalDirty::MODES);
        if mode == Mode::Origin {
            // DECOM homes the cursor.
            self.cursor_to(0, 0);
        }
    }

    // --- Scrolling region ---

    /// DECSTBM. Bounds are 0-based inclusive; invalid bounds reset to the
    /// full screen. Homes the cursor.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let bottom = bottom.min(self.rows - 1);
        if top < bottom {
            self.scroll_region.top = top;
            self.scroll_region.bottom = bottom;
        } else {
            self.scroll_region.top = 0;
            self.scroll_region.bottom = self.rows - 1;
        }
        self.dirty.set(TerminalDirty::SCROLL_REGION);
        self.cursor_to(0, 0);
    }

    /// DECSLRM. Bounds are 0-based inclusive; invalid bounds reset to the
    /// full width. Homes the cursor.
    pub fn set_lr_margins(&mut self, left: usize, right: usize) {
        let right = right.min(self.cols - 1);
        if left < right {
            self.scroll_region.left = left;
            self.scroll_region.right = right;
        } else {
            self.scroll_region.left = 0;
            self.scroll_region.right = self.cols - 1;
        }
        self.dirty.set(TerminalDirty::SCROLL_REGION);
        self.cursor_to(0, 0);
    }

    // --- Tab stops ---

    /// HTS at the cursor column.
    pub fn tab_set(&mut self) {
        let col = self.screens.active().cursor.x;
        self.tabstops.set(col);
        self.dirty.set(TerminalDirty::TABSTOPS);
    }

    /// TBC 0 at the cursor column.
    pub fn tab_clear(&mut self) {
        let col = self.screens.active().cursor.x;
        self.tabstops.clear(col);
        self.dirty.set(TerminalDirty::TABSTOPS);
    }

    /// TBC 3: clear all stops.
    pub fn tab_clear_all(&mut self) {
        self.tabstops.clear_all();
        self.dirty.set(TerminalDirty::TABSTOPS);
    }

    /// DECST8C: restore the default interval.
    pub fn tab_reset(&mut self) {
        self.tabstops.reset();
        self.dirty.set(TerminalDirty::TABSTOPS);
    }

    // --- Alternate screen ---

    /// Switch to the alternate screen (modes 47/1047/1049), creating it on
    /// first use. `clear` erases it on entry (1049 behavior).
    pub fn enter_alt_screen(&mut self, clear: bool) -> Result<()> {
        self.screens.get_init(ScreenKey::Alternate);
        // Initialized above, so the switch cannot fail.
        let _ = self.screens.switch_to(ScreenKey::Alternate);
        self.dirty.set(TerminalDirty::SCREEN_SWITCH);
        if clear {
            self.screens
                .active_mut()
                .erase_display(EraseDisplay::Complete, false)?;
        }
        Ok(())
    }

    /// Return to the primary screen.
    pub fn leave_alt_screen(&mut self) {
        if self.screens.active_key() == ScreenKey::Alternate {
            let _ = self.screens.switch_to(ScreenKey::Primary);
            self.dirty.set(TerminalDirty::SCREEN_SWITCH);
        }
    }

    // --- Hyperlinks ---

    /// OSC 8 with a URI: subsequent prints carry the link.
    pub fn start_hyperlink(&mut self, id: Option<String>, uri: String) {
        self.screens.active_mut().cursor.hyperlink = Some(Hyperlink { id, uri });
    }

    /// OSC 8 terminator: subsequent prints carry no link.
    pub fn end_hyperlink(&mut self) {
        self.screens.active_mut().cursor.hyperlink = None;
    }

    // --- Colors ---

    /// Apply the mutating requests of a color operation (OSC 4/5/10..19/
    /// 104/110..119). `op == 104` with no requests resets the whole
    /// palette. Query requests are answered by
    /// [`Terminal::color_response`], not here.
    pub fn apply_color_operation(&mut self, op: u16, requests: &[ColorRequest]) {
        if op == 104 && requests.is_empty() {
            self.colors.palette.reset_all();
            self.dirty.set(TerminalDirty::PALETTE);
            return;
        }
        for request in requests {
            match *request {
                ColorRequest::Set(target, rgb) => match target {
                    ColorTarget::Palette(i) => self.colors.palette.set(i, rgb),
                    ColorTarget::Dynamic(slot) => {
                        if let Some(color) = self.dynamic_slot_mut(slot) {
                            color.set(rgb);
                        }
                    }
                    ColorTarget::Special(n) => {
                        debug!(slot = n, "special color slots are not rendered");
                    }
                },
                ColorRequest::Reset(target) => match target {
                    ColorTarget::Palette(i) => self.colors.palette.reset(i),
                    ColorTarget::Dynamic(slot) => {
                        if let Some(color) = self.dynamic_slot_mut(slot) {
                            color.reset();
                        }
                    }
                    ColorTarget::Special(_) => {}
                },
                ColorRequest::Query(_) => {}
            }
        }
        self.dirty.set(TerminalDirty::PALETTE);
    }

    /// The response sequence for a query request, echoing the request's
    /// terminator. `None` for non-queries and unanswerable slots.
    pub fn color_response(
        &self,
        request: &ColorRequest,
        terminator: Terminator,
    ) -> Option<String> {
        let ColorRequest::Query(target) = request else {
            return None;
        };
        match *target {
            ColorTarget::Palette(i) => {
                let c = self.colors.palette.current[i];
                Some(format!(
                    "\x1b]4;{i};rgb:{:02x}/{:02x}/{:02x}{terminator}",
                    c.r, c.g, c.b
                ))
            }
            ColorTarget::Dynamic(slot) => {
                let c = self.dynamic_slot(slot)?.get()?;
                Some(format!(
                    "\x1b]{};rgb:{:02x}/{:02x}/{:02x}{terminator}",
                    slot as u8, c.r, c.g, c.b
                ))
            }
            ColorTarget::Special(_) => None,
        }
    }

    /// The effective default background, falling back to palette black.
    pub fn background_color(&self) -> Rgb {
        self.colors
            .background
            .get()
            .unwrap_or(self.colors.palette.current[0])
    }

    /// The effective default foreground, falling back to palette white.
    pub fn foreground_color(&self) -> Rgb {
        self.colors
            .foreground
            .get()
            .unwrap_or(self.colors.palette.current[7])
    }

    fn dynamic_slot(&self, slot: DynamicColor) -> Option<&DynamicRgb> {
        match slot {
            DynamicColor::Foreground => Some(&self.colors.foreground),
            DynamicColor::Background => Some(&self.colors.background),
            DynamicColor::Cursor => Some(&self.colors.cursor),
            _ => None,
        }
    }

    fn dynamic_slot_mut(&mut self, slot: DynamicColor) -> Option<&mut DynamicRgb> {
        match slot {
            DynamicColor::Foreground => Some(&mut self.colors.foreground),
            DynamicColor::Background => Some(&mut self.colors.background),
            DynamicColor::Cursor => Some(&mut self.colors.cursor),
            _ => {
                debug!(?slot, "unhandled dynamic color slot");
                None
            }
        }
    }

    // --- Working directory ---

    /// OSC 7.
    pub fn set_pwd(&mut self, pwd: impl Into<String>) {
        self.pwd = pwd.into();
        self.dirty.set(TerminalDirty::PWD);
    }

    /// The active screen (shorthand).
    pub fn active_screen(&self) -> &Screen {
        self.screens.active()
    }

    /// The active screen, mutably (shorthand).
    pub fn active_screen_mut(&mut self) -> &mut Screen {
        self.screens.active_mut()
    }
}
