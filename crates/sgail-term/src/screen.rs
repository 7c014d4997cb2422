//! One logical screen: a page list plus cursor, charsets, kitty keyboard
//! state, selection, and screen-level dirty bits.
//!
//! The screen owns the mutation primitives the external VT byte-stream
//! parser drives (printing, scrolling, erasing, insert/delete). Anything
//! that depends on terminal-wide state — modes, the scrolling region — takes
//! that state as an argument; the [`crate::terminal::Terminal`] wrapper
//! supplies it.

use sgail_vt::charset::{ActiveSlot, Charset, CharsetState, Slot};
use sgail_vt::kitty::{KeyFlagStack, KeyFlags, KeySetMode};
use sgail_vt::{ColorSpec, Style};
use unicode_width::UnicodeWidthChar;

use crate::error::Result;
use crate::hyperlink::Hyperlink;
use crate::page::{CellContent, Wide};
use crate::pagelist::{PageList, Pin, TrackedPinId};
use crate::point::{Point, Position, Space};

/// Screen-level dirty bits. Writers set, the render snapshot clears.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenDirty(u32);

impl ScreenDirty {
    /// Selection changed.
    pub const SELECTION: u32 = 1 << 0;
    /// Charset state changed.
    pub const CHARSET: u32 = 1 << 1;
    /// Kitty keyboard flags changed.
    pub const KITTY_KEYBOARD: u32 = 1 << 2;
    /// The whole screen was cleared.
    pub const CLEAR: u32 = 1 << 3;

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

/// The cursor of one screen.
#[derive(Debug)]
pub struct Cursor {
    /// Column in active coordinates.
    pub x: usize,
    /// Row in active coordinates.
    pub y: usize,
    /// Tracked pin of the cursor cell.
    pub pin: TrackedPinId,
    /// Pending style applied to subsequent prints.
    pub style: Style,
    /// Pending hyperlink applied to subsequent prints.
    pub hyperlink: Option<Hyperlink>,
    /// The last print landed in the final column; the next print wraps
    /// first (when autowrap is on).
    pub pending_wrap: bool,
    /// DECSCA: subsequent prints are protected from selective erase.
    pub protected: bool,
}

/// State saved by DECSC and restored by DECRC.
#[derive(Clone, Debug)]
pub struct SavedCursor {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Pending style.
    pub style: Style,
    /// Pending wrap flag.
    pub pending_wrap: bool,
    /// Protection attribute.
    pub protected: bool,
    /// Charset state.
    pub charsets: CharsetState,
}

/// An active selection between two tracked pins.
#[derive(Clone, Copy, Debug)]
pub struct Selection {
    /// Where the selection started.
    pub anchor: TrackedPinId,
    /// The moving end of the selection.
    pub head: TrackedPinId,
    /// Rectangular (block) selection.
    pub rectangular: bool,
}

/// The scrolling region in active coordinates, all bounds inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollRegion {
    /// Top row.
    pub top: usize,
    /// Bottom row.
    pub bottom: usize,
    /// Left column.
    pub left: usize,
    /// Right column.
    pub right: usize,
}

impl ScrollRegion {
    /// The full-screen region.
    pub fn full(cols: usize, rows: usize) -> Self {
        Self {
            top: 0,
            bottom: rows - 1,
            left: 0,
            right: cols - 1,
        }
    }

    /// Whether the region covers the full screen.
    pub fn is_full(&self, cols: usize, rows: usize) -> bool {
        *self == Self::full(cols, rows)
    }

    /// Whether the region spans every column.
    pub fn full_width(&self, cols: usize) -> bool {
        self.left == 0 && self.right == cols - 1
    }
}

/// Per-print context supplied by the terminal.
#[derive(Clone, Copy, Debug)]
pub struct PrintOptions {
    /// DECAWM autowrap.
    pub autowrap: bool,
    /// IRM insert mode.
    pub insert: bool,
    /// Current scrolling region.
    pub region: ScrollRegion,
}

/// Line-erase variants (EL).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseLine {
    /// Cursor to end of line.
    Right,
    /// Start of line to cursor.
    Left,
    /// Whole line.
    All,
}

/// Display-erase variants (ED).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseDisplay {
    /// Cursor to end of screen.
    Below,
    /// Start of screen to cursor.
    Above,
    /// Whole screen.
    Complete,
    /// Scrollback only.
    Scrollback,
}

/// One logical buffer (primary or alternate).
pub struct Screen {
    /// The paged cell storage.
    pub pages: PageList,
    /// The cursor.
    pub cursor: Cursor,
    /// DECSC state.
    pub saved_cursor: Option<SavedCursor>,
    /// Charset designations and invocations.
    pub charsets: CharsetState,
    /// Kitty keyboard flag stack.
    pub kitty_keyboard: KeyFlagStack,
    /// Screen-level dirty bits.
    pub dirty: ScreenDirty,
    selection: Option<Selection>,
    cols: usize,
    rows: usize,
}

impl Screen {
    /// A blank screen.
    pub fn new(cols: usize, rows: usize, max_scrollback: usize) -> Self {
        let mut pages = PageList::new(cols, rows, max_scrollback);
        let pin = pages.top_left(Space::Active);
        let pin = pages.track(pin);
        Self {
            pages,
            cursor: Cursor {
                x: 0,
                y: 0,
                pin,
                style: Style::default(),
                hyperlink: None,
                pending_wrap: false,
                protected: false,
            },
            saved_cursor: None,
            charsets: CharsetState::default(),
            kitty_keyboard: KeyFlagStack::default(),
            dirty: ScreenDirty::default(),
            selection: None,
            cols,
            rows,
        }
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row count of the active area.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The pin under the cursor.
    pub fn cursor_pin(&self) -> Pin {
        self.pages
            .tracked_pin(self.cursor.pin)
            .unwrap_or_else(|| self.pages.top_left(Space::Active))
    }

    fn active_pin(&self, x: usize, y: usize) -> Pin {
        self.pages
            .pin(Point::Active(Position::new(x, y)))
            .unwrap_or_else(|| self.pages.top_left(Space::Active))
    }

    fn repin_cursor(&mut self) {
        let pin = self.active_pin(self.cursor.x, self.cursor.y);
        self.pages.set_tracked(self.cursor.pin, pin);
    }

    /// Place the cursor, clamping to the screen. Clears pending wrap.
    pub fn set_cursor(&mut self, x: usize, y: usize) {
        self.cursor.x = x.min(self.cols - 1);
        self.cursor.y = y.min(self.rows - 1);
        self.cursor.pending_wrap = false;
        self.repin_cursor();
    }

    // --- Printing ---

    /// Print one codepoint at the cursor, honoring charsets, wide layout,
    /// grapheme attachment, insert mode, and pending wrap.
    pub fn print(&mut self, cp: char, opts: PrintOptions) -> Result<()> {
        let cp = self.charsets.map(cp);
        let Some(width) = cp.width() else {
            // Control and unassigned codepoints never reach the grid.
            return Ok(());
        };

        if width == 0 {
            return self.attach_grapheme(cp);
        }

        if self.cursor.pending_wrap && opts.autowrap {
            self.wrap_line(opts.region)?;
        }

        let right_edge = if self.cursor.x <= opts.region.right {
            opts.region.right
        } else {
            self.cols - 1
        };

        if width == 2 && self.cursor.x == right_edge {
            if !opts.autowrap {
                // A wide character cannot straddle the edge; drop it and
                // leave a blank, like overwriting half of it would.
                let pin = self.cursor_pin();
                if let Some(page) = self.pages.page_mut(pin.page) {
                    page.clear_cell(pin.y, pin.x);
                }
                return Ok(());
            }
            // Leave a spacer head and wrap the whole character.
            let pin = self.cursor_pin();
            if let Some(page) = self.pages.page_mut(pin.page) {
                page.write_cell(
                    pin.y,
                    pin.x,
                    CellContent::default(),
                    Wide::SpacerHead,
                    &self.cursor.style,
                    self.cursor.hyperlink.as_ref(),
                    self.cursor.protected,
                )?;
            }
            self.wrap_line(opts.region)?;
        }

        if opts.insert {
            self.insert_chars(width, opts.region)?;
        }

        self.clean_overwrite(width)?;

        let pin = self.cursor_pin();
        let style = self.cursor.style;
        let hyperlink = self.cursor.hyperlink.clone();
        let protected = self.cursor.protected;
        if let Some(page) = self.pages.page_mut(pin.page) {
            page.write_cell(
                pin.y,
                pin.x,
                CellContent::Codepoint(cp),
                if width == 2 { Wide::Wide } else { Wide::Narrow },
                &style,
                hyperlink.as_ref(),
                protected,
            )?;
            if width == 2 && pin.x + 1 < self.cols {
                page.write_cell(
                    pin.y,
                    pin.x + 1,
                    CellContent::default(),
                    Wide::SpacerTail,
                    &style,
                    hyperlink.as_ref(),
                    protected,
                )?;
            }
        }

        let new_x = self.cursor.x + width;
        let right_edge = if self.cursor.x <= opts.region.right {
            opts.region.right
        } else {
            self.cols - 1
        };
        if new_x > right_edge {
            self.cursor.x = right_edge;
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.x = new_x;
            self.cursor.pending_wrap = false;
        }
        self.repin_cursor();
        Ok(())
    }

    /// Attach a zero-width codepoint to the previously printed cell.
    fn attach_grapheme(&mut self, cp: char) -> Result<()> {
        let mut x = if self.cursor.pending_wrap {
            self.cursor.x
        } else {
            match self.cursor.x.checked_sub(1) {
                Some(x) => x,
                // Nothing before the first column to attach to.
                None => return Ok(()),
            }
        };
        let pin = self.active_pin(x, self.cursor.y);
        let Some(page) = self.pages.page_mut(pin.page) else {
            return Ok(());
        };
        if page.cell(pin.y, x).wide == Wide::SpacerTail && x > 0 {
            x -= 1;
        }
        page.append_grapheme(pin.y, x, cp)
    }

    /// Resolve overwrite interactions with wide characters at the cursor.
    fn clean_overwrite(&mut self, width: usize) -> Result<()> {
        let pin = self.cursor_pin();
        let cols = self.cols;
        let Some(page) = self.pages.page_mut(pin.page) else {
            return Ok(());
        };
        match page.cell(pin.y, pin.x).wide {
            // Overwriting the tail orphans the head.
            Wide::SpacerTail => {
                if pin.x > 0 {
                    page.clear_cell(pin.y, pin.x - 1);
                }
            }
            // Overwriting the head orphans the tail.
            Wide::Wide => {
                if pin.x + 1 < cols {
                    page.clear_cell(pin.y, pin.x + 1);
                }
            }
            Wide::Narrow | Wide::SpacerHead => {}
        }
        if width == 2 && pin.x + 1 < cols {
            // The incoming tail position may itself hold a wide head.
            if page.cell(pin.y, pin.x + 1).wide == Wide::Wide && pin.x + 2 < cols {
                page.clear_cell(pin.y, pin.x + 2);
            }
        }
        Ok(())
    }

    /// Soft-wrap onto the next row.
    fn wrap_line(&mut self, region: ScrollRegion) -> Result<()> {
        let pin = self.cursor_pin();
        if let Some(page) = self.pages.page_mut(pin.page) {
            page.row_mut(pin.y).wrap = true;
            page.mark_row_dirty(pin.y);
        }
        self.linefeed(region)?;
        self.cursor.x = if region.full_width(self.cols) {
            0
        } else {
            region.left
        };
        self.cursor.pending_wrap = false;
        let pin = self.active_pin(self.cursor.x, self.cursor.y);
        if let Some(page) = self.pages.page_mut(pin.page) {
            page.row_mut(pin.y).wrap_continuation = true;
            page.mark_row_dirty(pin.y);
        }
        self.repin_cursor();
        Ok(())
    }

    // --- Cursor movement ---

    /// Index: move down one row, scrolling the region at its bottom.
    pub fn linefeed(&mut self, region: ScrollRegion) -> Result<()> {
        self.cursor.pending_wrap = false;
        if self.cursor.y == region.bottom {
            self.scroll_up(1, region)?;
        } else if self.cursor.y + 1 < self.rows {
            self.cursor.y += 1;
        }
        self.repin_cursor();
        Ok(())
    }

    /// Reverse index: move up one row, scrolling down at the region top.
    pub fn reverse_index(&mut self, region: ScrollRegion) -> Result<()> {
        self.cursor.pending_wrap = false;
        if self.cursor.y == region.top {
            self.scroll_down(1, region)?;
        } else if self.cursor.y > 0 {
            self.cursor.y -= 1;
        }
        self.repin_cursor();
        Ok(())
    }

    /// Carriage return to the region's left edge.
    pub fn carriage_return(&mut self, region: ScrollRegion) {
        self.cursor.x = if self.cursor.x >= region.left {
            region.left
        } else {
            0
        };
        self.cursor.pending_wrap = false;
        self.repin_cursor();
    }

    /// Backspace one column.
    pub fn backspace(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.x > 0 {
            self.cursor.x -= 1;
            self.repin_cursor();
        }
    }

    // --- Scrolling ---

    /// Scroll the region up `n` rows. A full-screen region pushes rows into
    /// scrollback; a sub-region rotates in place.
    pub fn scroll_up(&mut self, n: usize, region: ScrollRegion) -> Result<()> {
        if region.is_full(self.cols, self.rows) {
            for _ in 0..n {
                self.pages.grow();
            }
            self.repin_cursor();
            return Ok(());
        }
        let width = region.right - region.left + 1;
        for _ in 0..n {
            for y in region.top..region.bottom {
                let src = self.active_pin(region.left, y + 1);
                let dst = self.active_pin(region.left, y);
                self.pages.copy_cells(src, dst, width)?;
            }
            self.erase_row_span(region.bottom, region.left, region.right + 1)?;
        }
        Ok(())
    }

    /// Scroll the region down `n` rows.
    pub fn scroll_down(&mut self, n: usize, region: ScrollRegion) -> Result<()> {
        let width = region.right - region.left + 1;
        for _ in 0..n {
            for y in (region.top..region.bottom).rev() {
                let src = self.active_pin(region.left, y);
                let dst = self.active_pin(region.left, y + 1);
                self.pages.copy_cells(src, dst, width)?;
            }
            self.erase_row_span(region.top, region.left, region.right + 1)?;
        }
        Ok(())
    }

    /// IL: insert `n` blank lines at the cursor, pushing lines below down
    /// within the region. No-op outside the region.
    pub fn insert_lines(&mut self, n: usize, region: ScrollRegion) -> Result<()> {
        if self.cursor.y < region.top || self.cursor.y > region.bottom {
            return Ok(());
        }
        let sub = ScrollRegion {
            top: self.cursor.y,
            ..region
        };
        self.cursor.pending_wrap = false;
        self.scroll_down(n, sub)
    }

    /// DL: delete `n` lines at the cursor, pulling lines below up within
    /// the region.
    pub fn delete_lines(&mut self, n: usize, region: ScrollRegion) -> Result<()> {
        if self.cursor.y < region.top || self.cursor.y > region.bottom {
            return Ok(());
        }
        let sub = ScrollRegion {
            top: self.cursor.y,
            ..region
        };
        self.cursor.pending_wrap = false;
        self.scroll_up(n, sub)
    }

    /// ICH: shift cells right from the cursor, blanking `n` at the cursor.
    pub fn insert_chars(&mut self, n: usize, region: ScrollRegion) -> Result<()> {
        let right = if region.full_width(self.cols) {
            self.cols - 1
        } else {
            region.right
        };
        if self.cursor.x > right {
            return Ok(());
        }
        let n = n.min(right - self.cursor.x + 1);
        let y = self.cursor.y;
        for x in ((self.cursor.x + n)..=right).rev() {
            let src = self.active_pin(x - n, y);
            let dst = self.active_pin(x, y);
            self.pages.copy_cells(src, dst, 1)?;
        }
        self.erase_row_span(y, self.cursor.x, self.cursor.x + n)?;
        self.cursor.pending_wrap = false;
        Ok(())
    }

    /// DCH: shift cells left onto the cursor, blanking the freed tail.
    pub fn delete_chars(&mut self, n: usize, region: ScrollRegion) -> Result<()> {
        let right = if region.full_width(self.cols) {
            self.cols - 1
        } else {
            region.right
        };
        if self.cursor.x > right {
            return Ok(());
        }
        let span = right - self.cursor.x + 1;
        let n = n.min(span);
        let y = self.cursor.y;
        if n < span {
            for x in self.cursor.x..=(right - n) {
                let src = self.active_pin(x + n, y);
                let dst = self.active_pin(x, y);
                self.pages.copy_cells(src, dst, 1)?;
            }
        }
        self.erase_row_span(y, right + 1 - n, right + 1)?;
        self.cursor.pending_wrap = false;
        Ok(())
    }

    // --- Erasing ---

    /// Blank a span of one row using the cursor's background.
    fn erase_row_span(&mut self, y: usize, x0: usize, x1: usize) -> Result<()> {
        let bg = self.cursor.style.bg;
        let pin = self.active_pin(x0, y);
        let Some(page) = self.pages.page_mut(pin.page) else {
            return Ok(());
        };
        match bg {
            ColorSpec::Default => page.clear_cells(pin.y, x0, x1),
            ColorSpec::Palette(i) => {
                for x in x0..x1 {
                    page.write_cell(
                        pin.y,
                        x,
                        CellContent::BgPalette(i),
                        Wide::Narrow,
                        &Style::default(),
                        None,
                        false,
                    )?;
                }
            }
            ColorSpec::Rgb(c) => {
                for x in x0..x1 {
                    page.write_cell(
                        pin.y,
                        x,
                        CellContent::BgRgb(c),
                        Wide::Narrow,
                        &Style::default(),
                        None,
                        false,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Like [`Screen::erase_row_span`] but skipping protected cells when
    /// `selective` is set.
    fn erase_span_selective(
        &mut self,
        y: usize,
        x0: usize,
        x1: usize,
        selective: bool,
    ) -> Result<()> {
        if !selective {
            return self.erase_row_span(y, x0, x1);
        }
        let pin = self.active_pin(x0, y);
        let page_id = pin.page;
        for x in x0..x1 {
            let protected = self
                .pages
                .page(page_id)
                .is_some_and(|p| p.cell(pin.y, x).protected);
            if !protected {
                self.erase_row_span(y, x, x + 1)?;
            }
        }
        Ok(())
    }

    /// EL / DECSEL.
    pub fn erase_line(&mut self, mode: EraseLine, selective: bool) -> Result<()> {
        let y = self.cursor.y;
        let (x0, x1) = match mode {
            EraseLine::Right => (self.cursor.x, self.cols),
            EraseLine::Left => (0, self.cursor.x + 1),
            EraseLine::All => (0, self.cols),
        };
        self.cursor.pending_wrap = false;
        self.erase_span_selective(y, x0, x1, selective)
    }

    /// ED / DECSED.
    pub fn erase_display(&mut self, mode: EraseDisplay, selective: bool) -> Result<()> {
        self.cursor.pending_wrap = false;
        match mode {
            EraseDisplay::Below => {
                self.erase_span_selective(self.cursor.y, self.cursor.x, self.cols, selective)?;
                for y in (self.cursor.y + 1)..self.rows {
                    self.erase_span_selective(y, 0, self.cols, selective)?;
                }
            }
            EraseDisplay::Above => {
                for y in 0..self.cursor.y {
                    self.erase_span_selective(y, 0, self.cols, selective)?;
                }
                self.erase_span_selective(self.cursor.y, 0, self.cursor.x + 1, selective)?;
            }
            EraseDisplay::Complete => {
                for y in 0..self.rows {
                    self.erase_span_selective(y, 0, self.cols, selective)?;
                }
                self.dirty.set(ScreenDirty::CLEAR);
            }
            EraseDisplay::Scrollback => {
                self.pages.clear_scrollback();
                self.repin_cursor();
            }
        }
        Ok(())
    }

    /// ECH: erase `n` cells at the cursor without moving anything.
    pub fn erase_chars(&mut self, n: usize) -> Result<()> {
        let x1 = (self.cursor.x + n.max(1)).min(self.cols);
        self.cursor.pending_wrap = false;
        self.erase_row_span(self.cursor.y, self.cursor.x, x1)
    }

    // --- Selection ---

    /// Set the selection between two pins.
    pub fn select(&mut self, anchor: Pin, head: Pin, rectangular: bool) {
        self.clear_selection();
        let anchor = self.pages.track(anchor);
        let head = self.pages.track(head);
        self.selection = Some(Selection {
            anchor,
            head,
            rectangular,
        });
        self.dirty.set(ScreenDirty::SELECTION);
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        if let Some(sel) = self.selection.take() {
            self.pages.untrack(sel.anchor);
            self.pages.untrack(sel.head);
            self.dirty.set(ScreenDirty::SELECTION);
        }
    }

    /// The selection endpoints, resolved.
    pub fn selection(&self) -> Option<(Pin, Pin, bool)> {
        let sel = self.selection?;
        let anchor = self.pages.tracked_pin(sel.anchor)?;
        let head = self.pages.tracked_pin(sel.head)?;
        Some((anchor, head, sel.rectangular))
    }

    // --- Charsets ---

    /// Designate a charset into a slot.
    pub fn designate_charset(&mut self, slot: Slot, charset: Charset) {
        self.charsets.designate(slot, charset);
        self.dirty.set(ScreenDirty::CHARSET);
    }

    /// Invoke a slot into GL or GR.
    pub fn invoke_charset(&mut self, active: ActiveSlot, slot: Slot) {
        self.charsets.invoke(active, slot);
        self.dirty.set(ScreenDirty::CHARSET);
    }

    // --- Kitty keyboard ---

    /// Push kitty keyboard flags.
    pub fn kitty_push(&mut self, flags: KeyFlags) {
        self.kitty_keyboard.push(flags);
        self.dirty.set(ScreenDirty::KITTY_KEYBOARD);
    }

    /// Pop kitty keyboard flag entries.
    pub fn kitty_pop(&mut self, n: usize) {
        self.kitty_keyboard.pop(n);
        self.dirty.set(ScreenDirty::KITTY_KEYBOARD);
    }

    /// Set kitty keyboard flags on the stack top.
    pub fn kitty_apply(&mut self, mode: KeySetMode, flags: KeyFlags) {
        self.kitty_keyboard.apply(mode, flags);
        self.dirty.set(ScreenDirty::KITTY_KEYBOARD);
    }

    // --- Cursor save/restore ---

    /// DECSC.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            x: self.cursor.x,
            y: self.cursor.y,
            style: self.cursor.style,
            pending_wrap: self.cursor.pending_wrap,
            protected: self.cursor.protected,
            charsets: self.charsets,
        });
    }

    /// DECRC. Without a prior save, homes the cursor and resets the style.
    pub fn restore_cursor(&mut self) {
        match self.saved_cursor.clone() {
            Some(saved) => {
                self.cursor.x = saved.x.min(self.cols - 1);
                self.cursor.y = saved.y.min(self.rows - 1);
                self.cursor.style = saved.style;
                self.cursor.pending_wrap = saved.pending_wrap;
                self.cursor.protected = saved.protected;
                self.charsets = saved.charsets;
            }
            None => {
                self.cursor.x = 0;
                self.cursor.y = 0;
                self.cursor.style = Style::default();
                self.cursor.pending_wrap = false;
                self.cursor.protected = false;
                self.charsets = CharsetState::default();
            }
        }
        self.repin_cursor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Screen {
        Screen::new(10, 4, 100)
    }

    fn opts(screen: &Screen) -> PrintOptions {
        PrintOptions {
            autowrap: true,
            insert: false,
            region: ScrollRegion::full(screen.cols(), screen.rows()),
        }
    }

    fn print_str(screen: &mut Screen, s: &str) {
        let o = opts(screen);
        for c in s.chars() {
            assert!(screen.print(c, o).is_ok());
        }
    }

    fn char_at(screen: &Screen, x: usize, y: usize) -> Option<char> {
        let pin = screen
            .pages
            .pin(Point::Active(Position::new(x, y)))?;
        screen.pages.page(pin.page)?.cell(pin.y, pin.x).codepoint()
    }

    #[test]
    fn print_advances_cursor() {
        let mut s = screen();
        print_str(&mut s, "hi");
        assert_eq!(char_at(&s, 0, 0), Some('h'));
        assert_eq!(char_at(&s, 1, 0), Some('i'));
        assert_eq!(s.cursor.x, 2);
    }

    #[test]
    fn print_at_edge_sets_pending_wrap() {
        let mut s = screen();
        print_str(&mut s, "0123456789");
        assert_eq!(s.cursor.x, 9);
        assert!(s.cursor.pending_wrap);
    }

    #[test]
    fn autowrap_continues_on_next_row() {
        let mut s = screen();
        print_str(&mut s, "0123456789ab");
        assert_eq!(char_at(&s, 0, 1), Some('a'));
        assert_eq!(char_at(&s, 1, 1), Some('b'));
        // Wrap flags connect the rows.
        let first = match s.pages.pin(Point::Active(Position::new(0, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let page = match s.pages.page(first.page) {
            Some(p) => p,
            None => unreachable!(),
        };
        assert!(page.row(first.y).wrap);
        assert!(page.row(first.y + 1).wrap_continuation);
    }

    #[test]
    fn wide_char_occupies_two_cells() {
        let mut s = screen();
        print_str(&mut s, "\u{4e16}");
        assert_eq!(char_at(&s, 0, 0), Some('\u{4e16}'));
        let pin = match s.pages.pin(Point::Active(Position::new(1, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let page = match s.pages.page(pin.page) {
            Some(p) => p,
            None => unreachable!(),
        };
        assert_eq!(page.cell(pin.y, 1).wide, Wide::SpacerTail);
        assert_eq!(s.cursor.x, 2);
    }

    #[test]
    fn overwriting_wide_tail_clears_head() {
        let mut s = screen();
        print_str(&mut s, "\u{4e16}");
        s.set_cursor(1, 0);
        print_str(&mut s, "x");
        assert_eq!(char_at(&s, 0, 0), None);
        assert_eq!(char_at(&s, 1, 0), Some('x'));
    }

    #[test]
    fn overwriting_wide_head_clears_tail() {
        let mut s = screen();
        print_str(&mut s, "\u{4e16}");
        s.set_cursor(0, 0);
        print_str(&mut s, "x");
        assert_eq!(char_at(&s, 0, 0), Some('x'));
        let pin = match s.pages.pin(Point::Active(Position::new(1, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let page = match s.pages.page(pin.page) {
            Some(p) => p,
            None => unreachable!(),
        };
        assert_eq!(page.cell(pin.y, 1).wide, Wide::Narrow);
        assert!(!page.cell(pin.y, 1).has_text());
    }

    #[test]
    fn combining_mark_attaches_to_previous() {
        let mut s = screen();
        print_str(&mut s, "e");
        let o = opts(&s);
        assert!(s.print('\u{0301}', o).is_ok());
        let pin = match s.pages.pin(Point::Active(Position::new(0, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let page = match s.pages.page(pin.page) {
            Some(p) => p,
            None => unreachable!(),
        };
        assert_eq!(page.grapheme(pin.y, 0), Some(&['\u{0301}'][..]));
        // Cursor does not advance.
        assert_eq!(s.cursor.x, 1);
    }

    #[test]
    fn linefeed_scrolls_at_bottom() {
        let mut s = screen();
        print_str(&mut s, "top");
        let region = ScrollRegion::full(s.cols(), s.rows());
        s.set_cursor(0, 3);
        assert!(s.linefeed(region).is_ok());
        // "top" moved into scrollback; active row 0 no longer shows it.
        assert_eq!(s.pages.total_rows(), 5);
        assert_eq!(char_at(&s, 0, 0), None);
        assert_eq!(s.cursor.y, 3);
    }

    #[test]
    fn sub_region_scroll_rotates_in_place() {
        let mut s = screen();
        for (y, line) in ["aaa", "bbb", "ccc", "ddd"].iter().enumerate() {
            s.set_cursor(0, y);
            print_str(&mut s, line);
        }
        let region = ScrollRegion {
            top: 1,
            bottom: 2,
            left: 0,
            right: s.cols() - 1,
        };
        assert!(s.scroll_up(1, region).is_ok());
        // Row 0 and 3 untouched; row 1 took row 2's content; row 2 blank.
        assert_eq!(char_at(&s, 0, 0), Some('a'));
        assert_eq!(char_at(&s, 0, 1), Some('c'));
        assert_eq!(char_at(&s, 0, 2), None);
        assert_eq!(char_at(&s, 0, 3), Some('d'));
        // No scrollback was created.
        assert_eq!(s.pages.total_rows(), 4);
    }

    #[test]
    fn scroll_down_moves_rows() {
        let mut s = screen();
        s.set_cursor(0, 0);
        print_str(&mut s, "one");
        let region = ScrollRegion::full(s.cols(), s.rows());
        assert!(s.scroll_down(1, region).is_ok());
        assert_eq!(char_at(&s, 0, 0), None);
        assert_eq!(char_at(&s, 0, 1), Some('o'));
    }

    #[test]
    fn insert_and_delete_lines() {
        let mut s = screen();
        for (y, line) in ["aaa", "bbb", "ccc", "ddd"].iter().enumerate() {
            s.set_cursor(0, y);
            print_str(&mut s, line);
        }
        let region = ScrollRegion::full(s.cols(), s.rows());
        s.set_cursor(0, 1);
        assert!(s.insert_lines(1, region).is_ok());
        assert_eq!(char_at(&s, 0, 1), None);
        assert_eq!(char_at(&s, 0, 2), Some('b'));
        assert_eq!(char_at(&s, 0, 3), Some('c'));

        assert!(s.delete_lines(1, region).is_ok());
        assert_eq!(char_at(&s, 0, 1), Some('b'));
        assert_eq!(char_at(&s, 0, 2), Some('c'));
    }

    #[test]
    fn insert_chars_shifts_right() {
        let mut s = screen();
        print_str(&mut s, "abc");
        s.set_cursor(0, 0);
        let region = ScrollRegion::full(s.cols(), s.rows());
        assert!(s.insert_chars(2, region).is_ok());
        assert_eq!(char_at(&s, 0, 0), None);
        assert_eq!(char_at(&s, 1, 0), None);
        assert_eq!(char_at(&s, 2, 0), Some('a'));
        assert_eq!(char_at(&s, 3, 0), Some('b'));
    }

    #[test]
    fn delete_chars_shifts_left() {
        let mut s = screen();
        print_str(&mut s, "abcdef");
        s.set_cursor(1, 0);
        let region = ScrollRegion::full(s.cols(), s.rows());
        assert!(s.delete_chars(2, region).is_ok());
        assert_eq!(char_at(&s, 0, 0), Some('a'));
        assert_eq!(char_at(&s, 1, 0), Some('d'));
        assert_eq!(char_at(&s, 2, 0), Some('e'));
        assert_eq!(char_at(&s, 3, 0), Some('f'));
        assert_eq!(char_at(&s, 4, 0), None);
    }

    #[test]
    fn erase_line_variants() {
        let mut s = screen();
        print_str(&mut s, "abcdef");
        s.set_cursor(2, 0);
        assert!(s.erase_line(EraseLine::Right, false).is_ok());
        assert_eq!(char_at(&s, 1, 0), Some('b'));
        assert_eq!(char_at(&s, 2, 0), None);
        assert_eq!(char_at(&s, 5, 0), None);

        let mut s = screen();
        print_str(&mut s, "abcdef");
        s.set_cursor(2, 0);
        assert!(s.erase_line(EraseLine::Left, false).is_ok());
        assert_eq!(char_at(&s, 0, 0), None);
        assert_eq!(char_at(&s, 2, 0), None);
        assert_eq!(char_at(&s, 3, 0), Some('d'));
    }

    #[test]
    fn selective_erase_skips_protected() {
        let mut s = screen();
        print_str(&mut s, "ab");
        s.cursor.protected = true;
        print_str(&mut s, "cd");
        s.cursor.protected = false;
        s.set_cursor(0, 0);
        assert!(s.erase_line(EraseLine::All, true).is_ok());
        assert_eq!(char_at(&s, 0, 0), None);
        assert_eq!(char_at(&s, 1, 0), None);
        assert_eq!(char_at(&s, 2, 0), Some('c'));
        assert_eq!(char_at(&s, 3, 0), Some('d'));
    }

    #[test]
    fn erase_display_complete_sets_clear_bit() {
        let mut s = screen();
        print_str(&mut s, "junk");
        assert!(s.erase_display(EraseDisplay::Complete, false).is_ok());
        assert!(s.dirty.contains(ScreenDirty::CLEAR));
        assert_eq!(char_at(&s, 0, 0), None);
    }

    #[test]
    fn erase_with_colored_bg_leaves_bg_cells() {
        let mut s = screen();
        print_str(&mut s, "x");
        s.cursor.style.bg = ColorSpec::Palette(4);
        s.set_cursor(0, 0);
        assert!(s.erase_line(EraseLine::All, false).is_ok());
        let pin = match s.pages.pin(Point::Active(Position::new(0, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let page = match s.pages.page(pin.page) {
            Some(p) => p,
            None => unreachable!(),
        };
        assert_eq!(page.cell(pin.y, 0).content, CellContent::BgPalette(4));
    }

    #[test]
    fn selection_tracks_and_clears() {
        let mut s = screen();
        let a = match s.pages.pin(Point::Active(Position::new(0, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let b = match s.pages.pin(Point::Active(Position::new(3, 1))) {
            Some(p) => p,
            None => unreachable!(),
        };
        s.select(a, b, false);
        assert!(s.dirty.contains(ScreenDirty::SELECTION));
        let (anchor, head, rect) = match s.selection() {
            Some(sel) => sel,
            None => unreachable!(),
        };
        assert_eq!(anchor, a);
        assert_eq!(head, b);
        assert!(!rect);
        s.clear_selection();
        assert!(s.selection().is_none());
    }

    #[test]
    fn save_restore_cursor() {
        let mut s = screen();
        s.cursor.style.bold = true;
        s.set_cursor(5, 2);
        s.save_cursor();
        s.cursor.style = Style::default();
        s.set_cursor(0, 0);
        s.restore_cursor();
        assert_eq!((s.cursor.x, s.cursor.y), (5, 2));
        assert!(s.cursor.style.bold);
    }

    #[test]
    fn restore_without_save_resets() {
        let mut s = screen();
        s.set_cursor(5, 2);
        s.cursor.style.bold = true;
        s.restore_cursor();
        assert_eq!((s.cursor.x, s.cursor.y), (0, 0));
        assert!(s.cursor.style.is_default());
    }

    #[test]
    fn hyperlink_applies_to_prints() {
        let mut s = screen();
        s.cursor.hyperlink = Some(Hyperlink::new(Some("a"), "http://x"));
        print_str(&mut s, "link");
        s.cursor.hyperlink = None;
        print_str(&mut s, "no");
        let pin = match s.pages.pin(Point::Active(Position::new(0, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let page = match s.pages.page(pin.page) {
            Some(p) => p,
            None => unreachable!(),
        };
        assert!(page.cell(pin.y, 0).hyperlink);
        assert!(page.cell(pin.y, 3).hyperlink);
        assert!(!page.cell(pin.y, 4).hyperlink);
        assert_eq!(page.hyperlink_count(), 1);
    }

    #[test]
    fn charset_translation_on_print() {
        let mut s = screen();
        s.designate_charset(Slot::G0, Charset::DecSpecial);
        print_str(&mut s, "q");
        assert_eq!(char_at(&s, 0, 0), Some('─'));
        assert!(s.dirty.contains(ScreenDirty::CHARSET));
    }

    #[test]
    fn kitty_stack_marks_dirty() {
        let mut s = screen();
        s.kitty_push(KeyFlags::DISAMBIGUATE);
        assert!(s.dirty.contains(ScreenDirty::KITTY_KEYBOARD));
        assert_eq!(s.kitty_keyboard.current(), KeyFlags::DISAMBIGUATE);
    }
}
