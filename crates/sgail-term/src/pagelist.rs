//! The page list: scrollback-ordered pages with stable pins.
//!
//! Pages are addressed by *absolute* page ids that only ever increase, so a
//! [`Pin`] — `(page, y, x)` — stays meaningful as pages are appended and
//! trimmed without holding raw pointers. Pins that must survive trims
//! (cursor, selection endpoints, a pinned viewport) are *tracked*: the list
//! owns their storage and re-points any that land in a trimmed page.
//! Untracked pins are short-lived values that callers refresh after
//! structural edits.

use std::collections::VecDeque;

use crate::error::Result;
use crate::page::Page;
use crate::point::{Direction, Point, Position, Space};

/// Absolute page id. Monotonically increasing across the life of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub u64);

/// A logical coordinate inside the page list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pin {
    /// The page.
    pub page: PageId,
    /// Row within the page.
    pub y: usize,
    /// Column.
    pub x: usize,
}

/// Handle to a pin whose storage the page list owns and keeps valid across
/// structural edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedPinId(usize);

/// Where the viewport is anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewport {
    /// Following the active area (the normal state).
    Active,
    /// Pinned to a scrollback position.
    Pin(TrackedPinId),
}

/// One clipped page range yielded by [`PageList::page_iterator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// The page.
    pub page: PageId,
    /// First row of the chunk.
    pub start: usize,
    /// One past the last row of the chunk.
    pub end: usize,
}

/// Scrollback-ordered list of pages.
pub struct PageList {
    pages: VecDeque<Page>,
    first_id: u64,
    cols: usize,
    active_rows: usize,
    max_rows: usize,
    total_rows: usize,
    viewport: Viewport,
    tracked: Vec<Option<Pin>>,
    free_tracked: Vec<usize>,
}

impl PageList {
    /// A list sized for an active area of `cols` x `active_rows`, keeping at
    /// most `max_scrollback` rows of history beyond the active area.
    pub fn new(cols: usize, active_rows: usize, max_scrollback: usize) -> Self {
        let mut list = Self {
            pages: VecDeque::new(),
            first_id: 0,
            cols,
            active_rows,
            max_rows: active_rows + max_scrollback,
            total_rows: 0,
            viewport: Viewport::Active,
            tracked: Vec::new(),
            free_tracked: Vec::new(),
        };
        for _ in 0..active_rows {
            list.push_row();
        }
        list
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Rows in the active area.
    pub fn active_rows(&self) -> usize {
        self.active_rows
    }

    /// Total rows currently retained, scrollback included.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// The id of the oldest retained page.
    pub fn first_page_id(&self) -> PageId {
        PageId(self.first_id)
    }

    /// The id of the newest page.
    pub fn last_page_id(&self) -> PageId {
        PageId(self.first_id + self.pages.len() as u64 - 1)
    }

    /// Look up a page. `None` when the id was trimmed (or never existed).
    pub fn page(&self, id: PageId) -> Option<&Page> {
        let idx = id.0.checked_sub(self.first_id)?;
        self.pages.get(idx as usize)
    }

    /// Mutable page lookup.
    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        let idx = id.0.checked_sub(self.first_id)?;
        self.pages.get_mut(idx as usize)
    }

    // --- Growth and trimming ---

    /// Append one blank row at the bottom, trimming old pages beyond the
    /// scrollback budget. Returns a pin to the new row.
    pub fn grow(&mut self) -> Pin {
        let pin = self.push_row();
        self.trim();
        pin
    }

    fn push_row(&mut self) -> Pin {
        let needs_page = self.pages.back().is_none_or(Page::is_full);
        if needs_page {
            self.pages.push_back(Page::new(self.cols));
        }
        let page_id = self.last_page_id();
        let y = match self.pages.back_mut().and_then(Page::push_row) {
            Some(y) => y,
            // Unreachable: a fresh or non-full page always accepts a row.
            None => 0,
        };
        self.total_rows += 1;
        Pin {
            page: page_id,
            y,
            x: 0,
        }
    }

    fn trim(&mut self) {
        while self.total_rows > self.max_rows {
            let Some(front) = self.pages.front() else {
                break;
            };
            let front_len = front.len();
            // Only trim pages that lie entirely in scrollback.
            if self.total_rows - front_len < self.active_rows {
                break;
            }
            self.pages.pop_front();
            self.total_rows -= front_len;
            let removed = PageId(self.first_id);
            self.first_id += 1;
            let new_first = PageId(self.first_id);
            for slot in self.tracked.iter_mut().flatten() {
                if slot.page == removed {
                    *slot = Pin {
                        page: new_first,
                        y: 0,
                        x: slot.x,
                    };
                }
            }
        }
    }

    /// Drop all rows above the active area. Whole pages are released; a
    /// page straddling the boundary has its scrollback rows removed in
    /// place.
    pub fn clear_scrollback(&mut self) {
        // Whole pages first.
        while let Some(front) = self.pages.front() {
            let front_len = front.len();
            if self.total_rows - front_len < self.active_rows {
                break;
            }
            self.pages.pop_front();
            self.total_rows -= front_len;
            let removed = PageId(self.first_id);
            self.first_id += 1;
            let new_first = PageId(self.first_id);
            for slot in self.tracked.iter_mut().flatten() {
                if slot.page == removed {
                    *slot = Pin {
                        page: new_first,
                        y: 0,
                        x: slot.x,
                    };
                }
            }
        }
        // Partial front page.
        let excess = self.total_rows - self.active_rows;
        if excess > 0 {
            let front_id = PageId(self.first_id);
            if let Some(front) = self.pages.front_mut() {
                front.drop_front_rows(excess);
            }
            self.total_rows -= excess;
            for slot in self.tracked.iter_mut().flatten() {
                if slot.page == front_id {
                    slot.y = slot.y.saturating_sub(excess);
                }
            }
        }
    }

    // --- Coordinate conversion ---

    /// Absolute screen-space row of a pin.
    pub fn row_of(&self, pin: Pin) -> Option<usize> {
        let mut row = 0;
        for (i, page) in self.pages.iter().enumerate() {
            let id = PageId(self.first_id + i as u64);
            if id == pin.page {
                if pin.y >= page.len() {
                    return None;
                }
                return Some(row + pin.y);
            }
            row += page.len();
        }
        None
    }

    /// Pin for an absolute screen-space row.
    pub fn pin_at(&self, row: usize, x: usize) -> Option<Pin> {
        if x >= self.cols {
            return None;
        }
        let mut remaining = row;
        for (i, page) in self.pages.iter().enumerate() {
            if remaining < page.len() {
                return Some(Pin {
                    page: PageId(self.first_id + i as u64),
                    y: remaining,
                    x,
                });
            }
            remaining -= page.len();
        }
        None
    }

    /// The screen-space row where a coordinate space begins.
    fn space_offset(&self, space: Space) -> usize {
        match space {
            Space::Screen => 0,
            Space::Active => self.total_rows - self.active_rows,
            Space::Viewport => match self.viewport {
                Viewport::Active => self.total_rows - self.active_rows,
                Viewport::Pin(id) => self
                    .tracked_pin(id)
                    .and_then(|pin| self.row_of(pin))
                    .unwrap_or(self.total_rows - self.active_rows),
            },
        }
    }

    /// Convert a point in any coordinate space to a pin. `None` when the
    /// point lies outside the space.
    pub fn pin(&self, point: Point) -> Option<Pin> {
        let (space, pos) = match point {
            Point::Screen(p) => (Space::Screen, p),
            Point::Viewport(p) => (Space::Viewport, p),
            Point::Active(p) => (Space::Active, p),
        };
        match space {
            Space::Screen => {}
            Space::Viewport | Space::Active => {
                if pos.y >= self.active_rows {
                    return None;
                }
            }
        }
        self.pin_at(self.space_offset(space) + pos.y, pos.x)
    }

    /// Convert a pin to a position in a coordinate space. `None` when the
    /// pin falls outside the space (e.g. scrolled off the viewport).
    pub fn position_of(&self, pin: Pin, space: Space) -> Option<Position> {
        let row = self.row_of(pin)?;
        let rel = row.checked_sub(self.space_offset(space))?;
        match space {
            Space::Screen => {}
            Space::Viewport | Space::Active => {
                if rel >= self.active_rows {
                    return None;
                }
            }
        }
        Some(Position::new(pin.x, rel))
    }

    /// The top-left pin of a coordinate space.
    pub fn top_left(&self, space: Space) -> Pin {
        self.pin_at(self.space_offset(space), 0).unwrap_or(Pin {
            page: self.first_page_id(),
            y: 0,
            x: 0,
        })
    }

    /// The bottom-right pin of a coordinate space.
    pub fn bottom_right(&self, space: Space) -> Pin {
        let row = match space {
            Space::Screen => self.total_rows - 1,
            Space::Active | Space::Viewport => {
                self.space_offset(space) + self.active_rows - 1
            }
        };
        self.pin_at(row.min(self.total_rows - 1), self.cols - 1)
            .unwrap_or(Pin {
                page: self.last_page_id(),
                y: 0,
                x: self.cols - 1,
            })
    }

    // --- Tracked pins ---

    /// Begin tracking a pin; it will be re-pointed across trims until
    /// untracked.
    pub fn track(&mut self, pin: Pin) -> TrackedPinId {
        match self.free_tracked.pop() {
            Some(slot) => {
                self.tracked[slot] = Some(pin);
                TrackedPinId(slot)
            }
            None => {
                self.tracked.push(Some(pin));
                TrackedPinId(self.tracked.len() - 1)
            }
        }
    }

    /// Stop tracking.
    pub fn untrack(&mut self, id: TrackedPinId) {
        if let Some(slot) = self.tracked.get_mut(id.0) {
            *slot = None;
            self.free_tracked.push(id.0);
        }
    }

    /// The current value of a tracked pin.
    pub fn tracked_pin(&self, id: TrackedPinId) -> Option<Pin> {
        self.tracked.get(id.0).copied().flatten()
    }

    /// Move a tracked pin.
    pub fn set_tracked(&mut self, id: TrackedPinId, pin: Pin) {
        if let Some(slot) = self.tracked.get_mut(id.0) {
            *slot = Some(pin);
        }
    }

    // --- Viewport ---

    /// The current viewport anchor.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The pin at the top-left of the viewport.
    pub fn viewport_pin(&self) -> Pin {
        self.top_left(Space::Viewport)
    }

    /// Scroll the viewport by a row delta (negative is up into scrollback).
    /// Scrolling to the bottom snaps back to following the active area.
    pub fn scroll_viewport(&mut self, delta: isize) {
        let active_top = self.total_rows - self.active_rows;
        let current = self.space_offset(Space::Viewport);
        let target = current.saturating_add_signed(delta).min(active_top);
        self.anchor_viewport(target, active_top);
    }

    /// Scroll the viewport to the top of scrollback.
    pub fn scroll_to_top(&mut self) {
        let active_top = self.total_rows - self.active_rows;
        self.anchor_viewport(0, active_top);
    }

    /// Snap the viewport back to the active area.
    pub fn scroll_to_active(&mut self) {
        if let Viewport::Pin(id) = self.viewport {
            self.untrack(id);
        }
        self.viewport = Viewport::Active;
    }

    fn anchor_viewport(&mut self, target: usize, active_top: usize) {
        if target >= active_top {
            self.scroll_to_active();
            return;
        }
        let Some(pin) = self.pin_at(target, 0) else {
            return;
        };
        match self.viewport {
            Viewport::Pin(id) => self.set_tracked(id, pin),
            Viewport::Active => {
                let id = self.track(pin);
                self.viewport = Viewport::Pin(id);
            }
        }
    }

    // --- Iteration ---

    /// Iterate rows from `start` to `end` (inclusive; the whole remainder
    /// of the list when `end` is `None`), in the given direction. Yields
    /// pins with `x = 0`.
    pub fn row_iterator(
        &self,
        direction: Direction,
        start: Pin,
        end: Option<Pin>,
    ) -> RowIterator<'_> {
        let start_row = self.row_of(start);
        let end_row = match end {
            Some(pin) => self.row_of(pin),
            None => match direction {
                Direction::RightDown => Some(self.total_rows - 1),
                Direction::LeftUp => Some(0),
            },
        };
        let (Some(start_row), Some(end_row)) = (start_row, end_row) else {
            return RowIterator {
                list: self,
                row: 0,
                remaining: 0,
                direction,
            };
        };
        let remaining = match direction {
            Direction::RightDown => (end_row + 1).saturating_sub(start_row),
            Direction::LeftUp => (start_row + 1).saturating_sub(end_row),
        };
        RowIterator {
            list: self,
            row: start_row,
            remaining,
            direction,
        }
    }

    /// Iterate the page chunks covering the inclusive `(tl, br)` range,
    /// clipped to each page.
    pub fn page_iterator(&self, direction: Direction, tl: Pin, br: Pin) -> PageIterator<'_> {
        PageIterator {
            list: self,
            tl,
            br,
            next: Some(match direction {
                Direction::RightDown => tl.page,
                Direction::LeftUp => br.page,
            }),
            direction,
        }
    }

    // --- Cross-page cell movement ---

    /// Copy `count` cells starting at `src` to `dst`, re-interning styles,
    /// hyperlinks, and graphemes on the destination page. Pins into trimmed
    /// pages are ignored.
    pub fn copy_cells(&mut self, src: Pin, dst: Pin, count: usize) -> Result<()> {
        for i in 0..count {
            let Some(src_page) = self.page(src.page) else {
                return Ok(());
            };
            let snap = src_page.snapshot(src.y, src.x + i);
            let Some(dst_page) = self.page_mut(dst.page) else {
                return Ok(());
            };
            dst_page.write_snapshot(dst.y, dst.x + i, &snap)?;
        }
        Ok(())
    }
}

/// Iterator over rows; see [`PageList::row_iterator`].
pub struct RowIterator<'a> {
    list: &'a PageList,
    row: usize,
    remaining: usize,
    direction: Direction,
}

impl Iterator for RowIterator<'_> {
    type Item = Pin;

    fn next(&mut self) -> Option<Pin> {
        if self.remaining == 0 {
            return None;
        }
        let pin = self.list.pin_at(self.row, 0)?;
        self.remaining -= 1;
        match self.direction {
            Direction::RightDown => self.row += 1,
            Direction::LeftUp => self.row = self.row.wrapping_sub(1),
        }
        Some(pin)
    }
}

/// Iterator over page chunks; see [`PageList::page_iterator`].
pub struct PageIterator<'a> {
    list: &'a PageList,
    tl: Pin,
    br: Pin,
    next: Option<PageId>,
    direction: Direction,
}

impl Iterator for PageIterator<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let id = self.next?;
        if id < self.tl.page || id > self.br.page {
            self.next = None;
            return None;
        }
        let page = self.list.page(id)?;
        let start = if id == self.tl.page { self.tl.y } else { 0 };
        let end = if id == self.br.page {
            self.br.y + 1
        } else {
            page.len()
        };
        self.next = match self.direction {
            Direction::RightDown => {
                if id == self.br.page {
                    None
                } else {
                    Some(PageId(id.0 + 1))
                }
            }
            Direction::LeftUp => {
                if id == self.tl.page {
                    None
                } else {
                    Some(PageId(id.0 - 1))
                }
            }
        };
        Some(Chunk {
            page: id,
            start,
            end,
        })
    }
}
