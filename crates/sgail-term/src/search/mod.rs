//! Substring search over live screens.
//!
//! A [`ScreenSearch`] walks one screen's page list through a sliding byte
//! window. The window is refilled by [`ScreenSearch::feed`] — which must run
//! under the terminal mutex because it reads pages — one page chunk at a
//! time, formatted with the plain page formatter and its pin map so every
//! window byte knows its originating cell. [`ScreenSearch::tick`] scans a
//! bounded slice of the window *without* the lock, which is what keeps the
//! ingest path unblocked while search runs.

pub mod thread;

pub use thread::{SearchEvent, Searcher};

use crate::error::Result;
use crate::format::{Options, PageFormatter, PageRange, Sink, TrailingState};
use crate::pagelist::{PageId, Pin};
use crate::point::Space;
use crate::screen::Screen;

/// One match: the inclusive cell range it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// First cell of the match.
    pub start: Pin,
    /// Last cell of the match.
    pub end: Pin,
}

/// Where a search stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    /// The window is exhausted; more content must be fed under the lock.
    NeedsFeed,
    /// The window has unscanned content.
    InProgress,
    /// The whole screen has been scanned.
    Complete,
}

/// Control-flow signals from [`ScreenSearch::tick`]. Internal to the
/// search loop, never user-visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TickError {
    /// Growing the match list failed.
    OutOfMemory,
    /// The screen is fully scanned.
    SearchComplete,
    /// The window must be refed under the lock.
    FeedRequired,
}

/// Bytes scanned per tick.
const TICK_BUDGET: usize = 4096;
/// Window size beyond which the scanned prefix is discarded.
const WINDOW_MAX: usize = 16 * 1024;

/// An in-flight search over one screen.
pub struct ScreenSearch {
    needle: Vec<u8>,
    window: Vec<u8>,
    pins: Vec<Pin>,
    scan_pos: usize,
    next_start: Option<Pin>,
    matches: Vec<Match>,
    state: SearchState,
    trailing: Option<TrailingState>,
}

impl ScreenSearch {
    /// Begin a search for `needle` (raw bytes, matched exactly) over
    /// `screen`, starting at the top of scrollback.
    pub fn new(screen: &Screen, needle: &[u8]) -> Result<Self> {
        let mut owned = Vec::new();
        owned.try_reserve(needle.len())?;
        owned.extend_from_slice(needle);
        Ok(Self {
            needle: owned,
            window: Vec::new(),
            pins: Vec::new(),
            scan_pos: 0,
            next_start: Some(screen.pages.top_left(Space::Screen)),
            matches: Vec::new(),
            state: SearchState::NeedsFeed,
            trailing: None,
        })
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Matches found so far, in screen order.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Number of matches found so far.
    pub fn total(&self) -> usize {
        self.matches.len()
    }

    /// Scan a bounded slice of the window. Never touches the screen, so it
    /// runs without the terminal lock. `Ok(true)` reports progress.
    pub(crate) fn tick(&mut self) -> std::result::Result<bool, TickError> {
        match self.state {
            SearchState::Complete => return Err(TickError::SearchComplete),
            SearchState::NeedsFeed => return Err(TickError::FeedRequired),
            SearchState::InProgress => {}
        }
        let nl = self.needle.len();
        if self.scan_pos + nl > self.window.len() {
            return if self.next_start.is_some() {
                self.state = SearchState::NeedsFeed;
                Err(TickError::FeedRequired)
            } else {
                self.state = SearchState::Complete;
                Err(TickError::SearchComplete)
            };
        }

        // A needle longer than the budget still needs one full window.
        let limit = (self.scan_pos + TICK_BUDGET.max(nl)).min(self.window.len());
        for p in self.scan_pos..=(limit - nl) {
            if self.window[p..p + nl] == self.needle[..] {
                if self.matches.try_reserve(1).is_err() {
                    return Err(TickError::OutOfMemory);
                }
                self.matches.push(Match {
                    start: self.pins[p],
                    end: self.pins[p + nl - 1],
                });
            }
        }
        self.scan_pos = self.scan_pos.max(limit.saturating_sub(nl - 1));

        // Slide: drop the fully scanned prefix once the window is large.
        if self.window.len() > WINDOW_MAX && self.scan_pos > 0 {
            self.window.drain(..self.scan_pos);
            self.pins.drain(..self.scan_pos);
            self.scan_pos = 0;
        }
        Ok(true)
    }

    /// Refill the window with the next page chunk. MUST be called while
    /// the caller holds the terminal mutex.
    pub fn feed(&mut self, screen: &Screen) -> Result<()> {
        let Some(mut start) = self.next_start else {
            if self.state == SearchState::NeedsFeed {
                self.state = SearchState::Complete;
            }
            return Ok(());
        };
        // The page may have been trimmed since the last feed.
        if screen.pages.page(start.page).is_none() {
            start = screen.pages.top_left(Space::Screen);
        }
        let Some(page) = screen.pages.page(start.page) else {
            self.next_start = None;
            self.state = SearchState::Complete;
            return Ok(());
        };

        let bottom = screen.pages.bottom_right(Space::Screen);
        let end_y = if bottom.page == start.page {
            bottom.y
        } else {
            page.len() - 1
        };

        let mut text = String::new();
        let mut map = Vec::new();
        let mut sink = Sink::with_map(&mut text, &mut map);
        let opts = Options {
            unwrap: true,
            ..Options::default()
        };
        let range = PageRange {
            start_y: start.y,
            end_y: end_y + 1,
            start_x: 0,
            end_x: page.cols(),
        };
        let trailing =
            PageFormatter::new(page, start.page, opts).format(&mut sink, range, self.trailing.take())?;
        self.trailing = Some(trailing);

        self.window.try_reserve(text.len())?;
        self.pins.try_reserve(map.len())?;
        self.window.extend_from_slice(text.as_bytes());
        self.pins.extend(map);

        self.next_start = if bottom.page == start.page {
            None
        } else {
            Some(Pin {
                page: PageId(start.page.0 + 1),
                y: 0,
                x: 0,
            })
        };

        self.state = if self.scan_pos + self.needle.len() <= self.window.len() {
            SearchState::InProgress
        } else if self.next_start.is_some() {
            SearchState::NeedsFeed
        } else {
            SearchState::Complete
        };
        Ok(())
    }

    /// Drive the search to completion in one call (no thread). Used by
    /// synchronous callers and tests.
    pub fn run_to_completion(&mut self, screen: &Screen) -> Result<()> {
        loop {
            match self.tick() {
                Ok(_) => {}
                Err(TickError::SearchComplete) => return Ok(()),
                Err(TickError::FeedRequired) => self.feed(screen)?,
                Err(TickError::OutOfMemory) => return Err(crate::error::TermError::OutOfMemory),
            }
        }
    }
}
