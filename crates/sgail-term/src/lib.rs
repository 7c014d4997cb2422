//! sgail-term: a paged terminal screen model.
//!
//! The stateful core of a VT-compatible terminal emulator backend:
//! scrollback storage as a list of fixed-capacity pages with stable pins,
//! primary/alternate screens, the terminal aggregate (modes, tabstops,
//! scrolling region, dynamic colors), layered plain/VT formatters with
//! byte-to-cell reverse maps, a renderer-facing dirty-row snapshot, and a
//! background search engine that never blocks the ingest path.
//!
//! The VT byte-stream parser that drives the mutations and the renderer
//! that consumes [`render::RenderState`] live outside this crate; they
//! interact only through the public APIs here.

pub mod error;
pub mod format;
pub mod hyperlink;
pub mod intern;
pub mod modes;
pub mod page;
pub mod pagelist;
pub mod point;
pub mod render;
pub mod screen;
pub mod screenset;
pub mod search;
pub mod tabstops;
pub mod terminal;

pub use error::{Result, TermError};
pub use format::{
    Emit, Extras, Options, PageFormatter, PageListFormatter, PageRange, ScreenFormatter, Sink,
    TerminalFormatter, TrailingState,
};
pub use hyperlink::Hyperlink;
pub use page::{Cell, CellContent, Page, Row, Wide, PAGE_CAPACITY};
pub use pagelist::{Chunk, PageId, PageList, Pin, TrackedPinId, Viewport};
pub use point::{Direction, Point, Position, Space};
pub use render::{RenderCursor, RenderRow, RenderState};
pub use screen::{
    Cursor, EraseDisplay, EraseLine, PrintOptions, SavedCursor, Screen, ScreenDirty, ScrollRegion,
    Selection,
};
pub use screenset::{ScreenKey, ScreenSet};
pub use search::{Match, ScreenSearch, SearchEvent, SearchState, Searcher};
pub use tabstops::Tabstops;
pub use terminal::{Terminal, TerminalColors, TerminalDirty, TerminalOptions};
