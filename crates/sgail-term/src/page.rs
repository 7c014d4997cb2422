//! A page: a fixed-capacity grid of rows and cells with interned side
//! tables.
//!
//! Pages are the unit of allocation for scrollback. A cell is a small
//! `Copy` record; anything variable-sized it references — its style, its
//! hyperlink, extra grapheme codepoints — lives in side tables owned by the
//! page, addressed by small ids and reference counted so a page never leaks
//! and never outgrows its arena.
//!
//! Dirty tracking is write-sets / reader-clears: writing a cell marks its
//! row and the page dirty; consumers (the render snapshot) clear both after
//! observing.

use std::collections::HashMap;

use sgail_vt::Style;

use crate::error::Result;
use crate::hyperlink::Hyperlink;
use crate::intern::InternSet;

/// Maximum rows a single page holds.
pub const PAGE_CAPACITY: usize = 256;

/// Wide-character layout role of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Wide {
    /// An ordinary single-column cell.
    #[default]
    Narrow,
    /// The first column of a two-column character.
    Wide,
    /// A placeholder at the end of a row when a wide character wrapped.
    SpacerHead,
    /// The second column of a two-column character.
    SpacerTail,
}

/// What a cell holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellContent {
    /// A single codepoint; `'\0'` means the cell was never written.
    Codepoint(char),
    /// The first codepoint of a grapheme cluster whose remaining
    /// codepoints are in the page's grapheme table.
    Grapheme(char),
    /// No text, only a background color from the 256-color palette
    /// (produced by erases under a colored background).
    BgPalette(u8),
    /// No text, only a 24-bit background color.
    BgRgb(sgail_vt::Rgb),
}

impl Default for CellContent {
    fn default() -> Self {
        Self::Codepoint('\0')
    }
}

/// One character position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Cell content.
    pub content: CellContent,
    /// Wide-character role.
    pub wide: Wide,
    /// Style id in the page's style set; 0 is the default style.
    pub style_id: u16,
    /// Whether a hyperlink is attached (id in the page's link table).
    pub hyperlink: bool,
    /// DECSCA protection attribute.
    pub protected: bool,
}

impl Cell {
    /// Whether the cell holds visible text.
    pub fn has_text(&self) -> bool {
        match self.content {
            CellContent::Codepoint(c) => c != '\0',
            CellContent::Grapheme(_) => true,
            CellContent::BgPalette(_) | CellContent::BgRgb(_) => false,
        }
    }

    /// The leading codepoint, if the cell holds text.
    pub fn codepoint(&self) -> Option<char> {
        match self.content {
            CellContent::Codepoint(c) if c != '\0' => Some(c),
            CellContent::Grapheme(c) => Some(c),
            _ => None,
        }
    }

    /// Whether the cell references any interned side table.
    pub fn is_managed(&self) -> bool {
        self.style_id != 0
            || self.hyperlink
            || matches!(self.content, CellContent::Grapheme(_))
    }
}

/// Per-row flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct Row {
    /// The logical line soft-wraps onto the next row.
    pub wrap: bool,
    /// This row continues the previous row's logical line.
    pub wrap_continuation: bool,
    /// At least one cell references interned data. May be conservatively
    /// true.
    managed: bool,
    /// Changed since a reader last cleared it.
    pub dirty: bool,
}

impl Row {
    /// Whether any cell in the row references interned data.
    pub fn managed_memory(&self) -> bool {
        self.managed
    }
}

/// Cell identity inside one page, used as the side-table key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId {
    /// Row within the page.
    pub y: u16,
    /// Column.
    pub x: u16,
}

/// A self-contained copy of one cell with its interned data resolved,
/// used to move cells between pages (scroll rotation crosses page
/// boundaries and must re-intern on the destination).
#[derive(Clone, Debug, Default)]
pub struct CellSnapshot {
    /// Cell content.
    pub content: CellContent,
    /// Wide-character role.
    pub wide: Wide,
    /// Resolved style.
    pub style: Style,
    /// Resolved hyperlink.
    pub hyperlink: Option<Hyperlink>,
    /// Extra grapheme codepoints.
    pub graphemes: Vec<char>,
    /// DECSCA protection attribute.
    pub protected: bool,
}

/// A fixed-capacity grid of rows and cells plus interned side tables.
pub struct Page {
    cols: usize,
    rows: Vec<Row>,
    cells: Vec<Cell>,
    styles: InternSet<Style>,
    hyperlinks: InternSet<Hyperlink>,
    graphemes: HashMap<CellId, Vec<char>>,
    links: HashMap<CellId, u16>,
    dirty: bool,
}

impl Page {
    /// An empty page. Rows are added with [`Page::push_row`] up to
    /// [`PAGE_CAPACITY`].
    pub fn new(cols: usize) -> Self {
        Self {
            cols,
            rows: Vec::new(),
            cells: Vec::new(),
            styles: InternSet::new(),
            hyperlinks: InternSet::new(),
            graphemes: HashMap::new(),
            links: HashMap::new(),
            dirty: false,
        }
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows in use.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the page reached its row capacity.
    pub fn is_full(&self) -> bool {
        self.rows.len() == PAGE_CAPACITY
    }

    /// Append a blank row, returning its index. `None` when full.
    pub fn push_row(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let y = self.rows.len();
        self.rows.push(Row::default());
        self.cells.resize(self.cells.len() + self.cols, Cell::default());
        Some(y)
    }

    /// Row flags.
    pub fn row(&self, y: usize) -> &Row {
        &self.rows[y]
    }

    /// Mutable row flags. Marks nothing dirty; use for wrap bookkeeping.
    pub fn row_mut(&mut self, y: usize) -> &mut Row {
        &mut self.rows[y]
    }

    /// The cells of one row.
    pub fn cells(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.cols..(y + 1) * self.cols]
    }

    /// One cell.
    pub fn cell(&self, y: usize, x: usize) -> &Cell {
        &self.cells[y * self.cols + x]
    }

    /// Whether any row changed since the last reader cleared it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark one row (and the page) dirty.
    pub fn mark_row_dirty(&mut self, y: usize) {
        self.rows[y].dirty = true;
        self.dirty = true;
    }

    /// Reader acknowledgment for one row.
    pub fn clear_row_dirty(&mut self, y: usize) {
        self.rows[y].dirty = false;
    }

    /// Recompute the page dirty bit from the row bits; readers call this
    /// after clearing the rows they observed.
    pub fn refresh_dirty(&mut self) {
        self.dirty = self.rows.iter().any(|r| r.dirty);
    }

    /// Write a cell, replacing whatever was there and updating reference
    /// counts on the side tables.
    pub fn write_cell(
        &mut self,
        y: usize,
        x: usize,
        content: CellContent,
        wide: Wide,
        style: &Style,
        hyperlink: Option<&Hyperlink>,
        protected: bool,
    ) -> Result<()> {
        self.release_cell(y, x);
        let style_id = if style.is_default() {
            0
        } else {
            self.styles.intern(style)?
        };
        let has_link = if let Some(link) = hyperlink {
            let id = self.hyperlinks.intern(link)?;
            self.links.insert(cell_id(y, x), id);
            true
        } else {
            false
        };
        let idx = y * self.cols + x;
        self.cells[idx] = Cell {
            content,
            wide,
            style_id,
            hyperlink: has_link,
            protected,
        };
        if self.cells[idx].is_managed() {
            self.rows[y].managed = true;
        }
        self.mark_row_dirty(y);
        Ok(())
    }

    /// Reset a cell to the unwritten default.
    pub fn clear_cell(&mut self, y: usize, x: usize) {
        self.release_cell(y, x);
        self.cells[y * self.cols + x] = Cell::default();
        self.mark_row_dirty(y);
    }

    /// Reset a range of cells in one row.
    pub fn clear_cells(&mut self, y: usize, x0: usize, x1: usize) {
        for x in x0..x1 {
            self.release_cell(y, x);
            self.cells[y * self.cols + x] = Cell::default();
        }
        self.mark_row_dirty(y);
    }

    /// Attach an extra codepoint to a cell's grapheme cluster. The cell
    /// must hold text.
    pub fn append_grapheme(&mut self, y: usize, x: usize, cp: char) -> Result<()> {
        let idx = y * self.cols + x;
        let Some(lead) = self.cells[idx].codepoint() else {
            return Ok(());
        };
        self.cells[idx].content = CellContent::Grapheme(lead);
        self.graphemes.entry(cell_id(y, x)).or_default().push(cp);
        self.rows[y].managed = true;
        self.mark_row_dirty(y);
        Ok(())
    }

    /// Extra grapheme codepoints attached to a cell.
    pub fn grapheme(&self, y: usize, x: usize) -> Option<&[char]> {
        self.graphemes.get(&cell_id(y, x)).map(Vec::as_slice)
    }

    /// The resolved style of a cell (default for id 0).
    pub fn style(&self, id: u16) -> Style {
        self.styles.get(id).copied().unwrap_or_default()
    }

    /// The hyperlink id attached to a cell, if any.
    pub fn hyperlink_id(&self, y: usize, x: usize) -> Option<u16> {
        self.links.get(&cell_id(y, x)).copied()
    }

    /// Resolve a hyperlink id.
    pub fn hyperlink(&self, id: u16) -> Option<&Hyperlink> {
        self.hyperlinks.get(id)
    }

    /// The hyperlink attached to a cell, if any.
    pub fn cell_hyperlink(&self, y: usize, x: usize) -> Option<&Hyperlink> {
        self.hyperlink_id(y, x).and_then(|id| self.hyperlinks.get(id))
    }

    /// Number of live interned styles.
    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    /// Number of live interned hyperlinks.
    pub fn hyperlink_count(&self) -> usize {
        self.hyperlinks.len()
    }

    /// A self-contained copy of one cell for cross-page moves.
    pub fn snapshot(&self, y: usize, x: usize) -> CellSnapshot {
        let cell = *self.cell(y, x);
        CellSnapshot {
            content: cell.content,
            wide: cell.wide,
            style: self.style(cell.style_id),
            hyperlink: self.cell_hyperlink(y, x).cloned(),
            graphemes: self.grapheme(y, x).map(<[char]>::to_vec).unwrap_or_default(),
            protected: cell.protected,
        }
    }

    /// Write a snapshot taken from this or another page, re-interning its
    /// style and hyperlink here.
    pub fn write_snapshot(&mut self, y: usize, x: usize, snap: &CellSnapshot) -> Result<()> {
        self.write_cell(
            y,
            x,
            snap.content,
            snap.wide,
            &snap.style,
            snap.hyperlink.as_ref(),
            snap.protected,
        )?;
        for &cp in &snap.graphemes {
            self.append_grapheme(y, x, cp)?;
        }
        Ok(())
    }

    /// Remove the first `n` rows, shifting the remainder up. Used when
    /// clearing scrollback splits a page. Every surviving row is left
    /// dirty since its position changed.
    pub(crate) fn drop_front_rows(&mut self, n: usize) {
        let n = n.min(self.len());
        if n == 0 {
            return;
        }
        for y in 0..n {
            self.clear_cells(y, 0, self.cols);
        }
        self.rows.drain(0..n);
        self.cells.drain(0..n * self.cols);
        let shift = n as u16;
        let graphemes = std::mem::take(&mut self.graphemes);
        self.graphemes = graphemes
            .into_iter()
            .filter_map(|(id, v)| {
                id.y.checked_sub(shift).map(|y| (CellId { y, x: id.x }, v))
            })
            .collect();
        let links = std::mem::take(&mut self.links);
        self.links = links
            .into_iter()
            .filter_map(|(id, v)| {
                id.y.checked_sub(shift).map(|y| (CellId { y, x: id.x }, v))
            })
            .collect();
        for row in &mut self.rows {
            row.dirty = true;
        }
        self.dirty = true;
    }

    /// Drop any side-table references a cell holds.
    fn release_cell(&mut self, y: usize, x: usize) {
        let idx = y * self.cols + x;
        let cell = self.cells[idx];
        if cell.style_id != 0 {
            self.styles.release(cell.style_id);
        }
        if cell.hyperlink {
            if let Some(id) = self.links.remove(&cell_id(y, x)) {
                self.hyperlinks.release(id);
            }
        }
        if matches!(cell.content, CellContent::Grapheme(_)) {
            self.graphemes.remove(&cell_id(y, x));
        }
    }
}

fn cell_id(y: usize, x: usize) -> CellId {
    CellId {
        y: y as u16,
        x: x as u16,
    }
}
