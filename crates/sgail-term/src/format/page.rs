//! The page formatter: one page's cells to text or VT bytes.
//!
//! Blanks are never emitted eagerly. Pending row separators and blank cells
//! accumulate and flush only when later non-blank content arrives, which is
//! what trims trailing whitespace and trailing blank rows without a second
//! pass. The accumulated counts travel across chunk boundaries as
//! [`TrailingState`].

use sgail_vt::{ColorSpec, Style};

use crate::error::Result;
use crate::format::{Emit, Options, Sink, TrailingState};
use crate::page::{Cell, CellContent, Page, Wide};
use crate::pagelist::{PageId, Pin};

/// The row/column range to format: rows `[start_y, end_y)`, with `start_x`
/// applying to the first row and `end_x` (exclusive) to the last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRange {
    /// First row.
    pub start_y: usize,
    /// One past the last row.
    pub end_y: usize,
    /// First column of the first row.
    pub start_x: usize,
    /// One past the last column of the last row.
    pub end_x: usize,
}

/// Formats a range of one page.
pub struct PageFormatter<'a> {
    page: &'a Page,
    id: PageId,
    opts: Options,
}

impl<'a> PageFormatter<'a> {
    /// A formatter over `page`. `id` labels pin-map entries.
    pub fn new(page: &'a Page, id: PageId, opts: Options) -> Self {
        Self { page, id, opts }
    }

    /// Format `range`, chaining `trailing` blanks from a previous chunk.
    ///
    /// The input trailing state is honored only when the range starts at
    /// the page origin; a mid-page start formats standalone. Returns the
    /// blanks still pending at the end of the range.
    pub fn format(
        &self,
        sink: &mut Sink<'_>,
        range: PageRange,
        trailing: Option<TrailingState>,
    ) -> Result<TrailingState> {
        let vt = self.opts.emit == Emit::Vt;
        let clamp = self.pin(0, 0);

        // Pending separators and blank cells, one pin each. Carried-in
        // counts have no in-page history, so they clamp to the origin.
        let mut pending_rows: Vec<Pin> = Vec::new();
        let mut pending_cells: Vec<Pin> = Vec::new();
        if range.start_x == 0 && range.start_y == 0 {
            if let Some(t) = trailing {
                pending_rows.resize(t.rows, clamp);
                pending_cells.resize(t.cells, clamp);
            }
        }

        let mut last_style = Style::default();

        for y in range.start_y..range.end_y {
            let row = self.page.row(y);
            let cells = self.page.cells(y);
            let x0 = if y == range.start_y { range.start_x } else { 0 };
            let x1 = if y + 1 == range.end_y {
                range.end_x
            } else {
                self.page.cols()
            };
            let continuation = self.opts.unwrap && row.wrap_continuation;
            let joined = self.opts.unwrap && row.wrap;
            let sep_pin = self.pin(y, x1.saturating_sub(1).max(x0));

            if !cells[x0..x1].iter().any(|c| self.is_content(c)) {
                if continuation {
                    // Mid-logical-line blanks carry across the wrap.
                    for x in x0..x1 {
                        if !is_spacer(&cells[x]) {
                            pending_cells.push(self.pin(y, x));
                        }
                    }
                } else if !joined {
                    pending_rows.push(sep_pin);
                }
                continue;
            }

            if !continuation {
                // A fresh logical line drops the previous line's trailing
                // blanks; they were trailing, so they are never flushed.
                pending_cells.clear();
            }

            for x in x0..x1 {
                let cell = cells[x];
                if is_spacer(&cell) {
                    continue;
                }
                if !self.is_content(&cell) {
                    pending_cells.push(self.pin(y, x));
                    continue;
                }

                for sep in pending_rows.drain(..) {
                    sink.put("\r\n", sep)?;
                }
                if !pending_cells.is_empty() {
                    if vt && last_style != Style::default() {
                        // Padding must not inherit the run's style.
                        let first = pending_cells[0];
                        sink.put("\x1b[0m", first)?;
                        last_style = Style::default();
                    }
                    for blank in pending_cells.drain(..) {
                        sink.put(" ", blank)?;
                    }
                }

                let cell_pin = self.pin(y, x);
                if vt {
                    let style = self.effective_style(&cell);
                    if style != last_style {
                        sink.put("\x1b[0m", cell_pin)?;
                        if !style.is_default() {
                            sink.put(&style.sgr(), cell_pin)?;
                        }
                        last_style = style;
                    }
                }

                match cell.content {
                    CellContent::Codepoint(c) | CellContent::Grapheme(c) => {
                        sink.put_char(c, cell_pin)?;
                        if let Some(extra) = self.page.grapheme(y, x) {
                            for &cp in extra {
                                sink.put_char(cp, cell_pin)?;
                            }
                        }
                    }
                    // Color-only cells render as styled spaces in VT mode
                    // (plain mode treats them as blank and never gets here).
                    CellContent::BgPalette(_) | CellContent::BgRgb(_) => {
                        sink.put(" ", cell_pin)?;
                    }
                }
            }

            if !joined {
                pending_rows.push(sep_pin);
            }
        }

        Ok(TrailingState {
            rows: pending_rows.len(),
            cells: pending_cells.len(),
        })
    }

    fn pin(&self, y: usize, x: usize) -> Pin {
        Pin {
            page: self.id,
            y,
            x,
        }
    }

    /// Whether a cell emits rather than accumulating as blank.
    fn is_content(&self, cell: &Cell) -> bool {
        match cell.content {
            CellContent::Codepoint('\0') => false,
            CellContent::Codepoint(' ')
                if self.opts.trim && cell.style_id == 0 && !cell.hyperlink =>
            {
                false
            }
            CellContent::Codepoint(_) | CellContent::Grapheme(_) => true,
            CellContent::BgPalette(_) | CellContent::BgRgb(_) => {
                self.opts.emit == Emit::Vt
            }
        }
    }

    /// The style a VT emission must activate for a cell.
    fn effective_style(&self, cell: &Cell) -> Style {
        match cell.content {
            CellContent::BgPalette(i) => Style {
                bg: ColorSpec::Palette(i),
                ..Style::default()
            },
            CellContent::BgRgb(c) => Style {
                bg: ColorSpec::Rgb(c),
                ..Style::default()
            },
            _ => self.page.style(cell.style_id),
        }
    }
}

fn is_spacer(cell: &Cell) -> bool {
    matches!(cell.wide, Wide::SpacerHead | Wide::SpacerTail)
}
