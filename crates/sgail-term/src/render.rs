//! Renderer-facing snapshot of the active viewport.
//!
//! [`RenderState::update`] runs under the terminal lock and copies out only
//! what changed: rows are reused frame to frame, a row is rebuilt only when
//! its dirty bit (or a screen-wide condition) says so, and raw cells are
//! copied in bulk with side tables resolved only for rows that reference
//! interned data. After `update` returns, the snapshot is the renderer's
//! alone and needs no lock.

use sgail_vt::ansi::CursorStyle;
use sgail_vt::{Palette, Rgb, Style};

use crate::error::Result;
use crate::hyperlink::Hyperlink;
use crate::modes::Mode;
use crate::page::{Cell, CellContent, Wide};
use crate::pagelist::Pin;
use crate::point::{Direction, Position, Space};
use crate::screenset::ScreenKey;
use crate::terminal::Terminal;

/// One snapshot row: raw cells plus resolved side tables.
#[derive(Clone, Debug, Default)]
pub struct RenderRow {
    /// Raw cell copies.
    pub cells: Vec<Cell>,
    /// Resolved styles for this row's style ids.
    pub styles: Vec<(u16, Style)>,
    /// Extra grapheme codepoints by column.
    pub graphemes: Vec<(usize, Vec<char>)>,
    /// Hyperlink group by column; groups index [`RenderState::links`].
    pub links: Vec<(usize, u32)>,
    /// Whether this row was rebuilt by the last update.
    pub dirty: bool,
}

impl RenderRow {
    fn reset(&mut self) {
        self.cells.clear();
        self.styles.clear();
        self.graphemes.clear();
        self.links.clear();
    }

    /// The resolved style of the cell at `x`.
    pub fn style_at(&self, x: usize) -> Style {
        let Some(cell) = self.cells.get(x) else {
            return Style::default();
        };
        if cell.style_id == 0 {
            return Style::default();
        }
        self.styles
            .iter()
            .find(|(id, _)| *id == cell.style_id)
            .map(|(_, style)| *style)
            .unwrap_or_default()
    }

    /// Extra grapheme codepoints of the cell at `x`.
    pub fn grapheme_at(&self, x: usize) -> Option<&[char]> {
        self.graphemes
            .iter()
            .find(|(col, _)| *col == x)
            .map(|(_, cps)| cps.as_slice())
    }

    /// Hyperlink group of the cell at `x`.
    pub fn link_at(&self, x: usize) -> Option<u32> {
        self.links
            .iter()
            .find(|(col, _)| *col == x)
            .map(|(_, group)| *group)
    }

    /// The text of this row, trailing blanks trimmed (test/debug helper).
    pub fn text(&self) -> String {
        let mut s = String::new();
        for (x, cell) in self.cells.iter().enumerate() {
            match cell.content {
                CellContent::Codepoint(c) if c != '\0' => s.push(c),
                CellContent::Grapheme(c) => {
                    s.push(c);
                    if let Some(extra) = self.grapheme_at(x) {
                        s.extend(extra.iter());
                    }
                }
                _ => s.push(' '),
            }
        }
        s.truncate(s.trim_end().len());
        s
    }
}

/// Cursor state as the renderer needs it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderCursor {
    /// Column in active coordinates.
    pub x: usize,
    /// Row in active coordinates.
    pub y: usize,
    /// Position in viewport coordinates; `None` when scrolled off-screen.
    pub viewport: Option<Position>,
    /// The cell left of the cursor is wide (the renderer may widen the
    /// cursor to cover the glyph).
    pub wide_tail: bool,
    /// DECTCEM.
    pub visible: bool,
    /// DECSCUSR shape.
    pub style: CursorStyle,
}

/// The renderer's snapshot of one terminal.
pub struct RenderState {
    rows: Vec<RenderRow>,
    /// Cursor state.
    pub cursor: RenderCursor,
    /// Effective background (already reverse-video swapped).
    pub background: Rgb,
    /// Effective foreground (already reverse-video swapped).
    pub foreground: Rgb,
    /// Cursor color override; `None` lets the renderer pick.
    pub cursor_color: Option<Rgb>,
    /// Copy of the current 256-color palette.
    pub palette: Palette,
    links: Vec<Hyperlink>,
    active_key: Option<ScreenKey>,
    last_viewport: Option<Pin>,
    last_dims: (usize, usize),
}

impl RenderState {
    /// An empty snapshot; the first [`RenderState::update`] fills it.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            cursor: RenderCursor::default(),
            background: Rgb::default(),
            foreground: Rgb::default(),
            cursor_color: None,
            palette: Palette::default(),
            links: Vec::new(),
            active_key: None,
            last_viewport: None,
            last_dims: (0, 0),
        }
    }

    /// The snapshot rows, top of viewport first.
    pub fn rows(&self) -> &[RenderRow] {
        &self.rows
    }

    /// Resolve a hyperlink group to its value.
    pub fn link(&self, group: u32) -> Option<&Hyperlink> {
        self.links.get(group as usize)
    }

    /// Refresh from the terminal. Must be called under the caller's
    /// terminal lock; clears the terminal's and screen's dirty state.
    pub fn update(&mut self, terminal: &mut Terminal) -> Result<()> {
        let dims = (terminal.cols(), terminal.rows());
        let key = terminal.screens.active_key();
        let reverse = terminal.modes.get(Mode::ReverseColors);
        let mut background = terminal.background_color();
        let mut foreground = terminal.foreground_color();
        if reverse {
            std::mem::swap(&mut background, &mut foreground);
        }
        let cursor_color = terminal.colors.cursor.get();
        let palette = terminal.colors.palette.current.clone();
        let cursor_visible = terminal.modes.get(Mode::CursorVisible);
        let cursor_shape = terminal.cursor_style;
        let terminal_dirty = terminal.dirty.any();

        let screen = terminal.screens.active_mut();
        let viewport_pin = screen.pages.viewport_pin();
        let redraw = self.active_key != Some(key)
            || terminal_dirty
            || screen.dirty.any()
            || self.last_dims != dims
            || self.last_viewport != Some(viewport_pin);

        if redraw {
            self.links.clear();
        }
        self.rows.resize_with(dims.1, RenderRow::default);

        let pins: Vec<Pin> = screen
            .pages
            .row_iterator(
                Direction::RightDown,
                screen.pages.top_left(Space::Viewport),
                Some(screen.pages.bottom_right(Space::Viewport)),
            )
            .collect();

        for (i, pin) in pins.iter().enumerate() {
            let Some(page) = screen.pages.page_mut(pin.page) else {
                continue;
            };
            let row_dirty = page.row(pin.y).dirty;
            if !redraw && !(page.is_dirty() && row_dirty) {
                if let Some(row) = self.rows.get_mut(i) {
                    row.dirty = false;
                }
                continue;
            }
            let Some(target) = self.rows.get_mut(i) else {
                continue;
            };
            target.reset();
            target.cells.extend_from_slice(page.cells(pin.y));
            if page.row(pin.y).managed_memory() {
                for x in 0..target.cells.len() {
                    let cell = target.cells[x];
                    if cell.style_id != 0
                        && !target.styles.iter().any(|(id, _)| *id == cell.style_id)
                    {
                        target.styles.push((cell.style_id, page.style(cell.style_id)));
                    }
                    if matches!(cell.content, CellContent::Grapheme(_)) {
                        if let Some(extra) = page.grapheme(pin.y, x) {
                            target.graphemes.push((x, extra.to_vec()));
                        }
                    }
                    if cell.hyperlink {
                        if let Some(link) = page.cell_hyperlink(pin.y, x) {
                            let group = match self.links.iter().position(|l| l == link) {
                                Some(g) => g as u32,
                                None => {
                                    self.links.push(link.clone());
                                    (self.links.len() - 1) as u32
                                }
                            };
                            target.links.push((x, group));
                        }
                    }
                }
            }
            target.dirty = true;
            page.clear_row_dirty(pin.y);
        }

        // Recompute page-level dirty from what remains unobserved.
        let mut seen = Vec::new();
        for pin in &pins {
            if seen.contains(&pin.page) {
                continue;
            }
            seen.push(pin.page);
            if let Some(page) = screen.pages.page_mut(pin.page) {
                page.refresh_dirty();
            }
        }

        // Cursor.
        let cpin = screen.cursor_pin();
        let viewport = screen.pages.position_of(cpin, Space::Viewport);
        let wide_tail = screen.pages.page(cpin.page).is_some_and(|page| {
            let here = page.cell(cpin.y, cpin.x);
            let left_wide = cpin.x > 0 && page.cell(cpin.y, cpin.x - 1).wide == Wide::Wide;
            here.wide == Wide::SpacerTail || left_wide
        });
        self.cursor = RenderCursor {
            x: screen.cursor.x,
            y: screen.cursor.y,
            viewport,
            wide_tail,
            visible: cursor_visible,
            style: cursor_shape,
        };

        screen.dirty.clear();
        terminal.dirty.clear();

        self.background = background;
        self.foreground = foreground;
        self.cursor_color = cursor_color;
        self.palette = palette;
        self.active_key = Some(key);
        self.last_viewport = Some(viewport_pin);
        self.last_dims = dims;
        Ok(())
    }

    /// Every viewport cell belonging to the same hyperlink as the cell at
    /// `point` (viewport coordinates). Empty when the cell has no link.
    pub fn link_cells(&self, point: Position) -> Vec<Position> {
        let Some(group) = self.rows.get(point.y).and_then(|row| row.link_at(point.x))
        else {
            return Vec::new();
        };
        let mut cells = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for &(x, g) in &row.links {
                if g == group {
                    cells.push(Position::new(x, y));
                }
            }
        }
        cells
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}
