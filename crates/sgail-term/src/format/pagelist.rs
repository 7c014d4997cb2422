//! The page-list formatter: chunked page formatting over a pin range.

use crate::error::Result;
use crate::format::{Options, PageFormatter, PageRange, Sink, TrailingState};
use crate::pagelist::{PageList, Pin};
use crate::point::Direction;

/// Formats an inclusive `(top_left, bottom_right)` range of a page list by
/// composing [`PageFormatter`] calls per page chunk, threading
/// [`TrailingState`] between them. Pin-map entries carry each chunk's page
/// id, which is what turns per-page point maps into a list-wide pin map.
pub struct PageListFormatter<'a> {
    list: &'a PageList,
    opts: Options,
}

impl<'a> PageListFormatter<'a> {
    /// A formatter over `list`.
    pub fn new(list: &'a PageList, opts: Options) -> Self {
        Self { list, opts }
    }

    /// Format the inclusive range, returning the blanks still pending.
    pub fn format(&self, sink: &mut Sink<'_>, tl: Pin, br: Pin) -> Result<TrailingState> {
        let mut trailing: Option<TrailingState> = None;
        for chunk in self.list.page_iterator(Direction::RightDown, tl, br) {
            let Some(page) = self.list.page(chunk.page) else {
                continue;
            };
            let range = PageRange {
                start_y: chunk.start,
                end_y: chunk.end,
                start_x: if chunk.page == tl.page { tl.x } else { 0 },
                end_x: if chunk.page == br.page {
                    br.x + 1
                } else {
                    page.cols()
                },
            };
            let formatter = PageFormatter::new(page, chunk.page, self.opts);
            trailing = Some(formatter.format(sink, range, trailing)?);
        }
        Ok(trailing.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{CellContent, Wide, PAGE_CAPACITY};
    use crate::point::{Point, Position, Space};
    use sgail_vt::Style;

    fn write_str(list: &mut PageList, x: usize, y: usize, s: &str) {
        for (i, c) in s.chars().enumerate() {
            let pin = match list.pin(Point::Active(Position::new(x + i, y))) {
                Some(p) => p,
                None => unreachable!(),
            };
            let page = match list.page_mut(pin.page) {
                Some(p) => p,
                None => unreachable!(),
            };
            assert!(page
                .write_cell(
                    pin.y,
                    pin.x,
                    CellContent::Codepoint(c),
                    Wide::Narrow,
                    &Style::default(),
                    None,
                    false,
                )
                .is_ok());
        }
    }

    fn format_screen(list: &PageList) -> String {
        let mut out = String::new();
        let mut sink = Sink::new(&mut out);
        let formatter = PageListFormatter::new(list, Options::default());
        assert!(formatter
            .format(
                &mut sink,
                list.top_left(Space::Screen),
                list.bottom_right(Space::Screen),
            )
            .is_ok());
        out
    }

    #[test]
    fn single_page_range() {
        let mut list = PageList::new(20, 4, 100);
        write_str(&mut list, 0, 0, "one");
        write_str(&mut list, 0, 2, "two");
        assert_eq!(format_screen(&list), "one\r\n\r\ntwo");
    }

    #[test]
    fn cross_page_content_joins() {
        let mut list = PageList::new(8, 4, 100_000);
        // Fill until content lands on the second page.
        for _ in 0..PAGE_CAPACITY {
            list.grow();
        }
        // The last active row is on page 1.
        write_str(&mut list, 0, 0, "top");
        write_str(&mut list, 0, 3, "bottom");
        let mut out = String::new();
        let mut sink = Sink::new(&mut out);
        let formatter = PageListFormatter::new(&list, Options::default());
        assert!(formatter
            .format(
                &mut sink,
                list.top_left(Space::Active),
                list.bottom_right(Space::Active),
            )
            .is_ok());
        assert_eq!(out, "top\r\n\r\n\r\nbottom");
    }

    #[test]
    fn pin_map_spans_pages() {
        let mut list = PageList::new(8, 4, 100_000);
        for _ in 0..PAGE_CAPACITY {
            list.grow();
        }
        write_str(&mut list, 0, 0, "aa");
        write_str(&mut list, 0, 3, "bb");
        let mut out = String::new();
        let mut map = Vec::new();
        let mut sink = Sink::with_map(&mut out, &mut map);
        let formatter = PageListFormatter::new(&list, Options::default());
        assert!(formatter
            .format(
                &mut sink,
                list.top_left(Space::Active),
                list.bottom_right(Space::Active),
            )
            .is_ok());
        assert_eq!(map.len(), out.len());
        let first = map[0];
        let last = map[map.len() - 1];
        assert!(first.page < last.page || first.y < last.y);
    }

    #[test]
    fn partial_first_row() {
        let mut list = PageList::new(20, 2, 100);
        write_str(&mut list, 0, 0, "abcdef");
        let tl = match list.pin(Point::Active(Position::new(2, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let br = match list.pin(Point::Active(Position::new(4, 0))) {
            Some(p) => p,
            None => unreachable!(),
        };
        let mut out = String::new();
        let mut sink = Sink::new(&mut out);
        let formatter = PageListFormatter::new(&list, Options::default());
        assert!(formatter.format(&mut sink, tl, br).is_ok());
        assert_eq!(out, "cde");
    }
}
