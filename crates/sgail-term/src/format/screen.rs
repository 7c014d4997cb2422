//! The screen formatter: page-list content plus screen-scoped VT extras.

use sgail_vt::charset::{ActiveSlot, Charset, Slot};

use crate::error::Result;
use crate::format::{Emit, Extras, Options, PageListFormatter, Sink, TrailingState};
use crate::point::Space;
use crate::screen::{Screen, ScrollRegion};

/// Formats a whole screen (scrollback included), appending the VT extras
/// needed to reconstruct cursor-adjacent state: position, pending style,
/// hyperlink, protection mode, kitty keyboard flags, and charsets.
pub struct ScreenFormatter<'a> {
    screen: &'a Screen,
    opts: Options,
    extras: Extras,
    origin: Option<ScrollRegion>,
}

impl<'a> ScreenFormatter<'a> {
    /// A formatter over `screen` with no extras.
    pub fn new(screen: &'a Screen, opts: Options) -> Self {
        Self {
            screen,
            opts,
            extras: Extras::default(),
            origin: None,
        }
    }

    /// Enable extras.
    #[must_use]
    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    /// Emit the cursor position relative to a scrolling region (origin
    /// mode replay).
    #[must_use]
    pub fn with_origin(mut self, region: ScrollRegion) -> Self {
        self.origin = Some(region);
        self
    }

    /// Format the whole screen, then the enabled extras (VT mode only).
    pub fn format(&self, sink: &mut Sink<'_>) -> Result<TrailingState> {
        let content = PageListFormatter::new(&self.screen.pages, self.opts);
        let trailing = content.format(
            sink,
            self.screen.pages.top_left(Space::Screen),
            self.screen.pages.bottom_right(Space::Screen),
        )?;
        if self.opts.emit == Emit::Vt {
            self.write_extras(sink)?;
        }
        Ok(trailing)
    }

    /// Emit just the extras. Extra bytes map to the cursor's pin.
    pub fn write_extras(&self, sink: &mut Sink<'_>) -> Result<()> {
        let pin = self.screen.cursor_pin();
        let cursor = &self.screen.cursor;

        if self.extras.cursor {
            let (x, y) = match self.origin {
                Some(region) => (
                    cursor.x.saturating_sub(region.left),
                    cursor.y.saturating_sub(region.top),
                ),
                None => (cursor.x, cursor.y),
            };
            sink.put(&format!("\x1b[{};{}H", y + 1, x + 1), pin)?;
        }

        if self.extras.style {
            sink.put("\x1b[0m", pin)?;
            if !cursor.style.is_default() {
                sink.put(&cursor.style.sgr(), pin)?;
            }
        }

        if self.extras.hyperlink {
            if let Some(link) = &cursor.hyperlink {
                let params = link
                    .id
                    .as_ref()
                    .map(|id| format!("id={id}"))
                    .unwrap_or_default();
                sink.put(&format!("\x1b]8;{params};{}\x1b\\", link.uri), pin)?;
            }
        }

        if self.extras.protection && cursor.protected {
            sink.put("\x1b[1\"q", pin)?;
        }

        if self.extras.kitty_keyboard && !self.screen.kitty_keyboard.is_default() {
            let bits = self.screen.kitty_keyboard.current().bits();
            sink.put(&format!("\x1b[={bits};1u"), pin)?;
        }

        if self.extras.charsets && !self.screen.charsets.is_default() {
            for slot in Slot::ALL {
                let charset = self.screen.charsets.designated(slot);
                if charset == Charset::Utf8 {
                    continue;
                }
                sink.put(
                    &format!(
                        "\x1b{}{}",
                        slot.designation_intermediate(),
                        charset.designation_byte()
                    ),
                    pin,
                )?;
            }
            match self.screen.charsets.invoked(ActiveSlot::Gl) {
                Slot::G0 => {}
                Slot::G1 => sink.put("\x0e", pin)?,
                Slot::G2 => sink.put("\x1bn", pin)?,
                Slot::G3 => sink.put("\x1bo", pin)?,
            }
            match self.screen.charsets.invoked(ActiveSlot::Gr) {
                // G2 is the power-on GR; G0 has no GR locking shift.
                Slot::G0 | Slot::G2 => {}
                Slot::G1 => sink.put("\x1b~", pin)?,
                Slot::G3 => sink.put("\x1b|", pin)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperlink::Hyperlink;
    use crate::screen::PrintOptions;
    use sgail_vt::kitty::KeyFlags;
    use sgail_vt::{ColorSpec, Style};

    fn screen_with(s: &str) -> Screen {
        let mut screen = Screen::new(20, 4, 100);
        let opts = PrintOptions {
            autowrap: true,
            insert: false,
            region: ScrollRegion::full(20, 4),
        };
        for c in s.chars() {
            assert!(screen.print(c, opts).is_ok());
        }
        screen
    }

    fn format(screen: &Screen, opts: Options, extras: Extras) -> String {
        let mut out = String::new();
        let mut sink = Sink::new(&mut out);
        assert!(ScreenFormatter::new(screen, opts)
            .with_extras(extras)
            .format(&mut sink)
            .is_ok());
        out
    }

    fn vt() -> Options {
        Options {
            emit: Emit::Vt,
            ..Options::default()
        }
    }

    #[test]
    fn plain_has_no_extras() {
        let screen = screen_with("hi");
        let out = format(&screen, Options::default(), Extras::all());
        assert_eq!(out, "hi");
    }

    #[test]
    fn cursor_position_emitted_one_indexed() {
        let mut screen = screen_with("hi");
        screen.set_cursor(3, 2);
        let out = format(
            &screen,
            vt(),
            Extras {
                cursor: true,
                ..Extras::default()
            },
        );
        assert!(out.ends_with("\x1b[3;4H"), "got: {out:?}");
    }

    #[test]
    fn origin_relative_cursor() {
        let mut screen = screen_with("");
        screen.set_cursor(5, 2);
        let region = ScrollRegion {
            top: 1,
            bottom: 3,
            left: 2,
            right: 10,
        };
        let mut out = String::new();
        let mut sink = Sink::new(&mut out);
        assert!(ScreenFormatter::new(&screen, vt())
            .with_extras(Extras {
                cursor: true,
                ..Extras::default()
            })
            .with_origin(region)
            .format(&mut sink)
            .is_ok());
        assert!(out.ends_with("\x1b[2;4H"), "got: {out:?}");
    }

    #[test]
    fn style_and_protection() {
        let mut screen = screen_with("");
        screen.cursor.style = Style {
            fg: ColorSpec::Palette(2),
            ..Style::default()
        };
        screen.cursor.protected = true;
        let out = format(
            &screen,
            vt(),
            Extras {
                style: true,
                protection: true,
                ..Extras::default()
            },
        );
        assert!(out.contains("\x1b[0m\x1b[38;5;2m"));
        assert!(out.ends_with("\x1b[1\"q"));
    }

    #[test]
    fn hyperlink_extra() {
        let mut screen = screen_with("");
        screen.cursor.hyperlink = Some(Hyperlink::new(Some("x"), "http://e.com"));
        let out = format(
            &screen,
            vt(),
            Extras {
                hyperlink: true,
                ..Extras::default()
            },
        );
        assert!(out.ends_with("\x1b]8;id=x;http://e.com\x1b\\"));
    }

    #[test]
    fn kitty_flags_only_when_set() {
        let mut screen = screen_with("");
        let none = format(
            &screen,
            vt(),
            Extras {
                kitty_keyboard: true,
                ..Extras::default()
            },
        );
        assert!(!none.contains('u'));
        screen.kitty_push(KeyFlags::DISAMBIGUATE.union(KeyFlags::REPORT_EVENTS));
        let some = format(
            &screen,
            vt(),
            Extras {
                kitty_keyboard: true,
                ..Extras::default()
            },
        );
        assert!(some.ends_with("\x1b[=3;1u"), "got: {some:?}");
    }

    #[test]
    fn charset_designations_and_invocations() {
        let mut screen = screen_with("");
        screen.designate_charset(Slot::G1, Charset::DecSpecial);
        screen.invoke_charset(ActiveSlot::Gl, Slot::G1);
        let out = format(
            &screen,
            vt(),
            Extras {
                charsets: true,
                ..Extras::default()
            },
        );
        assert!(out.contains("\x1b)0"), "got: {out:?}");
        assert!(out.ends_with("\x0e"), "got: {out:?}");
    }
}
