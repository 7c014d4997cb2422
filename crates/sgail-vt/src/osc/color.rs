//! Payload parsing for the OSC color operations.
//!
//! Covers OSC 4 (palette), OSC 5 (special slots), OSC 10..19 (dynamic
//! colors), OSC 104 / 110..119 (resets), and the kitty color protocol
//! (OSC 21).

use tracing::debug;

use crate::ansi::Terminator;
use crate::rgb::Rgb;

/// The dynamic color slots addressed by OSC 10..19 and reset by
/// OSC 110..119. Discriminants are the OSC numbers and are stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DynamicColor {
    /// Default text foreground (OSC 10).
    Foreground = 10,
    /// Default text background (OSC 11).
    Background = 11,
    /// Text cursor color (OSC 12).
    Cursor = 12,
    /// Pointer foreground (OSC 13).
    MouseForeground = 13,
    /// Pointer background (OSC 14).
    MouseBackground = 14,
    /// Tektronix foreground (OSC 15).
    TektronixForeground = 15,
    /// Tektronix background (OSC 16).
    TektronixBackground = 16,
    /// Highlight background (OSC 17).
    HighlightBackground = 17,
    /// Tektronix cursor (OSC 18).
    TektronixCursor = 18,
    /// Highlight foreground (OSC 19).
    HighlightForeground = 19,
}

impl DynamicColor {
    /// Construct from an OSC number in 10..=19 (or 110..=119).
    pub fn from_osc(number: u16) -> Option<Self> {
        Some(match number {
            10 | 110 => Self::Foreground,
            11 | 111 => Self::Background,
            12 | 112 => Self::Cursor,
            13 | 113 => Self::MouseForeground,
            14 | 114 => Self::MouseBackground,
            15 | 115 => Self::TektronixForeground,
            16 | 116 => Self::TektronixBackground,
            17 | 117 => Self::HighlightBackground,
            18 | 118 => Self::TektronixCursor,
            19 | 119 => Self::HighlightForeground,
            _ => return None,
        })
    }
}

/// What a single color request addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorTarget {
    /// A 256-color palette slot (OSC 4 / 104).
    Palette(u8),
    /// A dynamic color slot (OSC 10..19 / 110..119).
    Dynamic(DynamicColor),
    /// An OSC 5 special slot (bold, underline, blink, reverse, italic).
    Special(u8),
}

/// One set/query/reset tuple inside a color operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRequest {
    /// Set the target to a color.
    Set(ColorTarget, Rgb),
    /// Report the target's current color, echoing the request terminator.
    Query(ColorTarget),
    /// Restore the target's default.
    Reset(ColorTarget),
}

/// Parse the `index;spec;index;spec;...` payload of OSC 4 / OSC 5.
///
/// Malformed pairs are logged and skipped; well-formed pairs around them
/// still apply.
pub(crate) fn parse_palette_requests(payload: &str, special: bool) -> Vec<ColorRequest> {
    let mut requests = Vec::new();
    let mut parts = payload.split(';');
    while let Some(index_part) = parts.next() {
        let Some(spec) = parts.next() else {
            debug!(index = index_part, "color operation index without a spec");
            break;
        };
        let target = match index_part.parse::<u16>() {
            Ok(i) if i <= 255 && special => ColorTarget::Special(i as u8),
            Ok(i) if i <= 255 => ColorTarget::Palette(i as u8),
            _ => {
                debug!(index = index_part, "ignoring invalid color index");
                continue;
            }
        };
        push_spec(&mut requests, target, spec);
    }
    requests
}

/// Parse the chained payload of OSC 10..19: each successive spec advances
/// to the next dynamic slot.
pub(crate) fn parse_dynamic_requests(first: u16, payload: &str) -> Vec<ColorRequest> {
    let mut requests = Vec::new();
    for (i, spec) in payload.split(';').enumerate() {
        let number = first + i as u16;
        let Some(slot) = DynamicColor::from_osc(number) else {
            debug!(number, "dynamic color chain ran past OSC 19");
            break;
        };
        push_spec(&mut requests, ColorTarget::Dynamic(slot), spec);
    }
    requests
}

/// Parse the index list of OSC 104 (non-empty payload form).
pub(crate) fn parse_reset_requests(payload: &str) -> Vec<ColorRequest> {
    let mut requests = Vec::new();
    for part in payload.split(';') {
        match part.parse::<u16>() {
            Ok(i) if i <= 255 => {
                requests.push(ColorRequest::Reset(ColorTarget::Palette(i as u8)));
            }
            _ => debug!(index = part, "ignoring invalid palette reset index"),
        }
    }
    requests
}

fn push_spec(requests: &mut Vec<ColorRequest>, target: ColorTarget, spec: &str) {
    if spec == "?" {
        requests.push(ColorRequest::Query(target));
        return;
    }
    match Rgb::parse(spec) {
        Ok(rgb) => requests.push(ColorRequest::Set(target, rgb)),
        Err(_) => debug!(spec, "ignoring unparseable color spec"),
    }
}

/// A key addressed by the kitty color protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KittyColorKind {
    /// Default text foreground.
    Foreground,
    /// Default text background.
    Background,
    /// Cursor color.
    Cursor,
    /// Text under the cursor.
    CursorText,
    /// Visual bell flash color.
    VisualBell,
    /// Selected text foreground.
    SelectionForeground,
    /// Selected text background.
    SelectionBackground,
    /// A 256-color palette slot, addressed by decimal index.
    Palette(u8),
}

impl KittyColorKind {
    /// Number of addressable kinds: the named keys plus every palette slot.
    pub const COUNT: usize = 7 + 256;

    fn parse(key: &str) -> Option<Self> {
        if let Ok(index) = key.parse::<u16>() {
            return (index <= 255).then_some(Self::Palette(index as u8));
        }
        Some(match key {
            "foreground" => Self::Foreground,
            "background" => Self::Background,
            "cursor" => Self::Cursor,
            "cursor_text" => Self::CursorText,
            "visual_bell" => Self::VisualBell,
            "selection_foreground" => Self::SelectionForeground,
            "selection_background" => Self::SelectionBackground,
            _ => return None,
        })
    }
}

/// One kitty color protocol request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KittyColorRequest {
    /// `key=color`.
    Set(KittyColorKind, Rgb),
    /// `key=?`.
    Query(KittyColorKind),
    /// `key=` (empty value) or bare `key`.
    Reset(KittyColorKind),
}

/// A full OSC 21 command: the request list plus the terminator to echo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KittyColorProtocol {
    /// Requests in payload order.
    pub requests: Vec<KittyColorRequest>,
    /// Terminator to echo in the response.
    pub terminator: Terminator,
}

/// Parse an OSC 21 payload. Returns `None` when the payload holds more
/// entries than the protocol bound allows.
pub(crate) fn parse_kitty(payload: &str, terminator: Terminator) -> Option<KittyColorProtocol> {
    const MAX_ENTRIES: usize = KittyColorKind::COUNT * 2;
    let mut requests = Vec::new();
    for (i, entry) in payload.split(';').enumerate() {
        if i >= MAX_ENTRIES {
            debug!(max = MAX_ENTRIES, "kitty color protocol entry bound exceeded");
            return None;
        }
        if entry.is_empty() {
            continue;
        }
        let (key, value) = match entry.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (entry, None),
        };
        let Some(kind) = KittyColorKind::parse(key) else {
            debug!(key, "ignoring unknown kitty color key");
            continue;
        };
        match value {
            None | Some("") => requests.push(KittyColorRequest::Reset(kind)),
            Some("?") => requests.push(KittyColorRequest::Query(kind)),
            Some(spec) => match Rgb::parse(spec) {
                Ok(rgb) => requests.push(KittyColorRequest::Set(kind, rgb)),
                Err(_) => debug!(spec, "ignoring unparseable kitty color value"),
            },
        }
    }
    if requests.is_empty() {
        return None;
    }
    Some(KittyColorProtocol {
        requests,
        terminator,
    })
}
