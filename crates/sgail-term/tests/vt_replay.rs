//! VT replay integration tests.
//!
//! The terminal formatter's VT output must reconstruct terminal state when
//! fed back in. Palette state is replayed for real through the OSC parser;
//! the remaining extras are checked as exact byte sequences.

use sgail_term::{
    Emit, Extras, Options, Sink, Terminal, TerminalFormatter, TerminalOptions,
};
use sgail_vt::osc::Command;

fn terminal() -> Terminal {
    Terminal::new(TerminalOptions {
        cols: 80,
        rows: 24,
        max_scrollback: 1000,
    })
}

fn format_vt(t: &Terminal) -> String {
    let mut out = String::new();
    let mut sink = Sink::new(&mut out);
    let opts = Options {
        emit: Emit::Vt,
        ..Options::default()
    };
    let formatter = TerminalFormatter::new(t, opts).with_extras(Extras::all());
    assert!(formatter.format(&mut sink).is_ok());
    out
}

/// Split a byte stream into OSC payloads with their terminator byte.
fn extract_oscs(stream: &str) -> Vec<(Vec<u8>, u8)> {
    let bytes = stream.as_bytes();
    let mut oscs = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == 0x1b && bytes[i + 1] == b']' {
            let mut j = i + 2;
            let mut payload = Vec::new();
            let mut terminator = 0x07;
            while j < bytes.len() {
                if bytes[j] == 0x07 {
                    terminator = 0x07;
                    j += 1;
                    break;
                }
                if bytes[j] == 0x1b && bytes.get(j + 1) == Some(&b'\\') {
                    terminator = 0x1b;
                    j += 2;
                    break;
                }
                payload.push(bytes[j]);
                j += 1;
            }
            oscs.push((payload, terminator));
            i = j;
        } else {
            i += 1;
        }
    }
    oscs
}

/// Run every OSC in a stream through the wire parser and apply the color
/// operations to a terminal.
fn replay_oscs(stream: &str, target: &mut Terminal) {
    let mut parser = sgail_vt::Parser::new();
    for (payload, terminator) in extract_oscs(stream) {
        parser.reset();
        for b in payload {
            parser.next(b);
        }
        match parser.end(Some(terminator)) {
            Some(Command::ColorOperation { op, requests, .. }) => {
                let (op, requests) = (*op, requests.clone());
                target.apply_color_operation(op, &requests);
            }
            Some(Command::ReportPwd(pwd)) => {
                let pwd = pwd.clone();
                target.set_pwd(pwd);
            }
            _ => {}
        }
    }
}

#[test]
fn palette_round_trip() {
    // End-to-end scenario: set three palette entries on A, format, replay
    // into B, and the entries match.
    let mut a = terminal();
    let mut parser = sgail_vt::Parser::new();
    for seq in ["4;0;rgb:12/34/56", "4;1;rgb:ab/cd/ef", "4;255;rgb:ff/00/ff"] {
        parser.reset();
        for b in seq.bytes() {
            parser.next(b);
        }
        match parser.end(Some(0x1b)) {
            Some(Command::ColorOperation { op, requests, .. }) => {
                let (op, requests) = (*op, requests.clone());
                a.apply_color_operation(op, &requests);
            }
            other => unreachable!("expected color operation, got {other:?}"),
        }
    }

    let stream = format_vt(&a);
    let mut b = terminal();
    replay_oscs(&stream, &mut b);

    assert_eq!(b.colors.palette.current[0], a.colors.palette.current[0]);
    assert_eq!(b.colors.palette.current[1], a.colors.palette.current[1]);
    assert_eq!(b.colors.palette.current[255], a.colors.palette.current[255]);
    // Untouched entries match too.
    assert_eq!(b.colors.palette.current, a.colors.palette.current);
}

#[test]
fn pwd_round_trip() {
    let mut a = terminal();
    a.set_pwd("file://host/srv/www");
    let stream = format_vt(&a);
    let mut b = terminal();
    replay_oscs(&stream, &mut b);
    assert_eq!(b.pwd, a.pwd);
}

#[test]
fn visible_content_appears_before_state() {
    let mut a = terminal();
    for c in "hello".chars() {
        assert!(a.print(c).is_ok());
    }
    let stream = format_vt(&a);
    let content = stream.find("hello");
    let palette = stream.find("\x1b]4;0;");
    assert!(content.is_some());
    assert!(palette.is_some());
    assert!(content < palette);
}

#[test]
fn cursor_and_style_bytes() {
    let mut a = terminal();
    for c in "ab".chars() {
        assert!(a.print(c).is_ok());
    }
    a.active_screen_mut().cursor.style.bold = true;
    let stream = format_vt(&a);
    // Cursor at (2, 0) -> CUP row 1 col 3; then reset + bold.
    assert!(stream.contains("\x1b[1;3H"));
    assert!(stream.contains("\x1b[0m\x1b[1m"));
}

#[test]
fn scroll_region_and_modes_bytes() {
    let mut a = terminal();
    a.set_scroll_region(2, 10);
    a.set_mode(sgail_term::modes::Mode::Origin, true);
    let stream = format_vt(&a);
    assert!(stream.contains("\x1b[3;11r"));
    assert!(stream.contains("\x1b[?6h"));
    // Origin mode makes the emitted cursor region-relative: home is the
    // region's top-left.
    assert!(stream.ends_with("\x1b[1;1H\x1b[0m"));
}

#[test]
fn tabstop_bytes() {
    let mut a = terminal();
    a.tab_clear_all();
    a.active_screen_mut().set_cursor(3, 0);
    a.tab_set();
    a.active_screen_mut().set_cursor(9, 0);
    a.tab_set();
    let stream = format_vt(&a);
    assert!(stream.contains("\x1b[3g\x1b[4G\x1bH\x1b[10G\x1bH"));
}

#[test]
fn pin_map_covers_whole_stream() {
    let mut a = terminal();
    for c in "map me".chars() {
        assert!(a.print(c).is_ok());
    }
    let mut out = String::new();
    let mut map = Vec::new();
    let mut sink = Sink::with_map(&mut out, &mut map);
    let opts = Options {
        emit: Emit::Vt,
        ..Options::default()
    };
    let formatter = TerminalFormatter::new(&a, opts).with_extras(Extras::all());
    assert!(formatter.format(&mut sink).is_ok());
    let bytes_written = sink.bytes_written();
    drop(sink);
    assert_eq!(map.len(), bytes_written);
    assert_eq!(map.len(), out.len());
}
