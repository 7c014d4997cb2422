//! Incremental OSC (Operating System Command) parser.
//!
//! The parser consumes the bytes between `ESC ]` and the terminator one at a
//! time: the decimal command number, then — after the first `;` — the raw
//! payload. [`Parser::end`] finalizes the accumulated bytes into a
//! [`Command`], choosing BEL or ST for any response from the terminator byte
//! the caller observed.
//!
//! Malformed input never surfaces as an error: the parser drops into an
//! internal invalid state, logs, and `end` returns `None`. The payload
//! buffer is a fixed 2 KiB; only OSC 52 (clipboard), whose base64 payloads
//! legitimately exceed that, escalates to a growable buffer, and only when
//! the parser was built heap-enabled.

mod color;

pub use color::{
    ColorRequest, ColorTarget, DynamicColor, KittyColorKind, KittyColorProtocol,
    KittyColorRequest,
};

use tracing::{debug, warn};

use crate::ansi::Terminator;

/// Payload budget for every command except OSC 52.
const BUF_SIZE: usize = 2048;

/// Which shell prompt a semantic-prompt marker introduces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PromptKind {
    /// First line of a fresh prompt.
    #[default]
    Primary = 0,
    /// Continuation line of a multi-line prompt.
    Continuation = 1,
    /// Secondary prompt (e.g. `PS2`).
    Secondary = 2,
    /// Right-aligned prompt.
    Right = 3,
}

/// ConEmu progress report states (`OSC 9;4`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProgressState {
    /// Remove any progress indication.
    Remove = 0,
    /// Set progress to a value.
    Set = 1,
    /// Error state, optionally with a value.
    Error = 2,
    /// Indeterminate progress.
    Indeterminate = 3,
    /// Paused, optionally with a value.
    Pause = 4,
}

/// ConEmu tab title change (`OSC 9;3`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TabTitle {
    /// Restore the default tab title.
    Reset,
    /// Set the tab title.
    Value(String),
}

/// A fully parsed OSC command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// OSC 0 / OSC 2: set the window title.
    ChangeWindowTitle(String),
    /// OSC 1: set the window icon label.
    ChangeWindowIcon(String),
    /// OSC 133;A (also ConEmu `OSC 9;12`): a shell prompt begins.
    PromptStart {
        /// Application-defined prompt id.
        aid: Option<String>,
        /// Which prompt line this is.
        kind: PromptKind,
        /// Whether the shell redraws the prompt on resize. Defaults on.
        redraw: bool,
        /// Whether the line is introduced by a special key.
        special_key: bool,
        /// Whether the prompt region accepts click events.
        click_events: bool,
    },
    /// OSC 133;B: the prompt ends, user input begins.
    PromptEnd,
    /// OSC 133;C: user input ends, command output begins.
    EndOfInput {
        /// The command line about to run, when the shell reports it.
        cmdline: Option<String>,
    },
    /// OSC 133;D: the command finished.
    EndOfCommand {
        /// Exit code, when present and parseable.
        exit_code: Option<u8>,
    },
    /// OSC 52: clipboard read/write.
    ClipboardContents {
        /// Clipboard selection kind byte (`c`, `p`, `s`, ...).
        kind: u8,
        /// Base64 payload (or `?` for a read request), uninterpreted.
        data: String,
    },
    /// OSC 7: the shell reports its working directory (URL form, not
    /// validated here).
    ReportPwd(String),
    /// OSC 22: set the pointer shape.
    MouseShape(String),
    /// OSC 4 / 5 / 10..19 / 104 / 110..119: palette and dynamic color
    /// operations. `op` is the OSC number. For `op == 104` an empty request
    /// list means "reset the entire palette".
    ColorOperation {
        /// Originating OSC number.
        op: u16,
        /// Set/query/reset tuples in payload order.
        requests: Vec<ColorRequest>,
        /// Terminator to echo in query responses.
        terminator: Terminator,
    },
    /// OSC 21: kitty color protocol.
    KittyColorProtocol(KittyColorProtocol),
    /// OSC 777;notify, or the OSC 9 fallthrough.
    ShowDesktopNotification {
        /// Notification title; empty for the OSC 9 form.
        title: String,
        /// Notification body.
        body: String,
    },
    /// OSC 8 with a non-empty URI: a hyperlink region begins.
    HyperlinkStart {
        /// Explicit hyperlink id, for splitting/joining regions.
        id: Option<String>,
        /// Link target.
        uri: String,
    },
    /// OSC 8 with an empty URI and no id: the hyperlink region ends.
    HyperlinkEnd,
    /// ConEmu `OSC 9;1`: sleep.
    ConemuSleep {
        /// Clamped to at most 10 seconds.
        duration_ms: u16,
    },
    /// ConEmu `OSC 9;2`: show a message box.
    ConemuShowMessageBox(String),
    /// ConEmu `OSC 9;3`: change the tab title.
    ConemuChangeTabTitle(TabTitle),
    /// ConEmu `OSC 9;4`: progress report.
    ConemuProgressReport {
        /// Progress state.
        state: ProgressState,
        /// Percentage in 0..=100; only meaningful for set/error/pause.
        progress: Option<u8>,
    },
    /// ConEmu `OSC 9;5`: wait for input.
    ConemuWaitInput,
    /// ConEmu `OSC 9;6`: GUI macro.
    ConemuGuimacro(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Waiting for the first digit of the command number.
    Start,
    /// Accumulating the command number.
    Number,
    /// Accumulating payload bytes after the first `;`.
    Payload,
    /// Recognition failed; consuming bytes until reset.
    Invalid,
}

/// The incremental OSC parser. See the module docs for the protocol.
pub struct Parser {
    state: State,
    num: u16,
    digits: u8,
    buf: [u8; BUF_SIZE],
    buf_len: usize,
    /// Growable payload storage; engaged only for OSC 52.
    dynamic: Option<Vec<u8>>,
    heap: bool,
    finished: Option<Command>,
}

impl Parser {
    /// A parser that may allocate for the commands that need it.
    pub fn new() -> Self {
        Self {
            state: State::Start,
            num: 0,
            digits: 0,
            buf: [0; BUF_SIZE],
            buf_len: 0,
            dynamic: None,
            heap: true,
            finished: None,
        }
    }

    /// A parser restricted to the fixed 2 KiB buffer. Commands whose
    /// handling requires the heap (OSC 4, 5, 10..19, 21, 52, 104,
    /// 110..119) are discarded with a warning.
    pub fn heapless() -> Self {
        Self {
            heap: false,
            ..Self::new()
        }
    }

    /// Feed one payload byte. The terminator itself must not be fed; pass
    /// it to [`Parser::end`] instead.
    pub fn next(&mut self, byte: u8) {
        match self.state {
            State::Start => match byte {
                b'0'..=b'9' => {
                    self.num = u16::from(byte - b'0');
                    self.digits = 1;
                    self.state = State::Number;
                }
                _ => {
                    debug!(byte, "OSC does not start with a digit");
                    self.state = State::Invalid;
                }
            },
            State::Number => match byte {
                b'0'..=b'9' => {
                    if self.digits == 3 {
                        debug!("OSC command number too long");
                        self.state = State::Invalid;
                        return;
                    }
                    self.num = self.num * 10 + u16::from(byte - b'0');
                    self.digits += 1;
                }
                b';' => self.begin_payload(),
                _ => {
                    debug!(byte, num = self.num, "unexpected byte in OSC number");
                    self.state = State::Invalid;
                }
            },
            State::Payload => self.push_payload(byte),
            State::Invalid => {}
        }
    }

    /// Finalize the sequence. `terminator` is the byte that ended it on the
    /// wire (BEL, or the ESC of ST); it selects the terminator any response
    /// must echo. Returns the parsed command, or `None` for anything
    /// malformed or unrecognized. The reference is valid until the next
    /// [`Parser::reset`] or [`Parser::end`].
    pub fn end(&mut self, terminator: Option<u8>) -> Option<&Command> {
        let terminator = Terminator::from_byte(terminator);
        self.finished = match self.state {
            State::Start | State::Invalid => None,
            State::Number => self.finalize_bare(terminator),
            State::Payload => self.finalize_payload(terminator),
        };
        self.finished.as_ref()
    }

    /// Return to the start state, releasing any grown payload storage.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.state = State::Start;
        self.num = 0;
        self.digits = 0;
        self.buf_len = 0;
        self.dynamic = None;
        self.finished = None;
    }

    fn begin_payload(&mut self) {
        if !recognized(self.num) {
            debug!(num = self.num, "unrecognized OSC command number");
            self.state = State::Invalid;
            return;
        }
        if requires_heap(self.num) && !self.heap {
            warn!(num = self.num, "discarding OSC that requires allocation");
            self.state = State::Invalid;
            return;
        }
        if self.num == 52 {
            // Clipboard payloads routinely exceed the fixed budget; start
            // on the growable writer immediately.
            let mut storage = Vec::new();
            if storage.try_reserve(BUF_SIZE).is_err() {
                warn!("allocation failed for OSC 52 payload");
                self.state = State::Invalid;
                return;
            }
            self.dynamic = Some(storage);
        }
        self.state = State::Payload;
    }

    fn push_payload(&mut self, byte: u8) {
        if let Some(storage) = &mut self.dynamic {
            if storage.len() == storage.capacity()
                && storage.try_reserve(BUF_SIZE).is_err()
            {
                warn!(len = storage.len(), "allocation failed growing OSC 52 payload");
                self.dynamic = None;
                self.state = State::Invalid;
                return;
            }
            storage.push(byte);
            return;
        }
        if self.buf_len == BUF_SIZE {
            debug!(num = self.num, "OSC payload exceeds fixed buffer");
            self.state = State::Invalid;
            return;
        }
        self.buf[self.buf_len] = byte;
        self.buf_len += 1;
    }

    /// Commands that are complete without any `;` payload.
    fn finalize_bare(&mut self, terminator: Terminator) -> Option<Command> {
        if requires_heap(self.num) && !self.heap {
            warn!(num = self.num, "discarding OSC that requires allocation");
            return None;
        }
        match self.num {
            104 => Some(Command::ColorOperation {
                op: 104,
                requests: Vec::new(),
                terminator,
            }),
            110..=119 => {
                let slot = DynamicColor::from_osc(self.num)?;
                Some(Command::ColorOperation {
                    op: self.num,
                    requests: vec![ColorRequest::Reset(ColorTarget::Dynamic(slot))],
                    terminator,
                })
            }
            _ => {
                debug!(num = self.num, "OSC ended before its payload");
                None
            }
        }
    }

    fn finalize_payload(&mut self, terminator: Terminator) -> Option<Command> {
        let payload: &[u8] = match &self.dynamic {
            Some(storage) => storage,
            None => &self.buf[..self.buf_len],
        };
        let text = String::from_utf8_lossy(payload);
        match self.num {
            0 | 2 => Some(Command::ChangeWindowTitle(text.into_owned())),
            1 => Some(Command::ChangeWindowIcon(text.into_owned())),
            4 | 5 => {
                let requests = color::parse_palette_requests(&text, self.num == 5);
                if requests.is_empty() {
                    debug!(num = self.num, "color operation with no valid requests");
                    return None;
                }
                Some(Command::ColorOperation {
                    op: self.num,
                    requests,
                    terminator,
                })
            }
            7 => Some(Command::ReportPwd(text.into_owned())),
            8 => parse_hyperlink(&text),
            9 => parse_conemu(&text),
            10..=19 => {
                let requests = color::parse_dynamic_requests(self.num, &text);
                if requests.is_empty() {
                    debug!(num = self.num, "dynamic color operation with no valid requests");
                    return None;
                }
                Some(Command::ColorOperation {
                    op: self.num,
                    requests,
                    terminator,
                })
            }
            21 => color::parse_kitty(&text, terminator).map(Command::KittyColorProtocol),
            22 => Some(Command::MouseShape(text.into_owned())),
            52 => parse_clipboard(&text),
            104 => {
                if text.is_empty() {
                    return Some(Command::ColorOperation {
                        op: 104,
                        requests: Vec::new(),
                        terminator,
                    });
                }
                let requests = color::parse_reset_requests(&text);
                if requests.is_empty() {
                    return None;
                }
                Some(Command::ColorOperation {
                    op: 104,
                    requests,
                    terminator,
                })
            }
            110..=119 => {
                // Any payload is ignored; these are plain resets.
                let slot = DynamicColor::from_osc(self.num)?;
                Some(Command::ColorOperation {
                    op: self.num,
                    requests: vec![ColorRequest::Reset(ColorTarget::Dynamic(slot))],
                    terminator,
                })
            }
            133 => parse_semantic_prompt(&text),
            777 => parse_notify(&text),
            _ => None,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Command numbers the digit trie accepts.
fn recognized(num: u16) -> bool {
    matches!(
        num,
        0 | 1 | 2 | 4 | 5 | 7 | 8 | 9 | 10..=19 | 21 | 22 | 52 | 104 | 110..=119 | 133 | 777
    )
}

/// Command numbers whose handling allocates.
fn requires_heap(num: u16) -> bool {
    matches!(num, 4 | 5 | 10..=19 | 21 | 52 | 104 | 110..=119)
}

/// OSC 8: `params;URI`, params colon-separated `key=value`.
fn parse_hyperlink(text: &str) -> Option<Command> {
    let (params, uri) = text.split_once(';')?;
    let mut id = None;
    for param in params.split(':') {
        if let Some((key, value)) = param.split_once('=') {
            if key == "id" && !value.is_empty() {
                id = Some(value.to_string());
            }
        }
    }
    if uri.is_empty() {
        if id.is_some() {
            debug!("hyperlink with id but no URI");
            return None;
        }
        return Some(Command::HyperlinkEnd);
    }
    Some(Command::HyperlinkStart {
        id,
        uri: uri.to_string(),
    })
}

/// OSC 9: ConEmu dispatch on the leading payload bytes, with an
/// iTerm2-style notification fallthrough for unrecognized forms.
fn parse_conemu(text: &str) -> Option<Command> {
    let (head, rest) = match text.split_once(';') {
        Some((head, rest)) => (head, Some(rest)),
        None => (text, None),
    };
    match (head, rest) {
        ("1", Some(arg)) => {
            let requested = arg.parse::<u32>().unwrap_or(100);
            Some(Command::ConemuSleep {
                duration_ms: requested.min(10_000) as u16,
            })
        }
        ("12", None) => Some(Command::PromptStart {
            aid: None,
            kind: PromptKind::Primary,
            redraw: true,
            special_key: false,
            click_events: false,
        }),
        ("2", Some(message)) => Some(Command::ConemuShowMessageBox(message.to_string())),
        ("3", Some("")) => Some(Command::ConemuChangeTabTitle(TabTitle::Reset)),
        ("3", Some(title)) => Some(Command::ConemuChangeTabTitle(TabTitle::Value(
            title.to_string(),
        ))),
        ("4", Some(args)) => parse_progress(args),
        ("5", None) => Some(Command::ConemuWaitInput),
        ("6", Some(macro_text)) => Some(Command::ConemuGuimacro(macro_text.to_string())),
        ("7" | "8" | "9", _) => {
            debug!(head, "reserved ConEmu OSC 9 subcommand");
            None
        }
        _ => Some(Command::ShowDesktopNotification {
            title: String::new(),
            body: text.to_string(),
        }),
    }
}

/// ConEmu `4;S[;P]` progress payload (after the leading `4;`).
fn parse_progress(args: &str) -> Option<Command> {
    let (state_part, progress_part) = match args.split_once(';') {
        Some((s, p)) => (s, Some(p)),
        None => (args, None),
    };
    let state = match state_part {
        "0" => ProgressState::Remove,
        "1" => ProgressState::Set,
        "2" => ProgressState::Error,
        "3" => ProgressState::Indeterminate,
        "4" => ProgressState::Pause,
        _ => {
            debug!(state = state_part, "unknown ConEmu progress state");
            return None;
        }
    };
    let progress = match state {
        ProgressState::Set | ProgressState::Error | ProgressState::Pause => progress_part
            .and_then(|p| p.parse::<u32>().ok())
            .map(|v| v.min(100) as u8),
        _ => None,
    };
    Some(Command::ConemuProgressReport { state, progress })
}

/// OSC 52: `kind;data`, with an empty kind meaning the `c` clipboard.
fn parse_clipboard(text: &str) -> Option<Command> {
    let (kind, data) = text.split_once(';')?;
    let kind = kind.bytes().next().unwrap_or(b'c');
    Some(Command::ClipboardContents {
        kind,
        data: data.to_string(),
    })
}

/// OSC 133: FinalTerm semantic prompt markers.
fn parse_semantic_prompt(text: &str) -> Option<Command> {
    let (head, rest) = match text.split_once(';') {
        Some((head, rest)) => (head, Some(rest)),
        None => (text, None),
    };
    match head {
        "A" => {
            let mut aid = None;
            let mut kind = PromptKind::Primary;
            let mut redraw = true;
            let mut special_key = false;
            let mut click_events = false;
            for option in rest.map(|r| r.split(';')).into_iter().flatten() {
                let (key, value) = match option.split_once('=') {
                    Some((k, v)) => (k, v),
                    None => (option, ""),
                };
                match key {
                    "aid" => aid = Some(value.to_string()),
                    "redraw" => redraw = value != "0",
                    "special_key" => special_key = value == "1",
                    "click_events" => click_events = value == "1",
                    "k" => {
                        kind = match value {
                            "c" => PromptKind::Continuation,
                            "s" => PromptKind::Secondary,
                            "r" => PromptKind::Right,
                            // "i" and anything unknown fall back to primary.
                            _ => PromptKind::Primary,
                        }
                    }
                    _ => {}
                }
            }
            Some(Command::PromptStart {
                aid,
                kind,
                redraw,
                special_key,
                click_events,
            })
        }
        "B" => Some(Command::PromptEnd),
        "C" => {
            let cmdline = rest.and_then(|options| {
                if let Some(value) = options.strip_prefix("cmdline=") {
                    decode_printf_q(value)
                } else if let Some(value) = options.strip_prefix("cmdline_url=") {
                    decode_percent(value)
                } else {
                    None
                }
            });
            Some(Command::EndOfInput { cmdline })
        }
        "D" => Some(Command::EndOfCommand {
            exit_code: rest.and_then(|code| code.parse::<u8>().ok()),
        }),
        _ => {
            debug!(head, "unknown semantic prompt marker");
            None
        }
    }
}

/// OSC 777: only the `notify;TITLE;BODY` form is accepted.
fn parse_notify(text: &str) -> Option<Command> {
    let rest = text.strip_prefix("notify;")?;
    let (title, body) = rest.split_once(';')?;
    Some(Command::ShowDesktopNotification {
        title: title.to_string(),
        body: body.to_string(),
    })
}

/// Decode a `printf %q` quoted command line. Returns `None` on any
/// malformed escape.
fn decode_printf_q(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(inner) = input
        .strip_prefix("$'")
        .and_then(|r| r.strip_suffix('\''))
    {
        return decode_ansi_c(inner);
    }
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next()?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Decode the body of a `$'...'` ANSI-C quoted string.
fn decode_ansi_c(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'e' => out.push('\x1b'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'x' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|d| d.to_digit(16)) {
                        Some(d) => {
                            chars.next();
                            value = value * 16 + d;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return None;
                }
                out.push(char::from_u32(value)?);
            }
            d @ '0'..='7' => {
                let mut value = d.to_digit(8)?;
                let mut digits = 1;
                while digits < 3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            chars.next();
                            value = value * 8 + d;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Decode a URL-percent-encoded command line. Returns `None` on malformed
/// escapes or non-UTF-8 results.
fn decode_percent(input: &str) -> Option<String> {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let hi = (bytes.next()? as char).to_digit(16)?;
        let lo = (bytes.next()? as char).to_digit(16)?;
        out.push((hi * 16 + lo) as u8);
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rgb::Rgb;

    /// Feed a full payload and finalize with ESC (ST-style).
    fn parse(input: &str) -> Option<Command> {
        let mut parser = Parser::new();
        for b in input.bytes() {
            parser.next(b);
        }
        parser.end(Some(0x1b)).cloned()
    }

    #[test]
    fn window_title() {
        assert_eq!(
            parse("0;hello world"),
            Some(Command::ChangeWindowTitle("hello world".to_string()))
        );
        assert_eq!(
            parse("2;alt title"),
            Some(Command::ChangeWindowTitle("alt title".to_string()))
        );
    }

    #[test]
    fn window_icon() {
        assert_eq!(
            parse("1;icon"),
            Some(Command::ChangeWindowIcon("icon".to_string()))
        );
    }

    #[test]
    fn title_with_embedded_semicolons() {
        assert_eq!(
            parse("0;a;b;c"),
            Some(Command::ChangeWindowTitle("a;b;c".to_string()))
        );
    }

    #[test]
    fn unrecognized_number_is_invalid() {
        assert_eq!(parse("3;whatever"), None);
        assert_eq!(parse("1234;x"), None);
        assert_eq!(parse("666;x"), None);
    }

    #[test]
    fn number_without_payload_is_invalid() {
        assert_eq!(parse("0"), None);
        assert_eq!(parse("133"), None);
    }

    #[test]
    fn non_digit_start_is_invalid() {
        assert_eq!(parse(";x"), None);
        assert_eq!(parse("x;y"), None);
    }

    #[test]
    fn pwd_report() {
        assert_eq!(
            parse("7;file://host/tmp"),
            Some(Command::ReportPwd("file://host/tmp".to_string()))
        );
    }

    #[test]
    fn hyperlink_start_with_id() {
        // End-to-end scenario: `8;id=foo;http://example.com` + ESC.
        assert_eq!(
            parse("8;id=foo;http://example.com"),
            Some(Command::HyperlinkStart {
                id: Some("foo".to_string()),
                uri: "http://example.com".to_string(),
            })
        );
    }

    #[test]
    fn hyperlink_start_without_params() {
        assert_eq!(
            parse("8;;http://example.com"),
            Some(Command::HyperlinkStart {
                id: None,
                uri: "http://example.com".to_string(),
            })
        );
    }

    #[test]
    fn hyperlink_end() {
        assert_eq!(parse("8;;"), Some(Command::HyperlinkEnd));
    }

    #[test]
    fn hyperlink_id_without_uri_is_invalid() {
        assert_eq!(parse("8;id=foo;"), None);
    }

    #[test]
    fn hyperlink_empty_id_ignored() {
        assert_eq!(parse("8;id=;"), Some(Command::HyperlinkEnd));
    }

    #[test]
    fn prompt_start_options() {
        // End-to-end scenario: values may themselves contain `=`.
        assert_eq!(
            parse("133;A;aid=a=b;redraw=0"),
            Some(Command::PromptStart {
                aid: Some("a=b".to_string()),
                kind: PromptKind::Primary,
                redraw: false,
                special_key: false,
                click_events: false,
            })
        );
    }

    #[test]
    fn prompt_start_kinds() {
        let kind = |input: &str| match parse(input) {
            Some(Command::PromptStart { kind, .. }) => Some(kind),
            _ => None,
        };
        assert_eq!(kind("133;A;k=c"), Some(PromptKind::Continuation));
        assert_eq!(kind("133;A;k=s"), Some(PromptKind::Secondary));
        assert_eq!(kind("133;A;k=r"), Some(PromptKind::Right));
        assert_eq!(kind("133;A;k=i"), Some(PromptKind::Primary));
        // Unknown values default silently.
        assert_eq!(kind("133;A;k=z"), Some(PromptKind::Primary));
    }

    #[test]
    fn prompt_end() {
        assert_eq!(parse("133;B"), Some(Command::PromptEnd));
    }

    #[test]
    fn end_of_input_plain() {
        assert_eq!(parse("133;C"), Some(Command::EndOfInput { cmdline: None }));
    }

    #[test]
    fn end_of_input_cmdline() {
        assert_eq!(
            parse("133;C;cmdline=echo\\ hi"),
            Some(Command::EndOfInput {
                cmdline: Some("echo hi".to_string()),
            })
        );
    }

    #[test]
    fn end_of_input_cmdline_url() {
        assert_eq!(
            parse("133;C;cmdline_url=echo%20hi"),
            Some(Command::EndOfInput {
                cmdline: Some("echo hi".to_string()),
            })
        );
    }

    #[test]
    fn end_of_input_bad_decode_is_none_cmdline() {
        assert_eq!(
            parse("133;C;cmdline_url=bad%zz"),
            Some(Command::EndOfInput { cmdline: None })
        );
    }

    #[test]
    fn end_of_command_exit_codes() {
        assert_eq!(
            parse("133;D"),
            Some(Command::EndOfCommand { exit_code: None })
        );
        assert_eq!(
            parse("133;D;25"),
            Some(Command::EndOfCommand {
                exit_code: Some(25),
            })
        );
        assert_eq!(
            parse("133;D;not-a-number"),
            Some(Command::EndOfCommand { exit_code: None })
        );
    }

    #[test]
    fn semantic_prompt_unknown_marker() {
        assert_eq!(parse("133;Z"), None);
    }

    #[test]
    fn conemu_sleep() {
        assert_eq!(
            parse("9;1;500"),
            Some(Command::ConemuSleep { duration_ms: 500 })
        );
        // Unparseable defaults to 100ms.
        assert_eq!(
            parse("9;1;bogus"),
            Some(Command::ConemuSleep { duration_ms: 100 })
        );
        // Clamped to 10s.
        assert_eq!(
            parse("9;1;99999"),
            Some(Command::ConemuSleep {
                duration_ms: 10_000,
            })
        );
    }

    #[test]
    fn conemu_prompt_marker() {
        assert_eq!(
            parse("9;12"),
            Some(Command::PromptStart {
                aid: None,
                kind: PromptKind::Primary,
                redraw: true,
                special_key: false,
                click_events: false,
            })
        );
    }

    #[test]
    fn conemu_message_box() {
        assert_eq!(
            parse("9;2;are you sure?"),
            Some(Command::ConemuShowMessageBox("are you sure?".to_string()))
        );
    }

    #[test]
    fn conemu_tab_title() {
        assert_eq!(
            parse("9;3;"),
            Some(Command::ConemuChangeTabTitle(TabTitle::Reset))
        );
        assert_eq!(
            parse("9;3;builds"),
            Some(Command::ConemuChangeTabTitle(TabTitle::Value(
                "builds".to_string(),
            )))
        );
    }

    #[test]
    fn conemu_progress_clamped() {
        // End-to-end scenario: progress clamps to 100.
        assert_eq!(
            parse("9;4;1;150"),
            Some(Command::ConemuProgressReport {
                state: ProgressState::Set,
                progress: Some(100),
            })
        );
    }

    #[test]
    fn conemu_progress_states() {
        assert_eq!(
            parse("9;4;0"),
            Some(Command::ConemuProgressReport {
                state: ProgressState::Remove,
                progress: None,
            })
        );
        // Remove ignores any progress value.
        assert_eq!(
            parse("9;4;0;50"),
            Some(Command::ConemuProgressReport {
                state: ProgressState::Remove,
                progress: None,
            })
        );
        assert_eq!(
            parse("9;4;2;42"),
            Some(Command::ConemuProgressReport {
                state: ProgressState::Error,
                progress: Some(42),
            })
        );
        assert_eq!(
            parse("9;4;3"),
            Some(Command::ConemuProgressReport {
                state: ProgressState::Indeterminate,
                progress: None,
            })
        );
        assert_eq!(
            parse("9;4;4;10"),
            Some(Command::ConemuProgressReport {
                state: ProgressState::Pause,
                progress: Some(10),
            })
        );
        assert_eq!(parse("9;4;7"), None);
    }

    #[test]
    fn conemu_wait_input() {
        assert_eq!(parse("9;5"), Some(Command::ConemuWaitInput));
    }

    #[test]
    fn conemu_guimacro() {
        assert_eq!(
            parse("9;6;IsConEmu"),
            Some(Command::ConemuGuimacro("IsConEmu".to_string()))
        );
    }

    #[test]
    fn conemu_reserved_subcommands() {
        assert_eq!(parse("9;7"), None);
        assert_eq!(parse("9;8;x"), None);
        assert_eq!(parse("9;9"), None);
    }

    #[test]
    fn conemu_fallthrough_notification() {
        assert_eq!(
            parse("9;deploy finished"),
            Some(Command::ShowDesktopNotification {
                title: String::new(),
                body: "deploy finished".to_string(),
            })
        );
        // "1" without a semicolon is not the sleep form.
        assert_eq!(
            parse("9;1"),
            Some(Command::ShowDesktopNotification {
                title: String::new(),
                body: "1".to_string(),
            })
        );
    }

    #[test]
    fn notify_777() {
        assert_eq!(
            parse("777;notify;Title;Body text"),
            Some(Command::ShowDesktopNotification {
                title: "Title".to_string(),
                body: "Body text".to_string(),
            })
        );
        assert_eq!(parse("777;notify;TitleOnly"), None);
        assert_eq!(parse("777;other;a;b"), None);
    }

    #[test]
    fn mouse_shape() {
        assert_eq!(
            parse("22;crosshair"),
            Some(Command::MouseShape("crosshair".to_string()))
        );
    }

    #[test]
    fn clipboard_explicit_kind() {
        assert_eq!(
            parse("52;p;aGVsbG8="),
            Some(Command::ClipboardContents {
                kind: b'p',
                data: "aGVsbG8=".to_string(),
            })
        );
    }

    #[test]
    fn clipboard_default_kind() {
        assert_eq!(
            parse("52;;aGVsbG8="),
            Some(Command::ClipboardContents {
                kind: b'c',
                data: "aGVsbG8=".to_string(),
            })
        );
    }

    #[test]
    fn clipboard_payload_larger_than_fixed_buffer() {
        let big = "A".repeat(BUF_SIZE * 3);
        let mut parser = Parser::new();
        for b in format!("52;c;{big}").bytes() {
            parser.next(b);
        }
        match parser.end(Some(0x07)) {
            Some(Command::ClipboardContents { kind, data }) => {
                assert_eq!(*kind, b'c');
                assert_eq!(data.len(), BUF_SIZE * 3);
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn non_clipboard_payload_overflow_is_invalid() {
        let big = "t".repeat(BUF_SIZE + 1);
        let mut parser = Parser::new();
        for b in format!("0;{big}").bytes() {
            parser.next(b);
        }
        assert_eq!(parser.end(Some(0x07)), None);
    }

    #[test]
    fn heapless_discards_clipboard() {
        let mut parser = Parser::heapless();
        for b in "52;c;aGVsbG8=".bytes() {
            parser.next(b);
        }
        assert_eq!(parser.end(Some(0x07)), None);
    }

    #[test]
    fn heapless_discards_palette_ops() {
        let mut parser = Parser::heapless();
        for b in "4;1;red".bytes() {
            parser.next(b);
        }
        assert_eq!(parser.end(Some(0x07)), None);
        parser.reset();
        for b in "104".bytes() {
            parser.next(b);
        }
        assert_eq!(parser.end(Some(0x07)), None);
    }

    #[test]
    fn heapless_accepts_title() {
        let mut parser = Parser::heapless();
        for b in "0;still fine".bytes() {
            parser.next(b);
        }
        assert_eq!(
            parser.end(Some(0x07)).cloned(),
            Some(Command::ChangeWindowTitle("still fine".to_string()))
        );
    }

    #[test]
    fn color_operation_set_and_query() {
        assert_eq!(
            parse("4;0;rgb:12/34/56;1;?"),
            Some(Command::ColorOperation {
                op: 4,
                requests: vec![
                    ColorRequest::Set(ColorTarget::Palette(0), Rgb::new(0x12, 0x34, 0x56)),
                    ColorRequest::Query(ColorTarget::Palette(1)),
                ],
                terminator: Terminator::St,
            })
        );
    }

    #[test]
    fn color_operation_terminator_echo() {
        let mut parser = Parser::new();
        for b in "4;0;?".bytes() {
            parser.next(b);
        }
        match parser.end(Some(0x07)) {
            Some(Command::ColorOperation { terminator, .. }) => {
                assert_eq!(*terminator, Terminator::Bel);
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn dynamic_color_set_foreground() {
        assert_eq!(
            parse("10;#ff8800"),
            Some(Command::ColorOperation {
                op: 10,
                requests: vec![ColorRequest::Set(
                    ColorTarget::Dynamic(DynamicColor::Foreground),
                    Rgb::new(0xff, 0x88, 0x00),
                )],
                terminator: Terminator::St,
            })
        );
    }

    #[test]
    fn reset_palette_bare_and_listed() {
        assert_eq!(
            parse("104"),
            Some(Command::ColorOperation {
                op: 104,
                requests: Vec::new(),
                terminator: Terminator::St,
            })
        );
        assert_eq!(
            parse("104;1;255"),
            Some(Command::ColorOperation {
                op: 104,
                requests: vec![
                    ColorRequest::Reset(ColorTarget::Palette(1)),
                    ColorRequest::Reset(ColorTarget::Palette(255)),
                ],
                terminator: Terminator::St,
            })
        );
    }

    #[test]
    fn reset_dynamic_bare() {
        assert_eq!(
            parse("110"),
            Some(Command::ColorOperation {
                op: 110,
                requests: vec![ColorRequest::Reset(ColorTarget::Dynamic(
                    DynamicColor::Foreground,
                ))],
                terminator: Terminator::St,
            })
        );
        assert_eq!(
            parse("112"),
            Some(Command::ColorOperation {
                op: 112,
                requests: vec![ColorRequest::Reset(ColorTarget::Dynamic(
                    DynamicColor::Cursor,
                ))],
                terminator: Terminator::St,
            })
        );
    }

    #[test]
    fn kitty_color_protocol_parses() {
        match parse("21;foreground=?;background=#001122") {
            Some(Command::KittyColorProtocol(proto)) => {
                assert_eq!(proto.requests.len(), 2);
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reset_after_parse_behaves_like_fresh() {
        let mut parser = Parser::new();
        for b in "0;first".bytes() {
            parser.next(b);
        }
        assert!(parser.end(Some(0x07)).is_some());
        parser.reset();
        parser.reset(); // idempotent
        for b in "0;second".bytes() {
            parser.next(b);
        }
        assert_eq!(
            parser.end(Some(0x07)).cloned(),
            Some(Command::ChangeWindowTitle("second".to_string()))
        );
    }

    #[test]
    fn end_without_input() {
        let mut parser = Parser::new();
        assert_eq!(parser.end(None), None);
    }

    #[test]
    fn printf_q_decoding() {
        assert_eq!(decode_printf_q("plain"), Some("plain".to_string()));
        assert_eq!(decode_printf_q("a\\ b"), Some("a b".to_string()));
        assert_eq!(
            decode_printf_q("$'echo \\'hi\\''"),
            Some("echo 'hi'".to_string())
        );
        assert_eq!(decode_printf_q("$'tab\\there'"), Some("tab\there".to_string()));
        assert_eq!(decode_printf_q("$'\\x41\\101'"), Some("AA".to_string()));
        // Dangling escape fails.
        assert_eq!(decode_printf_q("oops\\"), None);
        assert_eq!(decode_printf_q("$'\\q'"), None);
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(decode_percent("a%20b"), Some("a b".to_string()));
        assert_eq!(decode_percent("%e2%9c%93"), Some("\u{2713}".to_string()));
        assert_eq!(decode_percent("%2"), None);
        assert_eq!(decode_percent("%zz"), None);
    }
}
