//! Key decoding
//!
//! Turns raw input units into [`KeyPress`] values. Units are either keys the
//! transport already resolved (crossterm does its own escape parsing) or raw
//! bytes of an ANSI stream, which go through a small state machine here.
//!
//! An ESC byte opens a pending sequence. Bytes that follow are matched
//! against the CSI (`ESC [`) and SS3 (`ESC O`) forms; when nothing more
//! arrives within the escape timeout the pending bytes resolve to
//! `Alt+<char>` or a bare Escape. A second ESC while a sequence is pending
//! flushes the current best resolution and starts over, so a double Escape
//! is two Escapes and never `Alt+Escape`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::core::input::{KeyCode, KeyPress};

const ESC: u8 = 0x1b;

/// Longest CSI parameter run accepted before the sequence is abandoned
const MAX_CSI_PARAMS: usize = 16;

/// One unit of raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    /// A key record the transport has already decoded
    Key(KeyPress),
    /// One byte of an escape-encoded stream
    Byte(u8),
}

/// Outcome of matching the pending escape bytes
enum Match {
    Complete(KeyPress),
    Incomplete,
    /// The bytes cannot form a known sequence
    Invalid,
}

#[derive(Debug)]
pub struct KeyDecoder {
    /// Escape sequence bytes seen so far (always starts with ESC when non-empty)
    pending: Vec<u8>,
    pending_since: Option<Instant>,
    /// Partial UTF-8 character outside of an escape sequence
    utf8: Vec<u8>,
    ready: VecDeque<KeyPress>,
    escape_timeout: Duration,
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl KeyDecoder {
    pub fn new(escape_timeout: Duration) -> Self {
        Self {
            pending: Vec::new(),
            pending_since: None,
            utf8: Vec::new(),
            ready: VecDeque::new(),
            escape_timeout,
        }
    }

    /// Feed one unit, stamped with the current time
    pub fn process(&mut self, unit: RawInput) {
        self.process_at(unit, Instant::now());
    }

    pub fn process_at(&mut self, unit: RawInput, now: Instant) {
        match unit {
            RawInput::Key(key) => {
                self.flush_pending();
                self.push_ready(key.normalized());
            }
            RawInput::Byte(byte) => self.process_byte(byte, now),
        }
    }

    pub fn key_available(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Dequeue the oldest fully resolved key
    pub fn read_key(&mut self) -> Option<KeyPress> {
        self.ready.pop_front()
    }

    /// Whether an escape sequence is waiting for more bytes
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// How long the caller may wait for the next byte before calling
    /// [`KeyDecoder::expire`]
    pub fn time_to_expiry(&self, now: Instant) -> Option<Duration> {
        self.pending_since
            .map(|since| self.escape_timeout.saturating_sub(now.saturating_duration_since(since)))
    }

    /// Resolve the pending sequence if its timeout has elapsed
    pub fn expire(&mut self, now: Instant) {
        if let Some(since) = self.pending_since {
            if now.saturating_duration_since(since) >= self.escape_timeout {
                self.flush_pending();
            }
        }
    }

    /// Resolve whatever is pending right away
    pub fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        self.pending_since = None;
        self.resolve_best(&pending);
    }

    fn push_ready(&mut self, key: KeyPress) {
        trace!(key = %key, "decoded key");
        self.ready.push_back(key);
    }

    fn process_byte(&mut self, byte: u8, now: Instant) {
        if self.pending.is_empty() {
            self.process_plain(byte, now);
            return;
        }

        if byte == ESC {
            // abandon the pending interpretation, then restart from this ESC
            self.flush_pending();
            self.start_pending(now);
            return;
        }

        self.pending.push(byte);
        match classify(&self.pending) {
            Match::Complete(key) => {
                self.pending.clear();
                self.pending_since = None;
                self.push_ready(key);
            }
            Match::Incomplete => {}
            Match::Invalid => {
                let pending = std::mem::take(&mut self.pending);
                self.pending_since = None;
                trace!(bytes = ?pending, "unrecognized escape sequence");
                self.resolve_best(&pending[..pending.len() - 1]);
                self.process_plain(byte, now);
            }
        }
    }

    fn start_pending(&mut self, now: Instant) {
        self.pending.clear();
        self.pending.push(ESC);
        self.pending_since = Some(now);
    }

    fn process_plain(&mut self, byte: u8, now: Instant) {
        if !self.utf8.is_empty() || byte >= 0x80 {
            self.utf8.push(byte);
            match std::str::from_utf8(&self.utf8) {
                Ok(s) => {
                    let c = s.chars().next().unwrap_or('\u{fffd}');
                    self.utf8.clear();
                    self.push_ready(KeyPress::char(c));
                }
                Err(e) if e.error_len().is_some() || self.utf8.len() >= 4 => {
                    self.utf8.clear();
                    self.push_ready(KeyPress::char('\u{fffd}'));
                }
                Err(_) => {}
            }
            return;
        }

        if byte == ESC {
            self.start_pending(now);
            return;
        }

        self.push_ready(control_key(byte));
    }

    /// Emit the best reading of an abandoned or timed-out sequence.
    ///
    /// `ESC` alone is Escape, `ESC x` is Alt+x; any bytes after the second
    /// one are replayed as ordinary input.
    fn resolve_best(&mut self, bytes: &[u8]) {
        match bytes {
            [] => {}
            [ESC] => self.push_ready(KeyPress::new(KeyCode::Esc)),
            [ESC, second, rest @ ..] => {
                if *second >= 0x80 {
                    // Alt with a non-ASCII character: decode what we can
                    let mut all = vec![*second];
                    all.extend_from_slice(rest);
                    let text = String::from_utf8_lossy(&all).into_owned();
                    let mut chars = text.chars();
                    if let Some(c) = chars.next() {
                        self.push_ready(KeyPress::char(c).alt());
                    }
                    for c in chars {
                        self.push_ready(KeyPress::char(c));
                    }
                    return;
                }
                let mut key = control_key(*second);
                key.alt = true;
                self.push_ready(key.normalized());
                let now = Instant::now();
                for b in rest {
                    self.process_plain(*b, now);
                }
            }
            other => {
                let now = Instant::now();
                for b in other {
                    self.process_plain(*b, now);
                }
            }
        }
    }
}

/// Map a single non-escape byte to its key
fn control_key(byte: u8) -> KeyPress {
    match byte {
        0x0d | 0x0a => KeyPress::new(KeyCode::Enter),
        0x09 => KeyPress::new(KeyCode::Tab),
        0x7f | 0x08 => KeyPress::new(KeyCode::Backspace),
        0x00 => KeyPress::char(' ').ctrl(),
        ESC => KeyPress::new(KeyCode::Esc),
        0x01..=0x1a => KeyPress::char((b'a' + byte - 1) as char).ctrl(),
        0x1c => KeyPress::char('\\').ctrl(),
        0x1d => KeyPress::char(']').ctrl(),
        0x1e => KeyPress::char('^').ctrl(),
        0x1f => KeyPress::char('_').ctrl(),
        b => KeyPress::char(b as char),
    }
}

/// xterm modifier parameter: 1 + (shift | alt << 1 | ctrl << 2)
fn apply_modifier(mut key: KeyPress, param: u32) -> KeyPress {
    let bits = param.saturating_sub(1);
    key.shift = bits & 1 != 0;
    key.alt = bits & 2 != 0;
    key.ctrl = bits & 4 != 0;
    key.normalized()
}

fn cursor_key(letter: u8) -> Option<KeyCode> {
    Some(match letter {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return None,
    })
}

fn tilde_key(number: u32) -> Option<KeyCode> {
    Some(match number {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        11..=15 => KeyCode::F((number - 10) as u8),
        17..=21 => KeyCode::F((number - 11) as u8),
        23 | 24 => KeyCode::F((number - 12) as u8),
        _ => return None,
    })
}

fn classify(bytes: &[u8]) -> Match {
    match bytes {
        [ESC] => Match::Incomplete,
        [ESC, b'['] | [ESC, b'O'] => Match::Incomplete,
        [ESC, b'O', letter] => match cursor_key(*letter) {
            Some(code) => Match::Complete(KeyPress::new(code)),
            None => Match::Invalid,
        },
        [ESC, b'[', body @ ..] => classify_csi(body),
        // start of a multibyte character after ESC
        [ESC, second] if *second >= 0x80 => Match::Incomplete,
        [ESC, second, ..] if *second >= 0x80 => match std::str::from_utf8(&bytes[1..]) {
            Ok(s) => match s.chars().next() {
                Some(c) => Match::Complete(KeyPress::char(c).alt()),
                None => Match::Invalid,
            },
            Err(e) if e.error_len().is_none() && bytes.len() < 5 => Match::Incomplete,
            Err(_) => Match::Invalid,
        },
        [ESC, second] => {
            let mut key = control_key(*second);
            key.alt = true;
            Match::Complete(key.normalized())
        }
        _ => Match::Invalid,
    }
}

fn classify_csi(body: &[u8]) -> Match {
    let Some((&last, params)) = body.split_last() else {
        return Match::Incomplete;
    };

    if (0x30..=0x3f).contains(&last) {
        // still reading parameters
        return if body.len() > MAX_CSI_PARAMS {
            Match::Invalid
        } else {
            Match::Incomplete
        };
    }
    if !(0x40..=0x7e).contains(&last) {
        return Match::Invalid;
    }

    let text = match std::str::from_utf8(params) {
        Ok(t) => t,
        Err(_) => return Match::Invalid,
    };
    let numbers: Vec<u32> = if text.is_empty() {
        Vec::new()
    } else {
        match text.split(';').map(|p| p.parse::<u32>()).collect() {
            Ok(n) => n,
            Err(_) => return Match::Invalid,
        }
    };

    match last {
        b'~' => {
            let Some(code) = numbers.first().copied().and_then(tilde_key) else {
                return Match::Invalid;
            };
            let key = KeyPress::new(code);
            Match::Complete(match numbers.get(1) {
                Some(m) => apply_modifier(key, *m),
                None => key,
            })
        }
        b'Z' => Match::Complete(KeyPress::new(KeyCode::Tab).shift()),
        letter => {
            let Some(code) = cursor_key(letter) else {
                return Match::Invalid;
            };
            let key = KeyPress::new(code);
            Match::Complete(match numbers.as_slice() {
                [] | [1] => key,
                [_, m] => apply_modifier(key, *m),
                _ => return Match::Invalid,
            })
        }
    }
}
