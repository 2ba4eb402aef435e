//! Terminal transport
//!
//! The editor only talks to the terminal through [`Terminal`]: read input,
//! write text, query and move the cursor. [`CrosstermTerminal`] is the real
//! one; [`MockTerminal`] keeps a screen model in memory so whole read-line
//! calls can be driven from tests.

use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind, KeyModifiers};
use unicode_segmentation::UnicodeSegmentation;

use crate::core::decoder::RawInput;
use crate::core::input::{KeyCode, KeyPress};
use crate::terminal::raw::RawMode;
use crate::terminal::width::grapheme_width;

/// Terminal events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Input(RawInput),
    Resize(u16, u16),
}

pub trait Terminal {
    /// Next event; `None` once `timeout` passes, or when input is exhausted
    /// if there is no timeout
    fn read(&mut self, timeout: Option<Duration>) -> io::Result<Option<TerminalEvent>>;

    fn write_str(&mut self, s: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// (columns, rows)
    fn size(&self) -> io::Result<(u16, u16)>;

    /// (column, row)
    fn cursor_position(&mut self) -> io::Result<(u16, u16)>;

    fn bell(&mut self) -> io::Result<()> {
        self.write_str("\x07")
    }
}

pub trait Clipboard {
    fn get_text(&mut self) -> Option<String>;
    fn set_text(&mut self, text: &str);
}

/// Process-local clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}

/// Stdin/stdout terminal in raw mode
pub struct CrosstermTerminal {
    stdout: Stdout,
    _raw: RawMode,
}

impl CrosstermTerminal {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            stdout: io::stdout(),
            _raw: RawMode::new()?,
        })
    }
}

/// Convert a crossterm key event; `None` for keys the editor has no use for
pub fn convert_key(key_event: event::KeyEvent) -> Option<KeyPress> {
    let modifiers = key_event.modifiers;
    let code = match key_event.code {
        event::KeyCode::Char(c) => KeyCode::Char(c),
        event::KeyCode::Backspace => KeyCode::Backspace,
        event::KeyCode::Enter => KeyCode::Enter,
        event::KeyCode::Left => KeyCode::Left,
        event::KeyCode::Right => KeyCode::Right,
        event::KeyCode::Up => KeyCode::Up,
        event::KeyCode::Down => KeyCode::Down,
        event::KeyCode::Home => KeyCode::Home,
        event::KeyCode::End => KeyCode::End,
        event::KeyCode::PageUp => KeyCode::PageUp,
        event::KeyCode::PageDown => KeyCode::PageDown,
        event::KeyCode::Tab | event::KeyCode::BackTab => KeyCode::Tab,
        event::KeyCode::Delete => KeyCode::Delete,
        event::KeyCode::Insert => KeyCode::Insert,
        event::KeyCode::F(n) => KeyCode::F(n),
        event::KeyCode::Esc => KeyCode::Esc,
        event::KeyCode::Null => KeyCode::Null,
        _ => return None,
    };
    let press = KeyPress {
        code,
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        alt: modifiers.contains(KeyModifiers::ALT),
        shift: modifiers.contains(KeyModifiers::SHIFT)
            || key_event.code == event::KeyCode::BackTab,
    };
    Some(press.normalized())
}

impl Terminal for CrosstermTerminal {
    fn read(&mut self, timeout: Option<Duration>) -> io::Result<Option<TerminalEvent>> {
        loop {
            if let Some(timeout) = timeout {
                if !event::poll(timeout)? {
                    return Ok(None);
                }
            }
            match event::read()? {
                Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                    if let Some(key) = convert_key(key_event) {
                        return Ok(Some(TerminalEvent::Input(RawInput::Key(key))));
                    }
                }
                Event::Resize(cols, rows) => return Ok(Some(TerminalEvent::Resize(cols, rows))),
                _ => {}
            }
        }
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.stdout.write_all(s.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        crossterm::cursor::position()
    }
}

/// In-memory terminal with a screen model.
///
/// Understands the subset of ANSI the renderer emits: cursor moves, line and
/// screen clears, scrolling, SGR (ignored) and cursor visibility.
#[derive(Debug, Clone)]
pub struct MockTerminal {
    input: VecDeque<TerminalEvent>,
    width: u16,
    height: u16,
    screen: Vec<Vec<String>>,
    col: usize,
    row: usize,
    output: String,
    bells: usize,
}

impl MockTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            input: VecDeque::new(),
            width,
            height,
            screen: vec![vec![String::new(); width as usize]; height as usize],
            col: 0,
            row: 0,
            output: String::new(),
            bells: 0,
        }
    }

    pub fn push_key(&mut self, key: KeyPress) {
        self.input.push_back(TerminalEvent::Input(RawInput::Key(key)));
    }

    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = KeyPress>) {
        for key in keys {
            self.push_key(key);
        }
    }

    /// Type `text`; `\n` presses Enter
    pub fn push_str(&mut self, text: &str) {
        for c in text.chars() {
            let key = match c {
                '\n' | '\r' => KeyPress::new(KeyCode::Enter),
                c => KeyPress::char(c),
            };
            self.push_key(key);
        }
    }

    /// Feed raw bytes, as a terminal without key decoding would
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.input.push_back(TerminalEvent::Input(RawInput::Byte(b)));
        }
    }

    pub fn push_resize(&mut self, width: u16, height: u16) {
        self.input.push_back(TerminalEvent::Resize(width, height));
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Screen rows with trailing blanks trimmed
    pub fn screen_lines(&self) -> Vec<String> {
        self.screen
            .iter()
            .map(|row| row.concat().trim_end().to_string())
            .collect()
    }

    /// (column, row)
    pub fn cursor(&self) -> (u16, u16) {
        (self.col.min(self.width as usize - 1) as u16, self.row as u16)
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn bells(&self) -> usize {
        self.bells
    }

    fn blank_row(&self) -> Vec<String> {
        vec![String::new(); self.width as usize]
    }

    fn scroll(&mut self, lines: usize) {
        for _ in 0..lines.min(self.height as usize) {
            self.screen.remove(0);
            let blank = self.blank_row();
            self.screen.push(blank);
        }
    }

    fn line_feed(&mut self) {
        if self.row + 1 >= self.height as usize {
            self.scroll(1);
        } else {
            self.row += 1;
        }
    }

    fn print(&mut self, g: &str) {
        let w = grapheme_width(g).max(1);
        let width = self.width as usize;
        if self.col + w > width {
            self.col = 0;
            self.line_feed();
        }
        self.screen[self.row][self.col] = g.to_string();
        for i in 1..w {
            if let Some(cell) = self.screen[self.row].get_mut(self.col + i) {
                cell.clear();
            }
        }
        self.col += w;
    }

    fn clear_line_from_cursor(&mut self) {
        let col = self.col.min(self.width as usize);
        for cell in &mut self.screen[self.row][col..] {
            cell.clear();
        }
    }

    fn csi(&mut self, params: &str, fin: char) {
        let nums: Vec<usize> = params
            .trim_start_matches('?')
            .split(';')
            .map(|p| p.parse().unwrap_or(0))
            .collect();
        let first = nums.first().copied().unwrap_or(0);
        match fin {
            'H' => {
                let row = first.max(1) - 1;
                let col = nums.get(1).copied().unwrap_or(1).max(1) - 1;
                self.row = row.min(self.height as usize - 1);
                self.col = col.min(self.width as usize - 1);
            }
            'K' if first == 2 => self.screen[self.row] = self.blank_row(),
            'K' => self.clear_line_from_cursor(),
            'J' => {
                if first == 2 {
                    for r in 0..self.height as usize {
                        self.screen[r] = self.blank_row();
                    }
                } else {
                    self.clear_line_from_cursor();
                    for r in self.row + 1..self.height as usize {
                        self.screen[r] = self.blank_row();
                    }
                }
            }
            'S' => self.scroll(first.max(1)),
            // colors and cursor visibility do not change the screen text
            _ => {}
        }
    }
}

impl Terminal for MockTerminal {
    fn read(&mut self, _timeout: Option<Duration>) -> io::Result<Option<TerminalEvent>> {
        let event = self.input.pop_front();
        if let Some(TerminalEvent::Resize(w, h)) = event {
            self.width = w.max(1);
            self.height = h.max(1);
            let blank = self.blank_row();
            for row in &mut self.screen {
                row.resize(w.max(1) as usize, String::new());
            }
            self.screen.resize(self.height as usize, blank);
            self.row = self.row.min(self.height as usize - 1);
        }
        Ok(event)
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.output.push_str(s);
        let mut rest = s;
        while !rest.is_empty() {
            if let Some(seq) = rest.strip_prefix("\x1b[") {
                let end = seq
                    .find(|c: char| c.is_ascii_alphabetic())
                    .unwrap_or(seq.len().saturating_sub(1));
                let fin = seq[end..].chars().next().unwrap_or('m');
                self.csi(&seq[..end], fin);
                rest = &seq[(end + fin.len_utf8()).min(seq.len())..];
                continue;
            }
            let g = rest.graphemes(true).next().unwrap_or(rest);
            match g {
                "\r" => self.col = 0,
                "\n" => self.line_feed(),
                "\r\n" => {
                    self.col = 0;
                    self.line_feed();
                }
                "\x07" => self.bells += 1,
                g => self.print(g),
            }
            rest = &rest[g.len()..];
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        Ok(self.cursor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_crossterm_keys() {
        let ev = event::KeyEvent::new(event::KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(convert_key(ev), Some(KeyPress::char('a').ctrl()));

        let ev = event::KeyEvent::new(event::KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(convert_key(ev), Some(KeyPress::char('A')));

        let ev = event::KeyEvent::new(event::KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(convert_key(ev), Some(KeyPress::new(KeyCode::Tab).shift()));

        let ev = event::KeyEvent::new(event::KeyCode::CapsLock, KeyModifiers::NONE);
        assert_eq!(convert_key(ev), None);
    }

    #[test]
    fn test_mock_prints_and_moves() {
        let mut t = MockTerminal::new(10, 3);
        t.write_str("> ls\x1b[1;3H\x1b[K").unwrap();
        assert_eq!(t.screen_lines()[0], "> ");
        assert_eq!(t.cursor(), (2, 0));
        t.write_str("\x1b[31;49mecho\x1b[0m\r\n").unwrap();
        assert_eq!(t.screen_lines()[0], "> echo");
        assert_eq!(t.cursor(), (0, 1));
    }

    #[test]
    fn test_mock_wraps_and_scrolls() {
        let mut t = MockTerminal::new(4, 2);
        t.write_str("abcdefghij").unwrap();
        assert_eq!(t.screen_lines(), vec!["efgh", "ij"]);
        t.write_str("\x1b[1S").unwrap();
        assert_eq!(t.screen_lines(), vec!["ij", ""]);
    }

    #[test]
    fn test_mock_wide_chars_and_bell() {
        let mut t = MockTerminal::new(6, 2);
        t.write_str("a漢b\x07").unwrap();
        assert_eq!(t.screen_lines()[0], "a漢b");
        assert_eq!(t.cursor(), (4, 0));
        assert_eq!(t.bells(), 1);
    }

    #[test]
    fn test_mock_input_queue() {
        let mut t = MockTerminal::new(10, 2);
        t.push_str("a\n");
        t.push_bytes(b"\x1b");
        t.push_resize(20, 4);
        assert_eq!(
            t.read(None).unwrap(),
            Some(TerminalEvent::Input(RawInput::Key(KeyPress::char('a'))))
        );
        assert_eq!(
            t.read(None).unwrap(),
            Some(TerminalEvent::Input(RawInput::Key(KeyPress::new(KeyCode::Enter))))
        );
        assert_eq!(
            t.read(None).unwrap(),
            Some(TerminalEvent::Input(RawInput::Byte(0x1b)))
        );
        assert_eq!(t.read(None).unwrap(), Some(TerminalEvent::Resize(20, 4)));
        assert_eq!(t.size().unwrap(), (20, 4));
        assert_eq!(t.read(None).unwrap(), None);
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clip = MemoryClipboard::default();
        assert_eq!(clip.get_text(), None);
        clip.set_text("copied");
        assert_eq!(clip.get_text().as_deref(), Some("copied"));
    }
}
