//! The editing session
//!
//! An [`EditorSession`] holds what outlives a single read-line call: the
//! options, history, kill ring, key tables, command registry and the host's
//! collaborators (colorizer, completer, clipboard, history file). Each call
//! builds a [`LineEditor`] that borrows it.

use std::cell::Cell;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{BellStyle, Config, EditMode, Options};
use crate::core::colorizer::Colorizer;
use crate::core::command::{Command, CommandRegistry};
use crate::core::completion::CompletionProvider;
use crate::core::decoder::KeyDecoder;
use crate::core::editor::{LineEditor, ReadLineOutcome};
use crate::core::history::History;
use crate::core::history_file::HistoryFile;
use crate::core::keymap::{KeyTableId, Keymaps};
use crate::core::kill_ring::KillRing;
use crate::error::{EditError, Result};
use crate::terminal::color::Palette;
use crate::terminal::render::Renderer;
use crate::terminal::transport::{Clipboard, MemoryClipboard, Terminal, TerminalEvent};

/// Session state shared by every read-line call
pub struct SessionCore {
    pub(crate) options: Options,
    pub(crate) history: History,
    pub(crate) kill_ring: KillRing,
    pub(crate) keymaps: Keymaps,
    pub(crate) commands: CommandRegistry,
    pub(crate) palette: Palette,
    pub(crate) colorizer: Option<Box<dyn Colorizer>>,
    pub(crate) completer: Option<Box<dyn CompletionProvider>>,
    pub(crate) clipboard: Box<dyn Clipboard>,
    pub(crate) history_file: Option<HistoryFile>,
    /// Query of the last incremental search, reused by an empty repeat
    pub(crate) last_search_query: Option<String>,
}

thread_local! {
    static READING: Cell<bool> = const { Cell::new(false) };
}

/// Marks a read-line call in progress on this thread
struct ReadingGuard;

impl ReadingGuard {
    fn enter() -> Result<Self> {
        READING.with(|reading| {
            if reading.replace(true) {
                Err(EditError::Busy)
            } else {
                Ok(ReadingGuard)
            }
        })
    }
}

impl Drop for ReadingGuard {
    fn drop(&mut self) {
        READING.with(|reading| reading.set(false));
    }
}

pub struct EditorSession {
    core: SessionCore,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl EditorSession {
    pub fn new(options: Options) -> Self {
        let history = History::new(options.maximum_history_count, options.history_no_duplicates);
        let kill_ring = KillRing::with_size(options.maximum_kill_ring_count);
        Self {
            core: SessionCore {
                options,
                history,
                kill_ring,
                keymaps: Keymaps::default(),
                commands: CommandRegistry::with_builtins(),
                palette: Palette::default(),
                colorizer: None,
                completer: None,
                clipboard: Box::new(MemoryClipboard::default()),
                history_file: None,
                last_search_query: None,
            },
        }
    }

    /// Options from `config.settings`, then every `config.keybindings` entry
    /// bound in the table of the configured mode
    pub fn from_config(config: &Config) -> Result<Self> {
        let options = Options::from_config(config)?;
        let mut session = Self::new(options);
        for (chord, command) in &config.keybindings {
            session.bind_key(chord, command)?;
        }
        Ok(session)
    }

    pub fn options(&self) -> &Options {
        &self.core.options
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.core.options.edit_mode = mode;
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.core.palette = palette;
    }

    pub fn set_colorizer(&mut self, colorizer: Box<dyn Colorizer>) {
        self.core.colorizer = Some(colorizer);
    }

    pub fn set_completer(&mut self, completer: Box<dyn CompletionProvider>) {
        self.core.completer = Some(completer);
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.core.clipboard = clipboard;
    }

    /// Load history from `file` and keep saving to it. Returns the number of
    /// entries loaded.
    pub fn set_history_file(&mut self, file: HistoryFile) -> Result<usize> {
        let loaded = file.load_into(&mut self.core.history)?;
        info!(path = %file.path().display(), loaded, "history file attached");
        self.core.history_file = Some(file);
        Ok(loaded)
    }

    /// Bind `chord` (e.g. `"Ctrl+x,Ctrl+e"`) to a registered command in the
    /// table the current edit mode types into
    pub fn bind_key(&mut self, chord: &str, command: &str) -> Result<()> {
        let table = KeyTableId::for_mode(self.core.options.edit_mode);
        self.bind_key_in(table, chord, command)
    }

    pub fn bind_key_in(&mut self, table: KeyTableId, chord: &str, command: &str) -> Result<()> {
        if !self.core.commands.contains(command) {
            return Err(EditError::UnknownCommand(command.to_string()));
        }
        self.core.keymaps.bind(table, chord, command)?;
        debug!(?table, chord, command, "key bound");
        Ok(())
    }

    /// Add a host command, or replace a built-in one
    pub fn register_command(&mut self, name: &'static str, command: Box<dyn Command>) {
        self.core.commands.register(name, command);
    }

    pub fn history(&self) -> &History {
        &self.core.history
    }

    pub fn add_to_history(&mut self, line: &str) -> bool {
        self.core.history.add(line)
    }

    pub fn clear_history(&mut self) {
        self.core.history.clear();
    }

    pub fn kill_ring(&self) -> &KillRing {
        &self.core.kill_ring
    }

    pub fn clear_kill_ring(&mut self) {
        self.core.kill_ring.clear();
    }

    /// A read-line state driven by hand, key by key
    pub fn editor(&mut self, prompt: &str) -> LineEditor<'_> {
        LineEditor::new(&mut self.core, prompt)
    }

    /// Read one line from `term`.
    ///
    /// Returns [`EditError::Busy`] when another call is already running on
    /// this thread. The line is added to history when accepted.
    pub fn read_line<T: Terminal>(&mut self, term: &mut T, prompt: &str) -> Result<ReadLineOutcome> {
        let _reading = ReadingGuard::enter()?;
        let (cols, rows) = term.size()?;
        let (_, row) = term.cursor_position()?;
        let mut renderer = Renderer::new(cols, rows, row);
        let mut decoder = KeyDecoder::new(self.core.options.escape_timeout);
        let mut editor = LineEditor::new(&mut self.core, prompt);
        editor.set_width(renderer.width());

        let outcome = loop {
            if let Some(outcome) = drain_keys(&mut decoder, &mut editor) {
                break outcome;
            }

            if std::mem::take(&mut editor.clear_requested) {
                renderer.request_clear();
            }
            let frame = editor.frame(renderer.width());
            term.write_str(&renderer.render(&frame).to_ansi())?;
            if std::mem::take(&mut editor.alert) {
                ring_bell(term, editor.session.options.bell_style)?;
            }
            term.flush()?;

            let timeout = decoder.time_to_expiry(Instant::now());
            match term.read(timeout)? {
                Some(TerminalEvent::Input(unit)) => decoder.process(unit),
                Some(TerminalEvent::Resize(cols, rows)) => {
                    debug!(cols, rows, "terminal resized");
                    renderer.resize(cols, rows);
                    editor.set_width(renderer.width());
                }
                // the escape timeout ran out with nothing new
                None if decoder.has_pending() => decoder.flush_pending(),
                None => {
                    debug!("input closed");
                    break ReadLineOutcome::Eof;
                }
            }
        };

        let frame = editor.final_frame(renderer.width());
        term.write_str(&renderer.render(&frame).to_ansi())?;
        term.write_str(&renderer.finish(&frame).to_ansi())?;
        term.flush()?;
        drop(editor);

        if let ReadLineOutcome::Accepted(line) = &outcome {
            self.line_accepted(line);
        }
        Ok(outcome)
    }

    fn line_accepted(&mut self, line: &str) {
        if !self.core.history.add(line) {
            return;
        }
        if let Some(file) = &self.core.history_file {
            if let Err(e) = file.line_accepted(line) {
                warn!(error = %e, "could not append to history file");
            }
        }
    }

    /// Flush history to the history file, if one is attached
    pub fn end_session(&mut self) -> Result<()> {
        if let Some(file) = &self.core.history_file {
            file.session_ended(&self.core.history)?;
        }
        Ok(())
    }
}

fn drain_keys(decoder: &mut KeyDecoder, editor: &mut LineEditor<'_>) -> Option<ReadLineOutcome> {
    while let Some(key) = decoder.read_key() {
        if let Some(outcome) = editor.process_key(key) {
            return Some(outcome);
        }
    }
    None
}

fn ring_bell<T: Terminal>(term: &mut T, style: BellStyle) -> std::io::Result<()> {
    match style {
        BellStyle::None => Ok(()),
        BellStyle::Audible => term.bell(),
        // reverse video on and off
        BellStyle::Visual => term.write_str("\x1b[?5h\x1b[?5l"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::KeyPress;
    use crate::terminal::transport::MockTerminal;

    #[test]
    fn test_read_line_accepts_and_records_history() {
        let mut session = EditorSession::default();
        let mut term = MockTerminal::new(40, 10);
        term.push_str("ls -l\n");
        let outcome = session.read_line(&mut term, "$ ").unwrap();
        assert_eq!(outcome, ReadLineOutcome::Accepted("ls -l".to_string()));
        assert_eq!(session.history().len(), 1);
        assert_eq!(term.screen_lines()[0], "$ ls -l");
        assert_eq!(term.cursor(), (0, 1));
    }

    #[test]
    fn test_input_closed_is_eof() {
        let mut session = EditorSession::default();
        let mut term = MockTerminal::new(40, 10);
        term.push_str("abc");
        assert_eq!(session.read_line(&mut term, "> ").unwrap(), ReadLineOutcome::Eof);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_alert_rings_bell_per_style() {
        let mut session = EditorSession::default();
        let mut term = MockTerminal::new(40, 10);
        term.push_key(KeyPress::new(crate::core::input::KeyCode::Backspace));
        term.push_str("\n");
        session.read_line(&mut term, "> ").unwrap();
        assert_eq!(term.bells(), 1);

        let mut session = EditorSession::new(Options {
            bell_style: BellStyle::None,
            ..Options::default()
        });
        let mut term = MockTerminal::new(40, 10);
        term.push_key(KeyPress::new(crate::core::input::KeyCode::Backspace));
        term.push_str("\n");
        session.read_line(&mut term, "> ").unwrap();
        assert_eq!(term.bells(), 0);
    }

    #[test]
    fn test_nested_read_line_is_busy() {
        let _outer = ReadingGuard::enter().unwrap();
        let mut session = EditorSession::default();
        let mut term = MockTerminal::new(40, 10);
        term.push_str("x\n");
        assert!(matches!(session.read_line(&mut term, "> "), Err(EditError::Busy)));
    }

    #[test]
    fn test_bind_key_checks_command() {
        let mut session = EditorSession::default();
        assert!(matches!(
            session.bind_key("Ctrl+q", "no-such-command"),
            Err(EditError::UnknownCommand(_))
        ));
        session.bind_key("Ctrl+q", "kill-line").unwrap();
        let mut term = MockTerminal::new(40, 10);
        term.push_str("abc");
        term.push_key(KeyPress::new(crate::core::input::KeyCode::Home));
        term.push_key(KeyPress::char('q').ctrl());
        term.push_str("\n");
        assert_eq!(
            session.read_line(&mut term, "> ").unwrap(),
            ReadLineOutcome::Accepted(String::new())
        );
    }

    #[test]
    fn test_from_config_applies_bindings() {
        let mut config = Config::default();
        config.set("edit_mode", "emacs");
        config.bind("Ctrl+o", "accept-line");
        let mut session = EditorSession::from_config(&config).unwrap();
        assert_eq!(session.options().edit_mode, EditMode::Emacs);
        let mut term = MockTerminal::new(40, 10);
        term.push_str("hi");
        term.push_key(KeyPress::char('o').ctrl());
        assert_eq!(
            session.read_line(&mut term, "> ").unwrap(),
            ReadLineOutcome::Accepted("hi".to_string())
        );

        let mut config = Config::default();
        config.bind("Ctrl+o", "launch-rockets");
        assert!(EditorSession::from_config(&config).is_err());
    }
}
