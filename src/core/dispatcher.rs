use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::core::editor::LineEditor;
use crate::core::input::{KeyChord, KeyCode, KeyPress};
use crate::core::keymap::{KeyTrie, LookupResult};

/// Command name of the numeric-argument prefix
pub const DIGIT_ARGUMENT: &str = "digit-argument";

/// Kills that merge with a directly preceding kill
const KILL_COMMANDS: &[&str] = &[
    "kill-line",
    "backward-kill-line",
    "kill-word",
    "backward-kill-word",
    "unix-word-rubout",
    "kill-region",
];

/// Result of command dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// Command executed successfully
    Success,
    /// Command not found/handled
    NotHandled,
    /// Nothing to act on; state is unchanged and the bell should ring
    Alert,
    /// Finish the read-line call with the buffer text
    Accept,
    /// Finish the read-line call discarding the input
    Cancel,
    /// End of input on an empty line
    Eof,
    /// Force full display redraw
    Redraw,
}

/// Maximum recursion depth to prevent stack overflow from commands that
/// dispatch other commands
const MAX_DISPATCH_DEPTH: usize = 64;

/// Run the command registered as `command_name`.
///
/// Looks the command up in the session registry, executes it, and keeps the
/// cross-command state honest: a kill only merges with the kill right
/// before it, yank-pop only follows a yank, and typed characters after a
/// command start a fresh undo frame.
///
/// # Parameters
/// - `editor`: the live read-line state
/// - `command_name`: registered command name
/// - `arg`: numeric argument, `None` when none was typed
pub fn dispatch(editor: &mut LineEditor<'_>, command_name: &str, arg: Option<i32>) -> DispatchResult {
    if editor.dispatch_depth > MAX_DISPATCH_DEPTH {
        warn!(command = command_name, "command recursion limit exceeded");
        return DispatchResult::Alert;
    }
    editor.dispatch_depth += 1;

    let result = dispatch_inner(editor, command_name, arg);

    editor.dispatch_depth -= 1;
    result
}

fn dispatch_inner(editor: &mut LineEditor<'_>, command_name: &str, arg: Option<i32>) -> DispatchResult {
    let Some(command) = editor.session.commands.get(command_name).map(|c| c.clone_box()) else {
        warn!(command = command_name, "command not found in registry");
        return DispatchResult::NotHandled;
    };

    trace!(command = command_name, ?arg, "dispatch");
    editor.undo.break_sequence();
    let arg = if command.accepts_arg() { arg } else { None };
    let result = command.execute(editor, arg);

    if !KILL_COMMANDS.contains(&command_name) {
        editor.session.kill_ring.end_kill_sequence();
    }
    editor.after_command(command_name);
    result
}

/// Outcome of feeding one key to the [`ChordDispatcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordStep {
    /// A longer chord or numeric argument is being typed
    Pending,
    Execute(String),
    /// Unbound printable key in a table that inserts text
    SelfInsert(char),
    /// Nothing is bound to this sequence; it has been discarded
    Unbound(KeyChord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NumericArg {
    digits: Option<i32>,
    negative: bool,
}

impl NumericArg {
    fn value(&self) -> i32 {
        let magnitude = self.digits.unwrap_or(1);
        if self.negative { -magnitude } else { magnitude }
    }
}

/// Turns single key presses into bound commands.
///
/// Walks a [`KeyTrie`] one key at a time. A sequence that is a prefix of
/// longer bindings waits for more keys, up to `max_chord_length`. When a
/// prefix that is itself bound hits a dead end, its command fires and the
/// extra key is queued for replay.
#[derive(Debug, Clone)]
pub struct ChordDispatcher {
    pending: KeyChord,
    replay: VecDeque<KeyPress>,
    max_chord_length: usize,
    arg: Option<NumericArg>,
}

impl Default for ChordDispatcher {
    fn default() -> Self {
        Self::new(4)
    }
}

impl ChordDispatcher {
    pub fn new(max_chord_length: usize) -> Self {
        Self {
            pending: Vec::new(),
            replay: VecDeque::new(),
            max_chord_length: max_chord_length.max(1),
            arg: None,
        }
    }

    /// Feed one key looked up in `table`
    pub fn feed(&mut self, table: &KeyTrie, key: KeyPress, self_insert: bool) -> ChordStep {
        // plain digits continue a numeric argument
        if self.pending.is_empty() && self.arg.is_some() {
            if let Some(d) = key.printable().filter(char::is_ascii_digit) {
                self.push_digit(d);
                return ChordStep::Pending;
            }
        }

        self.pending.push(key);
        let step = match table.lookup(&self.pending) {
            LookupResult::Command(name) => ChordStep::Execute(name.to_string()),
            LookupResult::Prefix { .. } if self.pending.len() < self.max_chord_length => {
                return ChordStep::Pending;
            }
            LookupResult::Prefix { command: Some(name) } => ChordStep::Execute(name.to_string()),
            LookupResult::Prefix { command: None } => ChordStep::Unbound(self.pending.clone()),
            LookupResult::DeadEnd if self.pending.len() == 1 => match key.printable() {
                Some(c) if self_insert => ChordStep::SelfInsert(c),
                _ => ChordStep::Unbound(vec![key]),
            },
            LookupResult::DeadEnd => {
                let prefix = &self.pending[..self.pending.len() - 1];
                match table.lookup(prefix) {
                    LookupResult::Prefix { command: Some(name) } => {
                        self.replay.push_back(key);
                        ChordStep::Execute(name.to_string())
                    }
                    _ => ChordStep::Unbound(self.pending.clone()),
                }
            }
        };
        self.pending.clear();
        if let ChordStep::Unbound(chord) = &step {
            trace!(chord = %crate::core::input::format_chord(chord), "unbound");
        }
        step
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply a `digit-argument` key: a digit extends the argument, `-`
    /// flips its sign
    pub fn digit_argument(&mut self, key: KeyPress) -> bool {
        match key.code {
            KeyCode::Char('-') => {
                let arg = self.arg.get_or_insert_with(NumericArg::default);
                arg.negative = !arg.negative;
                true
            }
            KeyCode::Char(d) if d.is_ascii_digit() => {
                self.push_digit(d);
                true
            }
            _ => false,
        }
    }

    fn push_digit(&mut self, d: char) {
        let arg = self.arg.get_or_insert_with(NumericArg::default);
        let digit = d.to_digit(10).unwrap_or(0) as i32;
        let current = arg.digits.unwrap_or(0);
        // saturate instead of overflowing on absurd arguments
        arg.digits = Some(current.saturating_mul(10).saturating_add(digit).min(1_000_000));
    }

    pub fn has_arg(&self) -> bool {
        self.arg.is_some()
    }

    /// The argument for the next command, clearing it
    pub fn take_arg(&mut self) -> Option<i32> {
        self.arg.take().map(|a| a.value())
    }

    /// Text shown while an argument is being typed
    pub fn arg_status(&self) -> Option<String> {
        self.arg.as_ref().map(|a| match a.digits {
            Some(_) => format!("(arg: {})", a.value()),
            None if a.negative => "(arg: -)".to_string(),
            None => "(arg: 1)".to_string(),
        })
    }

    /// Queue keys to be handled before any new input, in order
    pub fn replay_front(&mut self, keys: impl IntoIterator<Item = KeyPress>) {
        let keys: Vec<_> = keys.into_iter().collect();
        for key in keys.into_iter().rev() {
            self.replay.push_front(key);
        }
    }

    pub fn next_replay(&mut self) -> Option<KeyPress> {
        self.replay.pop_front()
    }

    /// Forget any partial chord, argument and queued keys
    pub fn reset(&mut self) {
        self.pending.clear();
        self.replay.clear();
        self.arg = None;
    }

    pub fn set_max_chord_length(&mut self, max_chord_length: usize) {
        self.max_chord_length = max_chord_length.max(1);
    }
}
