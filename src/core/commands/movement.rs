/// Cursor movement commands
use crate::core::command::{Command, repeat_count};
use crate::core::commands::completion::{accept_next_suggestion_word, accept_suggestion};
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;
use crate::core::vi::motion;

fn step_back(editor: &mut LineEditor<'_>, count: usize) {
    let pos = editor.buffer.cursor().saturating_sub(count);
    editor.move_cursor(pos);
}

fn step_forward(editor: &mut LineEditor<'_>, count: usize) {
    let pos = editor.buffer.cursor().saturating_add(count);
    editor.move_cursor(pos);
}

/// Move cursor backward by character(s)
#[derive(Clone)]
pub struct BackwardChar;

impl Command for BackwardChar {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, false) => step_back(editor, n),
            (n, true) => step_forward(editor, n),
        }
        DispatchResult::Success
    }
}

/// Move cursor forward by character(s); at the end of the input this takes
/// the inline suggestion
#[derive(Clone)]
pub struct ForwardChar;

impl Command for ForwardChar {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, true) => step_back(editor, n),
            (n, false) => {
                if editor.buffer.cursor() == editor.buffer.len() && accept_suggestion(editor) {
                    return DispatchResult::Success;
                }
                step_forward(editor, n);
            }
        }
        DispatchResult::Success
    }
}

#[derive(Clone)]
pub struct BeginningOfLine;

impl Command for BeginningOfLine {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        let start = editor.buffer.line_range_at(cursor).start;
        // a second press from the start of a later line goes to the top
        let target = if cursor == start { 0 } else { start };
        editor.move_cursor(target);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct EndOfLine;

impl Command for EndOfLine {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        let end = editor.buffer.line_range_at(cursor).end;
        let target = if cursor == end { editor.buffer.len() } else { end };
        editor.move_cursor(target);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

fn word_back(editor: &mut LineEditor<'_>, count: usize) {
    let chars = editor.chars();
    let delimiters = &editor.session.options.word_delimiters;
    let mut pos = editor.buffer.cursor();
    for _ in 0..count {
        pos = delimiters.backward_word_start(&chars, pos);
    }
    editor.move_cursor(pos);
}

/// Move to the start of the previous word
#[derive(Clone)]
pub struct BackwardWord;

impl Command for BackwardWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, false) => word_back(editor, n),
            (n, true) => word_forward(editor, n, false),
        }
        DispatchResult::Success
    }
}

/// `end_of_word` picks the Emacs flavour (stop after the word) over the Cmd
/// one (stop at the start of the next word)
fn word_forward(editor: &mut LineEditor<'_>, count: usize, end_of_word: bool) {
    let chars = editor.chars();
    let delimiters = &editor.session.options.word_delimiters;
    let mut pos = editor.buffer.cursor();
    for _ in 0..count {
        pos = if end_of_word {
            delimiters.forward_word_end(&chars, pos)
        } else {
            delimiters.next_word_start(&chars, pos)
        };
    }
    editor.move_cursor(pos);
}

/// Move past the end of the next word (Emacs)
#[derive(Clone)]
pub struct ForwardWord;

impl Command for ForwardWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, true) => word_back(editor, n),
            (n, false) => {
                if editor.buffer.cursor() == editor.buffer.len() && accept_next_suggestion_word(editor, n) {
                    return DispatchResult::Success;
                }
                word_forward(editor, n, true);
            }
        }
        DispatchResult::Success
    }
}

/// Move to the start of the next word (Cmd)
#[derive(Clone)]
pub struct NextWord;

impl Command for NextWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, true) => word_back(editor, n),
            (n, false) => {
                if editor.buffer.cursor() == editor.buffer.len() && accept_next_suggestion_word(editor, n) {
                    return DispatchResult::Success;
                }
                word_forward(editor, n, false);
            }
        }
        DispatchResult::Success
    }
}

/// Move `count` logical lines up or down, keeping the column where the
/// target line is long enough
pub(crate) fn move_lines(editor: &mut LineEditor<'_>, count: usize, up: bool) -> bool {
    let cursor = editor.buffer.cursor();
    let line = editor.buffer.line_of(cursor);
    let target = if up {
        match line.checked_sub(count) {
            Some(t) => t,
            None => return false,
        }
    } else {
        let t = line + count;
        if t >= editor.buffer.line_count() {
            return false;
        }
        t
    };
    let column = editor.buffer.column_of(cursor);
    let start = editor.buffer.line_start(target);
    let end = editor.buffer.line_end(target);
    editor.move_cursor((start + column).min(end));
    true
}

#[derive(Clone)]
pub struct PreviousLine;

impl Command for PreviousLine {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, reverse) = repeat_count(arg);
        if move_lines(editor, n, !reverse) {
            DispatchResult::Success
        } else {
            DispatchResult::Alert
        }
    }
}

#[derive(Clone)]
pub struct NextLine;

impl Command for NextLine {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, reverse) = repeat_count(arg);
        if move_lines(editor, n, reverse) {
            DispatchResult::Success
        } else {
            DispatchResult::Alert
        }
    }
}

/// Jump to the bracket matching the one under (or after) the cursor
#[derive(Clone)]
pub struct GotoBrace;

impl Command for GotoBrace {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let chars = editor.chars();
        match motion::match_bracket(&chars, editor.buffer.cursor()) {
            Some(pos) => {
                editor.move_cursor(pos);
                DispatchResult::Success
            }
            None => DispatchResult::Alert,
        }
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}
