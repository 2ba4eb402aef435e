/// Basic editing commands
use crate::core::command::{Command, repeat_count};
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;

/// Delete the selection, if there is one
fn delete_selection(editor: &mut LineEditor<'_>) -> bool {
    match editor.buffer.selection_range() {
        Some(range) => {
            editor.delete_span(range);
            true
        }
        None => false,
    }
}

fn delete_before(editor: &mut LineEditor<'_>, count: usize) -> DispatchResult {
    let cursor = editor.buffer.cursor();
    if cursor == 0 {
        return DispatchResult::Alert;
    }
    editor.delete_span(cursor.saturating_sub(count)..cursor);
    DispatchResult::Success
}

fn delete_after(editor: &mut LineEditor<'_>, count: usize) -> DispatchResult {
    let cursor = editor.buffer.cursor();
    let len = editor.buffer.len();
    if cursor >= len {
        return DispatchResult::Alert;
    }
    editor.delete_span(cursor..(cursor + count).min(len));
    DispatchResult::Success
}

#[derive(Clone)]
pub struct BackwardDeleteChar;

impl Command for BackwardDeleteChar {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        if delete_selection(editor) {
            return DispatchResult::Success;
        }
        match repeat_count(arg) {
            (n, false) => delete_before(editor, n),
            (n, true) => delete_after(editor, n),
        }
    }
}

#[derive(Clone)]
pub struct DeleteChar;

impl Command for DeleteChar {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        if delete_selection(editor) {
            return DispatchResult::Success;
        }
        match repeat_count(arg) {
            (n, false) => delete_after(editor, n),
            (n, true) => delete_before(editor, n),
        }
    }
}

/// End of input on an empty line, delete-char otherwise
#[derive(Clone)]
pub struct DeleteCharOrExit;

impl Command for DeleteCharOrExit {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        if editor.buffer.is_empty() {
            return DispatchResult::Eof;
        }
        DeleteChar.execute(editor, arg)
    }
}

/// Insert a newline without accepting
#[derive(Clone)]
pub struct AddLine;

impl Command for AddLine {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, _) = repeat_count(arg);
        editor.insert_str(&"\n".repeat(n));
        DispatchResult::Success
    }
}

/// Swap the chars around the cursor; at the end of the line, the last two
#[derive(Clone)]
pub struct TransposeChars;

impl Command for TransposeChars {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        let line = editor.buffer.line_range_at(cursor);
        if line.end - line.start < 2 || cursor == line.start {
            return DispatchResult::Alert;
        }
        let at = if cursor >= line.end { line.end - 1 } else { cursor };
        let pair = editor.buffer.slice(at - 1..at + 1);
        let swapped: String = pair.chars().rev().collect();
        editor.replace_span(at - 1..at + 1, &swapped);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy)]
enum CaseChange {
    Upper,
    Lower,
    Capitalize,
}

fn change_case(editor: &mut LineEditor<'_>, count: usize, change: CaseChange) -> DispatchResult {
    let chars = editor.chars();
    let start = editor.buffer.cursor();
    let delimiters = &editor.session.options.word_delimiters;
    let mut end = start;
    for _ in 0..count {
        end = delimiters.forward_word_end(&chars, end);
    }
    if end == start {
        return DispatchResult::Alert;
    }
    let mut result = String::new();
    let mut at_word_start = true;
    for &c in &chars[start..end] {
        let word_char = delimiters.is_word_char(c);
        match change {
            CaseChange::Upper => result.extend(c.to_uppercase()),
            CaseChange::Lower => result.extend(c.to_lowercase()),
            CaseChange::Capitalize if word_char && at_word_start => result.extend(c.to_uppercase()),
            CaseChange::Capitalize => result.extend(c.to_lowercase()),
        }
        at_word_start = !word_char;
    }
    editor.replace_span(start..end, &result);
    // case mapping can change the char count; land after the rewritten text
    editor.buffer.set_cursor(start + result.chars().count());
    DispatchResult::Success
}

#[derive(Clone)]
pub struct UpcaseWord;

impl Command for UpcaseWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        change_case(editor, repeat_count(arg).0, CaseChange::Upper)
    }
}

#[derive(Clone)]
pub struct DowncaseWord;

impl Command for DowncaseWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        change_case(editor, repeat_count(arg).0, CaseChange::Lower)
    }
}

#[derive(Clone)]
pub struct CapitalizeWord;

impl Command for CapitalizeWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        change_case(editor, repeat_count(arg).0, CaseChange::Capitalize)
    }
}

/// Undo every edit of this read-line call
#[derive(Clone)]
pub struct RevertLine;

impl Command for RevertLine {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        if !editor.undo.can_undo() {
            if !editor.buffer.is_empty() {
                editor.set_buffer_text("", 0);
            }
            return DispatchResult::Success;
        }
        while editor.undo.can_undo() {
            editor.undo_once();
        }
        editor.buffer.clear_selection();
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct Undo;

impl Command for Undo {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, reverse) = repeat_count(arg);
        let mut result = DispatchResult::Success;
        for _ in 0..n {
            result = if reverse { editor.redo_once() } else { editor.undo_once() };
            if result != DispatchResult::Success {
                break;
            }
        }
        result
    }
}

#[derive(Clone)]
pub struct Redo;

impl Command for Redo {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, reverse) = repeat_count(arg);
        let mut result = DispatchResult::Success;
        for _ in 0..n {
            result = if reverse { editor.undo_once() } else { editor.redo_once() };
            if result != DispatchResult::Success {
                break;
            }
        }
        result
    }
}
