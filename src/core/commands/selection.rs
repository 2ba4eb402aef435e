/// Selection and clipboard commands (Cmd mode)
use crate::core::command::{Command, repeat_count};
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;

fn select_to(editor: &mut LineEditor<'_>, pos: usize) -> DispatchResult {
    editor.buffer.select_to(pos);
    DispatchResult::Success
}

#[derive(Clone)]
pub struct SelectBackwardChar;

impl Command for SelectBackwardChar {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        match repeat_count(arg) {
            (n, false) => select_to(editor, cursor.saturating_sub(n)),
            (n, true) => select_to(editor, cursor + n),
        }
    }
}

#[derive(Clone)]
pub struct SelectForwardChar;

impl Command for SelectForwardChar {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        match repeat_count(arg) {
            (n, false) => select_to(editor, cursor + n),
            (n, true) => select_to(editor, cursor.saturating_sub(n)),
        }
    }
}

#[derive(Clone)]
pub struct SelectBackwardWord;

impl Command for SelectBackwardWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let chars = editor.chars();
        let delimiters = &editor.session.options.word_delimiters;
        let mut pos = editor.buffer.cursor();
        for _ in 0..repeat_count(arg).0 {
            pos = delimiters.backward_word_start(&chars, pos);
        }
        select_to(editor, pos)
    }
}

#[derive(Clone)]
pub struct SelectNextWord;

impl Command for SelectNextWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let chars = editor.chars();
        let delimiters = &editor.session.options.word_delimiters;
        let mut pos = editor.buffer.cursor();
        for _ in 0..repeat_count(arg).0 {
            pos = delimiters.next_word_start(&chars, pos);
        }
        select_to(editor, pos)
    }
}

#[derive(Clone)]
pub struct SelectLineStart;

impl Command for SelectLineStart {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let start = editor.buffer.line_range_at(editor.buffer.cursor()).start;
        select_to(editor, start)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct SelectLineEnd;

impl Command for SelectLineEnd {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let end = editor.buffer.line_range_at(editor.buffer.cursor()).end;
        select_to(editor, end)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct SelectAll;

impl Command for SelectAll {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let len = editor.buffer.len();
        editor.buffer.set_selection(0, len as isize);
        editor.buffer.set_cursor(len);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Copy the selection, or the whole input when nothing is selected
#[derive(Clone)]
pub struct CopySelection;

impl Command for CopySelection {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let text = match editor.buffer.selection_range() {
            Some(range) => editor.buffer.slice(range),
            None => editor.buffer.text(),
        };
        editor.session.clipboard.set_text(&text);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct Cut;

impl Command for Cut {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let Some(range) = editor.buffer.selection_range() else {
            return DispatchResult::Alert;
        };
        let text = editor.delete_span(range);
        editor.session.clipboard.set_text(&text);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Insert the clipboard text, replacing the selection
#[derive(Clone)]
pub struct Paste;

impl Command for Paste {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let Some(text) = editor.session.clipboard.get_text().filter(|t| !t.is_empty()) else {
            return DispatchResult::Alert;
        };
        let mut editor = editor.suppress_suggestions();
        match editor.buffer.selection_range() {
            Some(range) => editor.replace_span(range, &text),
            None => editor.insert_str(&text),
        }
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Copy when something is selected, cancel the line otherwise
#[derive(Clone)]
pub struct CopyOrCancelLine;

impl Command for CopyOrCancelLine {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        if editor.buffer.selection_range().is_some() {
            CopySelection.execute(editor, arg)
        } else {
            DispatchResult::Cancel
        }
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EditMode, Options};
    use crate::core::dispatcher::{DispatchResult, dispatch};
    use crate::core::session::EditorSession;

    fn session() -> EditorSession {
        EditorSession::new(Options {
            edit_mode: EditMode::Cmd,
            ..Options::default()
        })
    }

    #[test]
    fn test_select_then_move_clears() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("abcdef");
        dispatch(&mut ed, "select-backward-char", Some(2));
        assert_eq!(ed.get_selection_state(), (4, 2));
        dispatch(&mut ed, "select-line-start", None);
        assert_eq!(ed.get_selection_state(), (0, 6));
        dispatch(&mut ed, "forward-char", None);
        assert_eq!(ed.get_selection_state(), (-1, -1));
    }

    #[test]
    fn test_cut_and_paste() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("hello world");
        dispatch(&mut ed, "select-backward-word", None);
        assert_eq!(dispatch(&mut ed, "cut", None), DispatchResult::Success);
        assert_eq!(ed.get_buffer_state().0, "hello ");
        assert_eq!(dispatch(&mut ed, "cut", None), DispatchResult::Alert);
        dispatch(&mut ed, "beginning-of-line", None);
        dispatch(&mut ed, "paste", None);
        assert_eq!(ed.get_buffer_state(), ("worldhello ".to_string(), 5));
    }

    #[test]
    fn test_select_all_and_paste_over() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("abc");
        dispatch(&mut ed, "copy", None);
        dispatch(&mut ed, "select-all", None);
        assert_eq!(ed.get_selection_state(), (0, 3));
        ed.self_insert('x', 1);
        assert_eq!(ed.get_buffer_state().0, "x");
        dispatch(&mut ed, "select-all", None);
        dispatch(&mut ed, "paste", None);
        assert_eq!(ed.get_buffer_state(), ("abc".to_string(), 3));
    }

    #[test]
    fn test_copy_or_cancel() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("abc");
        dispatch(&mut ed, "select-backward-char", None);
        assert_eq!(dispatch(&mut ed, "copy-or-cancel-line", None), DispatchResult::Success);
        assert_eq!(ed.session.clipboard.get_text().as_deref(), Some("c"));
        dispatch(&mut ed, "end-of-line", None);
        assert_eq!(dispatch(&mut ed, "copy-or-cancel-line", None), DispatchResult::Cancel);
    }
}
