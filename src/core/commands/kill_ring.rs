/// Kill ring and yank commands
use crate::core::command::{Command, repeat_count};
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;
use crate::core::kill_ring::KillDirection;
use crate::core::words::unix_word_start;

fn kill(editor: &mut LineEditor<'_>, start: usize, end: usize, direction: KillDirection) -> DispatchResult {
    if editor.kill_span(start..end, direction) {
        DispatchResult::Success
    } else {
        DispatchResult::Alert
    }
}

/// Kill from the cursor to the end of the line; at the end of a line, the
/// newline
#[derive(Clone)]
pub struct KillLine;

impl Command for KillLine {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        let mut end = editor.buffer.line_range_at(cursor).end;
        if end == cursor && end < editor.buffer.len() {
            end += 1;
        }
        kill(editor, cursor, end, KillDirection::Forward)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct BackwardKillLine;

impl Command for BackwardKillLine {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        let start = editor.buffer.line_range_at(cursor).start;
        kill(editor, start, cursor, KillDirection::Backward)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

fn kill_word_forward(editor: &mut LineEditor<'_>, count: usize) -> DispatchResult {
    let chars = editor.chars();
    let cursor = editor.buffer.cursor();
    let delimiters = &editor.session.options.word_delimiters;
    let mut end = cursor;
    for _ in 0..count {
        end = delimiters.forward_word_end(&chars, end);
    }
    kill(editor, cursor, end, KillDirection::Forward)
}

fn kill_word_backward(editor: &mut LineEditor<'_>, count: usize) -> DispatchResult {
    let chars = editor.chars();
    let cursor = editor.buffer.cursor();
    let delimiters = &editor.session.options.word_delimiters;
    let mut start = cursor;
    for _ in 0..count {
        start = delimiters.backward_word_start(&chars, start);
    }
    kill(editor, start, cursor, KillDirection::Backward)
}

#[derive(Clone)]
pub struct KillWord;

impl Command for KillWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, false) => kill_word_forward(editor, n),
            (n, true) => kill_word_backward(editor, n),
        }
    }
}

#[derive(Clone)]
pub struct BackwardKillWord;

impl Command for BackwardKillWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, false) => kill_word_backward(editor, n),
            (n, true) => kill_word_forward(editor, n),
        }
    }
}

/// Kill the whitespace-delimited word before the cursor
#[derive(Clone)]
pub struct UnixWordRubout;

impl Command for UnixWordRubout {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let chars = editor.chars();
        let cursor = editor.buffer.cursor();
        let mut start = cursor;
        for _ in 0..repeat_count(arg).0 {
            start = unix_word_start(&chars, start);
        }
        kill(editor, start, cursor, KillDirection::Backward)
    }
}

/// Kill between the mark and the cursor (or the selection)
#[derive(Clone)]
pub struct KillRegion;

impl Command for KillRegion {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        let region = editor.buffer.selection_range().or_else(|| {
            editor
                .buffer
                .mark()
                .map(|mark| mark.min(cursor)..mark.max(cursor))
        });
        let Some(region) = region else {
            return DispatchResult::Alert;
        };
        let direction = if cursor <= region.start {
            KillDirection::Forward
        } else {
            KillDirection::Backward
        };
        editor.buffer.clear_selection();
        kill(editor, region.start, region.end, direction)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Insert the newest kill
#[derive(Clone)]
pub struct Yank;

impl Command for Yank {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let Some(text) = editor.session.kill_ring.yank().map(str::to_string) else {
            return DispatchResult::Alert;
        };
        let mut editor = editor.suppress_suggestions();
        if let Some(selected) = editor.buffer.selection_range() {
            editor.delete_span(selected.clone());
            editor.buffer.set_cursor(selected.start);
        }
        let start = editor.buffer.cursor();
        editor.insert_str(&text);
        editor.last_yank = Some(start..start + text.chars().count());
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Right after a yank, swap the yanked text for the next older kill
#[derive(Clone)]
pub struct YankPop;

impl Command for YankPop {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let Some(span) = editor.last_yank.clone() else {
            return DispatchResult::Alert;
        };
        let Some(text) = editor.session.kill_ring.yank_pop().map(str::to_string) else {
            return DispatchResult::Alert;
        };
        let mut editor = editor.suppress_suggestions();
        editor.replace_span(span.clone(), &text);
        editor.last_yank = Some(span.start..span.start + text.chars().count());
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct SetMark;

impl Command for SetMark {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let cursor = editor.buffer.cursor();
        editor.buffer.set_mark(Some(cursor));
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct ExchangePointAndMark;

impl Command for ExchangePointAndMark {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let Some(mark) = editor.buffer.mark() else {
            return DispatchResult::Alert;
        };
        let cursor = editor.buffer.cursor();
        editor.buffer.set_mark(Some(cursor));
        editor.move_cursor(mark);
        DispatchResult::Success
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
            edit_mode: EditMode::Emacs,
            ..Options::default()
        })
    }

    #[test]
    fn test_consecutive_kills_merge() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("one two three");
        dispatch(&mut ed, "backward-kill-word", None);
        dispatch(&mut ed, "backward-kill-word", None);
        assert_eq!(ed.get_buffer_state().0, "one ");
        dispatch(&mut ed, "yank", None);
        assert_eq!(ed.get_buffer_state().0, "one two three");
    }

    #[test]
    fn test_yank_pop_cycles() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("alpha beta");
        dispatch(&mut ed, "backward-kill-word", None);
        dispatch(&mut ed, "backward-char", None);
        dispatch(&mut ed, "backward-kill-word", None);
        assert_eq!(ed.get_buffer_state().0, " ");
        dispatch(&mut ed, "yank", None);
        assert_eq!(ed.get_buffer_state().0, "alpha ");
        dispatch(&mut ed, "yank-pop", None);
        assert_eq!(ed.get_buffer_state(), ("beta ".to_string(), 4));
        dispatch(&mut ed, "backward-char", None);
        assert_eq!(dispatch(&mut ed, "yank-pop", None), DispatchResult::Alert);
    }

    #[test]
    fn test_kill_line_takes_newline_at_line_end() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("ab\ncd");
        ed.set_cursor_position(1);
        dispatch(&mut ed, "kill-line", None);
        assert_eq!(ed.get_buffer_state().0, "a\ncd");
        dispatch(&mut ed, "kill-line", None);
        assert_eq!(ed.get_buffer_state().0, "acd");
        dispatch(&mut ed, "yank", None);
        assert_eq!(ed.get_buffer_state().0, "ab\ncd");
    }

    #[test]
    fn test_region_and_mark() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("hello world");
        assert_eq!(dispatch(&mut ed, "kill-region", None), DispatchResult::Alert);
        ed.set_cursor_position(5);
        dispatch(&mut ed, "set-mark", None);
        dispatch(&mut ed, "end-of-line", None);
        dispatch(&mut ed, "exchange-point-and-mark", None);
        assert_eq!(ed.get_buffer_state().1, 5);
        dispatch(&mut ed, "kill-region", None);
        assert_eq!(ed.get_buffer_state(), ("hello".to_string(), 5));
    }

    #[test]
    fn test_unix_word_rubout_spans_delimiters() {
        let mut s = session();
        let mut ed = s.editor("");
        ed.insert("cd /usr/local/bin");
        dispatch(&mut ed, "unix-word-rubout", None);
        assert_eq!(ed.get_buffer_state().0, "cd ");
        assert_eq!(dispatch(&mut ed, "yank", None), DispatchResult::Success);
        assert_eq!(ed.get_buffer_state().0, "cd /usr/local/bin");
    }
}
