/// History navigation and search commands
use crate::config::PredictionView;
use crate::core::command::{Command, repeat_count};
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;
use crate::core::history::SearchDirection;

/// Show a recalled line; recalled text does not bring up a suggestion
fn show_recalled(editor: &mut LineEditor<'_>, line: &str) {
    let mut editor = editor.suppress_suggestions();
    editor.set_buffer_text(line, usize::MAX);
}

/// Walk the prediction list instead of history while it is on screen.
/// Returns false when there is no list to walk.
fn step_list(editor: &mut LineEditor<'_>, up: bool) -> bool {
    if editor.session.options.prediction_view != PredictionView::List {
        return false;
    }
    let (entries, input) = editor.list_suggestions();
    if entries.is_empty() {
        return false;
    }
    let last = entries.len() - 1;
    let next = match (editor.prediction.list_selected, up) {
        (None, true) => Some(last),
        (None, false) => Some(0),
        (Some(0), true) => None,
        (Some(i), true) => Some(i - 1),
        (Some(i), false) if i >= last => None,
        (Some(i), false) => Some(i + 1),
    };
    let text = match next {
        Some(i) => entries[i].text.clone(),
        None => input.clone(),
    };
    editor.set_buffer_text(&text, usize::MAX);
    editor.prediction.list_input = Some(input);
    editor.prediction.list_selected = next;
    true
}

fn navigate(editor: &mut LineEditor<'_>, direction: SearchDirection, count: usize) -> DispatchResult {
    let mut recalled = None;
    for _ in 0..count {
        let current = recalled.clone().unwrap_or_else(|| editor.buffer.text());
        match editor.session.history.navigate(direction, &current) {
            Some(line) => recalled = Some(line),
            None => break,
        }
    }
    match recalled {
        Some(line) => {
            show_recalled(editor, &line);
            DispatchResult::Success
        }
        None => DispatchResult::Alert,
    }
}

#[derive(Clone)]
pub struct PreviousHistory;

impl Command for PreviousHistory {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, reverse) = repeat_count(arg);
        if step_list(editor, !reverse) {
            return DispatchResult::Success;
        }
        let direction = if reverse { SearchDirection::Forward } else { SearchDirection::Backward };
        navigate(editor, direction, n)
    }
}

#[derive(Clone)]
pub struct NextHistory;

impl Command for NextHistory {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        let (n, reverse) = repeat_count(arg);
        if step_list(editor, reverse) {
            return DispatchResult::Success;
        }
        let direction = if reverse { SearchDirection::Backward } else { SearchDirection::Forward };
        navigate(editor, direction, n)
    }
}

#[derive(Clone)]
pub struct BeginningOfHistory;

impl Command for BeginningOfHistory {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        if editor.session.history.is_empty() {
            return DispatchResult::Alert;
        }
        let current = editor.buffer.text();
        match editor.session.history.go_to(0, &current) {
            Some(line) => {
                show_recalled(editor, &line);
                DispatchResult::Success
            }
            None => DispatchResult::Alert,
        }
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Back to the line being edited
#[derive(Clone)]
pub struct EndOfHistory;

impl Command for EndOfHistory {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let history = &editor.session.history;
        let end = history.len();
        if history.index() >= end {
            return DispatchResult::Success;
        }
        let current = editor.buffer.text();
        match editor.session.history.go_to(end, &current) {
            Some(line) => {
                show_recalled(editor, &line);
                DispatchResult::Success
            }
            None => DispatchResult::Alert,
        }
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Recall the nearest entry starting with the text before the cursor
fn prefix_search(editor: &mut LineEditor<'_>, direction: SearchDirection, count: usize) -> DispatchResult {
    let cursor = editor.buffer.cursor();
    let prefix = match editor.search_prefix.clone() {
        Some(prefix) => prefix,
        None => editor.buffer.slice(0..cursor),
    };
    let mut recalled = None;
    for _ in 0..count {
        let current = recalled.clone().unwrap_or_else(|| editor.buffer.text());
        match editor.session.history.search(direction, &prefix, &current) {
            Some(line) => recalled = Some(line),
            None => break,
        }
    }
    let Some(line) = recalled else {
        return DispatchResult::Alert;
    };
    let cursor = if editor.session.options.history_search_cursor_moves_to_end {
        usize::MAX
    } else {
        prefix.chars().count()
    };
    {
        let mut editor = editor.suppress_suggestions();
        editor.set_buffer_text(&line, cursor);
    }
    editor.search_prefix = Some(prefix);
    DispatchResult::Success
}

#[derive(Clone)]
pub struct HistorySearchBackward;

impl Command for HistorySearchBackward {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, false) => prefix_search(editor, SearchDirection::Backward, n),
            (n, true) => prefix_search(editor, SearchDirection::Forward, n),
        }
    }
}

#[derive(Clone)]
pub struct HistorySearchForward;

impl Command for HistorySearchForward {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        match repeat_count(arg) {
            (n, false) => prefix_search(editor, SearchDirection::Forward, n),
            (n, true) => prefix_search(editor, SearchDirection::Backward, n),
        }
    }
}

/// Start an incremental search towards older entries
#[derive(Clone)]
pub struct ReverseSearchHistory;

impl Command for ReverseSearchHistory {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        editor.start_search(SearchDirection::Backward);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct ForwardSearchHistory;

impl Command for ForwardSearchHistory {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        editor.start_search(SearchDirection::Forward);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EditMode, Options, PredictionView};
    use crate::core::dispatcher::{DispatchResult, dispatch};
    use crate::core::session::EditorSession;

    fn session_with(lines: &[&str], options: Options) -> EditorSession {
        let mut s = EditorSession::new(options);
        for line in lines {
            s.add_to_history(line);
        }
        s
    }

    fn emacs() -> Options {
        Options {
            edit_mode: EditMode::Emacs,
            ..Options::default()
        }
    }

    #[test]
    fn test_navigation_restores_edited_line() {
        let mut s = session_with(&["one", "two"], emacs());
        let mut ed = s.editor("");
        ed.insert("draft");
        dispatch(&mut ed, "previous-history", None);
        assert_eq!(ed.get_buffer_state(), ("two".to_string(), 3));
        dispatch(&mut ed, "previous-history", None);
        assert_eq!(ed.get_buffer_state().0, "one");
        assert_eq!(dispatch(&mut ed, "previous-history", None), DispatchResult::Alert);
        dispatch(&mut ed, "end-of-history", None);
        assert_eq!(ed.get_buffer_state().0, "draft");
        dispatch(&mut ed, "beginning-of-history", None);
        assert_eq!(ed.get_buffer_state().0, "one");
        dispatch(&mut ed, "next-history", Some(2));
        assert_eq!(ed.get_buffer_state().0, "draft");
    }

    #[test]
    fn test_recall_is_undoable() {
        let mut s = session_with(&["ls"], emacs());
        let mut ed = s.editor("");
        ed.insert("x");
        dispatch(&mut ed, "previous-history", None);
        dispatch(&mut ed, "undo", None);
        assert_eq!(ed.get_buffer_state().0, "x");
    }

    #[test]
    fn test_prefix_search_repeats_with_same_prefix() {
        let mut s = session_with(&["git log", "ls", "git status", "git status"], emacs());
        let mut ed = s.editor("");
        ed.insert("git");
        dispatch(&mut ed, "history-search-backward", None);
        assert_eq!(ed.get_buffer_state(), ("git status".to_string(), 3));
        dispatch(&mut ed, "history-search-backward", None);
        assert_eq!(ed.get_buffer_state().0, "git log");
        assert_eq!(dispatch(&mut ed, "history-search-backward", None), DispatchResult::Alert);
        dispatch(&mut ed, "history-search-forward", None);
        assert_eq!(ed.get_buffer_state().0, "git status");
    }

    #[test]
    fn test_prefix_search_cursor_to_end() {
        let options = Options {
            history_search_cursor_moves_to_end: true,
            ..emacs()
        };
        let mut s = session_with(&["make test", "make"], options);
        let mut ed = s.editor("");
        ed.insert("ma");
        dispatch(&mut ed, "history-search-backward", None);
        assert_eq!(ed.get_buffer_state(), ("make".to_string(), 4));
        dispatch(&mut ed, "history-search-backward", None);
        assert_eq!(ed.get_buffer_state(), ("make test".to_string(), 9));
    }

    #[test]
    fn test_list_view_navigation() {
        let options = Options {
            prediction_view: PredictionView::List,
            ..emacs()
        };
        let mut s = session_with(&["cargo test", "cargo build", "ls"], options);
        let mut ed = s.editor("");
        ed.insert("cargo");
        dispatch(&mut ed, "next-history", None);
        assert_eq!(ed.get_buffer_state().0, "cargo build");
        dispatch(&mut ed, "next-history", None);
        assert_eq!(ed.get_buffer_state().0, "cargo test");
        dispatch(&mut ed, "next-history", None);
        assert_eq!(ed.get_buffer_state().0, "cargo");
        dispatch(&mut ed, "previous-history", None);
        assert_eq!(ed.get_buffer_state().0, "cargo test");
        dispatch(&mut ed, "backward-char", None);
        assert!(ed.prediction.list_input.is_none());
    }
}
