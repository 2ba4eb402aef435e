/// Completion and suggestion commands
use tracing::debug;

use crate::config::PredictionView;
use crate::core::command::{Command, repeat_count};
use crate::core::completion::{CompletionCycle, Completions, format_columns, request};
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;

fn fetch(editor: &LineEditor<'_>) -> Completions {
    let text = editor.buffer.text();
    let completions = request(editor.session.completer.as_deref(), &text, editor.buffer.cursor());
    debug!(count = completions.len(), "completions");
    completions
}

/// List `completions` below the input, asking first when there are many
fn show_listing(editor: &mut LineEditor<'_>, completions: Completions) {
    if completions.len() > editor.session.options.completion_query_items {
        editor.completion_query = Some(completions);
        return;
    }
    let labels: Vec<&str> = completions.candidates.iter().map(|c| c.label()).collect();
    editor.menu = format_columns(&labels, editor.width);
}

fn cycle(editor: &mut LineEditor<'_>, backward: bool) -> DispatchResult {
    if editor.completion.is_none() {
        let completions = fetch(editor);
        if completions.is_empty() {
            return DispatchResult::Alert;
        }
        editor.completion = Some(CompletionCycle::new(completions));
    }
    let Some(cycle) = editor.completion.as_mut() else {
        return DispatchResult::Alert;
    };
    let span = cycle.span.clone();
    let Some(text) = cycle.step(backward).map(|c| c.text.clone()) else {
        return DispatchResult::Alert;
    };
    cycle.span = span.start..span.start + text.chars().count();
    let mut editor = editor.suppress_suggestions();
    editor.replace_span(span, &text);
    DispatchResult::Success
}

/// Replace the word being completed with the next candidate
#[derive(Clone)]
pub struct TabCompleteNext;

impl Command for TabCompleteNext {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        cycle(editor, false)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct TabCompletePrevious;

impl Command for TabCompletePrevious {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        cycle(editor, true)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Bash-style completion: a single candidate is inserted, several extend
/// the word to their longest common prefix, and when that makes no progress
/// they are listed
#[derive(Clone)]
pub struct Complete;

impl Command for Complete {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let completions = fetch(editor);
        if completions.is_empty() {
            return DispatchResult::Alert;
        }
        let start = completions.replacement_start;
        let span = start..start + completions.replacement_length;
        if completions.len() == 1 {
            let text = completions.candidates[0].text.clone();
            let mut editor = editor.suppress_suggestions();
            editor.replace_span(span, &text);
            return DispatchResult::Success;
        }
        let prefix = completions.common_prefix();
        let typed = editor.buffer.slice(span.clone());
        if prefix.chars().count() > typed.chars().count() {
            let mut editor = editor.suppress_suggestions();
            editor.replace_span(span, &prefix);
            return DispatchResult::Success;
        }
        show_listing(editor, completions);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct PossibleCompletions;

impl Command for PossibleCompletions {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let completions = fetch(editor);
        if completions.is_empty() {
            return DispatchResult::Alert;
        }
        show_listing(editor, completions);
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Take the whole inline suggestion. Returns false when none is shown.
pub(crate) fn accept_suggestion(editor: &mut LineEditor<'_>) -> bool {
    let Some(suggestion) = editor.inline_suggestion() else {
        return false;
    };
    editor.set_buffer_text(&suggestion, usize::MAX);
    true
}

/// Take the next `count` words of the inline suggestion
pub(crate) fn accept_next_suggestion_word(editor: &mut LineEditor<'_>, count: usize) -> bool {
    let Some(suggestion) = editor.inline_suggestion() else {
        return false;
    };
    let chars: Vec<char> = suggestion.chars().collect();
    let delimiters = &editor.session.options.word_delimiters;
    let mut end = editor.buffer.len();
    for _ in 0..count.max(1) {
        end = delimiters.next_suggestion_word(&chars, end);
    }
    if end <= editor.buffer.len() {
        return false;
    }
    let text: String = chars[..end].iter().collect();
    editor.set_buffer_text(&text, usize::MAX);
    true
}

#[derive(Clone)]
pub struct AcceptSuggestion;

impl Command for AcceptSuggestion {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        if accept_suggestion(editor) {
            DispatchResult::Success
        } else {
            DispatchResult::Alert
        }
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct AcceptNextSuggestionWord;

impl Command for AcceptNextSuggestionWord {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult {
        if accept_next_suggestion_word(editor, repeat_count(arg).0) {
            DispatchResult::Success
        } else {
            DispatchResult::Alert
        }
    }
}

/// Toggle between the inline and list prediction views
#[derive(Clone)]
pub struct SwitchPredictionView;

impl Command for SwitchPredictionView {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let options = &mut editor.session.options;
        options.prediction_view = match options.prediction_view {
            PredictionView::Inline => PredictionView::List,
            PredictionView::List => PredictionView::Inline,
            PredictionView::None => return DispatchResult::Alert,
        };
        debug!(view = ?options.prediction_view, "prediction view switched");
        editor.prediction.end_list_navigation();
        DispatchResult::Success
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EditMode, Options, PredictionView};
    use crate::core::completion::WordListCompleter;
    use crate::core::dispatcher::{DispatchResult, dispatch};
    use crate::core::session::EditorSession;

    fn session(words: &[&str]) -> EditorSession {
        let mut s = EditorSession::new(Options {
            edit_mode: EditMode::Emacs,
            completion_query_items: 3,
            ..Options::default()
        });
        s.set_completer(Box::new(WordListCompleter::new(words.iter().copied())));
        s
    }

    #[test]
    fn test_tab_cycle_wraps() {
        let mut s = session(&["alpha", "alps", "beta"]);
        let mut ed = s.editor("");
        ed.insert("cd al");
        dispatch(&mut ed, "tab-complete-next", None);
        assert_eq!(ed.get_buffer_state().0, "cd alpha");
        dispatch(&mut ed, "tab-complete-next", None);
        assert_eq!(ed.get_buffer_state().0, "cd alps");
        dispatch(&mut ed, "tab-complete-next", None);
        assert_eq!(ed.get_buffer_state().0, "cd alpha");
        dispatch(&mut ed, "tab-complete-previous", None);
        assert_eq!(ed.get_buffer_state(), ("cd alps".to_string(), 7));
    }

    #[test]
    fn test_complete_common_prefix_then_list() {
        let mut s = session(&["alpha", "alps", "beta"]);
        let mut ed = s.editor("");
        ed.insert("a");
        dispatch(&mut ed, "complete", None);
        assert_eq!(ed.get_buffer_state().0, "alp");
        assert!(ed.menu.is_empty());
        dispatch(&mut ed, "complete", None);
        assert_eq!(ed.get_buffer_state().0, "alp");
        assert_eq!(ed.menu, vec!["alpha  alps".to_string()]);
        dispatch(&mut ed, "backward-char", None);
        assert!(ed.menu.is_empty());
    }

    #[test]
    fn test_complete_single_candidate() {
        let mut s = session(&["alpha", "beta"]);
        let mut ed = s.editor("");
        ed.insert("b");
        dispatch(&mut ed, "complete", None);
        assert_eq!(ed.get_buffer_state(), ("beta".to_string(), 4));
        ed.insert(" z");
        assert_eq!(dispatch(&mut ed, "complete", None), DispatchResult::Alert);
    }

    #[test]
    fn test_many_candidates_ask_first() {
        let mut s = session(&["a1", "a2", "a3", "a4"]);
        let mut ed = s.editor("");
        ed.insert("a");
        dispatch(&mut ed, "possible-completions", None);
        assert!(ed.completion_query.is_some());
        assert!(ed.frame(40).lines().contains(&"Display all 4 possibilities? (y or n)".to_string()));
        ed.process_key(crate::core::input::KeyPress::char('y'));
        assert!(ed.completion_query.is_none());
        assert_eq!(ed.menu.len(), 1);
    }

    #[test]
    fn test_accept_suggestion_word_by_word() {
        let mut s = session(&[]);
        s.add_to_history("git commit -m wip");
        let mut ed = s.editor("");
        ed.insert("git");
        dispatch(&mut ed, "accept-next-suggestion-word", None);
        assert_eq!(ed.get_buffer_state().0, "git commit");
        dispatch(&mut ed, "forward-word", None);
        assert_eq!(ed.get_buffer_state().0, "git commit -");
        dispatch(&mut ed, "forward-char", None);
        assert_eq!(ed.get_buffer_state().0, "git commit -m wip");
        assert_eq!(dispatch(&mut ed, "accept-suggestion", None), DispatchResult::Alert);
    }

    #[test]
    fn test_switch_prediction_view() {
        let mut s = session(&[]);
        let mut ed = s.editor("");
        dispatch(&mut ed, "switch-prediction-view", None);
        assert_eq!(ed.session.options.prediction_view, PredictionView::List);
        dispatch(&mut ed, "switch-prediction-view", None);
        assert_eq!(ed.session.options.prediction_view, PredictionView::Inline);
    }
}
