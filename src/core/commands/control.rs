/// Line control commands: accept, cancel, redraw, numeric argument and the
/// vi mode switches
use crate::core::command::Command;
use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;
use crate::core::vi;

#[derive(Clone)]
pub struct AcceptLine;

impl Command for AcceptLine {
    fn execute(&self, _editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        DispatchResult::Accept
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct CancelLine;

impl Command for CancelLine {
    fn execute(&self, _editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        DispatchResult::Cancel
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Drop the selection and mark; rings the bell
#[derive(Clone)]
pub struct Abort;

impl Command for Abort {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        editor.buffer.clear_selection();
        editor.buffer.set_mark(None);
        DispatchResult::Alert
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct ClearScreen;

impl Command for ClearScreen {
    fn execute(&self, _editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        DispatchResult::Redraw
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

/// Start or extend the numeric argument with the digit (or `-`) of the key
/// that ran this command
#[derive(Clone)]
pub struct DigitArgument;

impl Command for DigitArgument {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        let Some(key) = editor.current_key else {
            return DispatchResult::Alert;
        };
        if editor.chords.digit_argument(key) {
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
pub struct ViCommandMode;

impl Command for ViCommandMode {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        vi::enter_normal(editor)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct ViInsertMode;

impl Command for ViInsertMode {
    fn execute(&self, editor: &mut LineEditor<'_>, _arg: Option<i32>) -> DispatchResult {
        vi::enter_insert(editor)
    }

    fn accepts_arg(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EditMode, Options};
    use crate::core::dispatcher::{DispatchResult, dispatch};
    use crate::core::input::KeyPress;
    use crate::core::session::EditorSession;
    use crate::core::vi::ViMode;

    #[test]
    fn test_line_endings() {
        let mut s = EditorSession::new(Options::default());
        let mut ed = s.editor("");
        assert_eq!(dispatch(&mut ed, "accept-line", None), DispatchResult::Accept);
        assert_eq!(dispatch(&mut ed, "cancel-line", None), DispatchResult::Cancel);
        assert_eq!(dispatch(&mut ed, "clear-screen", None), DispatchResult::Redraw);
        assert_eq!(dispatch(&mut ed, "abort", None), DispatchResult::Alert);
    }

    #[test]
    fn test_digit_argument_uses_current_key() {
        let mut s = EditorSession::new(Options::default());
        let mut ed = s.editor("");
        ed.current_key = Some(KeyPress::char('-').alt());
        dispatch(&mut ed, "digit-argument", None);
        ed.current_key = Some(KeyPress::char('4').alt());
        dispatch(&mut ed, "digit-argument", None);
        assert_eq!(ed.chords.take_arg(), Some(-4));
        ed.current_key = Some(KeyPress::char('x').alt());
        assert_eq!(dispatch(&mut ed, "digit-argument", None), DispatchResult::Alert);
    }

    #[test]
    fn test_vi_mode_switches() {
        let mut s = EditorSession::new(Options {
            edit_mode: EditMode::Vi,
            ..Options::default()
        });
        let mut ed = s.editor("");
        assert_eq!(ed.vi_mode(), Some(ViMode::Insert));
        ed.insert("ab");
        dispatch(&mut ed, "vi-command-mode", None);
        assert_eq!(ed.vi_mode(), Some(ViMode::Normal));
        assert_eq!(ed.get_buffer_state().1, 1);
        assert_eq!(dispatch(&mut ed, "vi-command-mode", None), DispatchResult::Alert);
        dispatch(&mut ed, "vi-insert-mode", None);
        assert_eq!(ed.vi_mode(), Some(ViMode::Insert));
    }
}
