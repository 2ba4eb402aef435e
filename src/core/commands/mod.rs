//! Built-in commands of the line editor
//!
//! Commands are organized into logical sub-modules:
//!
//! - **movement**: Cursor navigation (forward-char, next-word, goto-brace, etc.)
//! - **editing**: Deleting, case changes, undo/redo
//! - **kill_ring**: Kill ring operations (kill-line, yank, yank-pop, set-mark, etc.)
//! - **selection**: Cmd-style selection and clipboard (select-all, cut, paste, etc.)
//! - **history**: History navigation, prefix and incremental search
//! - **completion**: Completion and history suggestions
//! - **control**: Accept/cancel, numeric argument, vi mode switches
//!
//! All commands implement the [`Command`](crate::core::command::Command) trait,
//! which defines a uniform interface for command execution.

/// Completion and suggestions
pub mod completion;
/// Line control
pub mod control;
/// Basic editing
pub mod editing;
/// History navigation and search
pub mod history;
/// Kill ring and yank
pub mod kill_ring;
/// Cursor movement commands
pub mod movement;
/// Selection and clipboard
pub mod selection;

use crate::core::command::CommandRegistry;

/// Register every built-in command under its kebab-case name
pub fn register_all(registry: &mut CommandRegistry) {
    use self::completion::*;
    use self::control::*;
    use self::editing::*;
    use self::history::*;
    use self::kill_ring::*;
    use self::movement::*;
    use self::selection::*;

    // Movement commands
    registry.register("backward-char", Box::new(BackwardChar));
    registry.register("forward-char", Box::new(ForwardChar));
    registry.register("beginning-of-line", Box::new(BeginningOfLine));
    registry.register("end-of-line", Box::new(EndOfLine));
    registry.register("backward-word", Box::new(BackwardWord));
    registry.register("forward-word", Box::new(ForwardWord));
    registry.register("next-word", Box::new(NextWord));
    registry.register("previous-line", Box::new(PreviousLine));
    registry.register("next-line", Box::new(NextLine));
    registry.register("goto-brace", Box::new(GotoBrace));

    // Editing commands
    registry.register("backward-delete-char", Box::new(BackwardDeleteChar));
    registry.register("delete-char", Box::new(DeleteChar));
    registry.register("delete-char-or-exit", Box::new(DeleteCharOrExit));
    registry.register("add-line", Box::new(AddLine));
    registry.register("transpose-chars", Box::new(TransposeChars));
    registry.register("upcase-word", Box::new(UpcaseWord));
    registry.register("downcase-word", Box::new(DowncaseWord));
    registry.register("capitalize-word", Box::new(CapitalizeWord));
    registry.register("revert-line", Box::new(RevertLine));
    registry.register("undo", Box::new(Undo));
    registry.register("redo", Box::new(Redo));

    // Kill ring commands
    registry.register("kill-line", Box::new(KillLine));
    registry.register("backward-kill-line", Box::new(BackwardKillLine));
    registry.register("kill-word", Box::new(KillWord));
    registry.register("backward-kill-word", Box::new(BackwardKillWord));
    registry.register("unix-word-rubout", Box::new(UnixWordRubout));
    registry.register("kill-region", Box::new(KillRegion));
    registry.register("yank", Box::new(Yank));
    registry.register("yank-pop", Box::new(YankPop));
    registry.register("set-mark", Box::new(SetMark));
    registry.register("exchange-point-and-mark", Box::new(ExchangePointAndMark));

    // Selection and clipboard
    registry.register("select-backward-char", Box::new(SelectBackwardChar));
    registry.register("select-forward-char", Box::new(SelectForwardChar));
    registry.register("select-backward-word", Box::new(SelectBackwardWord));
    registry.register("select-next-word", Box::new(SelectNextWord));
    registry.register("select-line-start", Box::new(SelectLineStart));
    registry.register("select-line-end", Box::new(SelectLineEnd));
    registry.register("select-all", Box::new(SelectAll));
    registry.register("copy", Box::new(CopySelection));
    registry.register("cut", Box::new(Cut));
    registry.register("paste", Box::new(Paste));
    registry.register("copy-or-cancel-line", Box::new(CopyOrCancelLine));

    // History
    registry.register("previous-history", Box::new(PreviousHistory));
    registry.register("next-history", Box::new(NextHistory));
    registry.register("beginning-of-history", Box::new(BeginningOfHistory));
    registry.register("end-of-history", Box::new(EndOfHistory));
    registry.register("history-search-backward", Box::new(HistorySearchBackward));
    registry.register("history-search-forward", Box::new(HistorySearchForward));
    registry.register("reverse-search-history", Box::new(ReverseSearchHistory));
    registry.register("forward-search-history", Box::new(ForwardSearchHistory));

    // Completion and suggestions
    registry.register("complete", Box::new(Complete));
    registry.register("tab-complete-next", Box::new(TabCompleteNext));
    registry.register("tab-complete-previous", Box::new(TabCompletePrevious));
    registry.register("possible-completions", Box::new(PossibleCompletions));
    registry.register("accept-suggestion", Box::new(AcceptSuggestion));
    registry.register("accept-next-suggestion-word", Box::new(AcceptNextSuggestionWord));
    registry.register("switch-prediction-view", Box::new(SwitchPredictionView));

    // Control
    registry.register("accept-line", Box::new(AcceptLine));
    registry.register("cancel-line", Box::new(CancelLine));
    registry.register("abort", Box::new(Abort));
    registry.register("clear-screen", Box::new(ClearScreen));
    registry.register("digit-argument", Box::new(DigitArgument));
    registry.register("vi-command-mode", Box::new(ViCommandMode));
    registry.register("vi-insert-mode", Box::new(ViInsertMode));
}

#[cfg(test)]
mod tests {
    use crate::core::command::CommandRegistry;
    use crate::core::keymap::{KeyTableId, Keymaps};

    #[test]
    fn test_every_default_binding_is_registered() {
        let registry = CommandRegistry::with_builtins();
        let keymaps = Keymaps::default();
        for id in [KeyTableId::Cmd, KeyTableId::Emacs, KeyTableId::ViInsert, KeyTableId::ViCommand] {
            for (chord, command) in keymaps.table(id).bindings() {
                assert!(registry.contains(&command), "{:?} {} -> {}", id, chord, command);
            }
        }
    }
}
