//! Command Pattern implementation for the line editor
//!
//! Every named operation a key can be bound to implements [`Command`]. The
//! registry maps kebab-case names to boxed commands; hosts can register
//! their own next to the built-in ones.

use std::collections::HashMap;

use crate::core::dispatcher::DispatchResult;
use crate::core::editor::LineEditor;

/// Core command trait implementing the Command Pattern
///
/// # Parameters
/// - `editor`: the live read-line state (buffer, history, kill ring, ...)
/// - `arg`: numeric argument, when one was typed and the command takes it
pub trait Command: Send + Sync + CloneCommand {
    fn execute(&self, editor: &mut LineEditor<'_>, arg: Option<i32>) -> DispatchResult;

    /// Whether a pending numeric argument is passed in; commands that return
    /// false run once and leave the argument unused
    fn accepts_arg(&self) -> bool {
        true
    }
}

/// Helper trait for cloning boxed commands
/// This trait is automatically implemented for all Command types
pub trait CloneCommand {
    /// Create a boxed clone of this command
    fn clone_box(&self) -> Box<dyn Command>;
}

impl<T> CloneCommand for T
where
    T: 'static + Command + Clone,
{
    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Command> {
    fn clone(&self) -> Box<dyn Command> {
        self.as_ref().clone_box()
    }
}

/// Split a numeric argument into a repeat count and a direction flag.
///
/// A negative argument runs the command's opposite direction.
pub fn repeat_count(arg: Option<i32>) -> (usize, bool) {
    match arg {
        None => (1, false),
        Some(n) if n < 0 => (n.unsigned_abs() as usize, true),
        Some(0) => (0, false),
        Some(n) => (n as usize, false),
    }
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        f.debug_struct("CommandRegistry").field("commands", &names).finish()
    }
}

impl CommandRegistry {
    /// Registry holding every built-in command
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        crate::core::commands::register_all(&mut registry);
        registry
    }

    pub fn register(&mut self, name: &'static str, command: Box<dyn Command>) {
        self.commands.insert(name, command);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_count() {
        assert_eq!(repeat_count(None), (1, false));
        assert_eq!(repeat_count(Some(4)), (4, false));
        assert_eq!(repeat_count(Some(-2)), (2, true));
        assert_eq!(repeat_count(Some(0)), (0, false));
    }

    #[test]
    fn test_builtins_registered() {
        let registry = CommandRegistry::with_builtins();
        for name in [
            "accept-line",
            "backward-char",
            "kill-word",
            "yank-pop",
            "reverse-search-history",
            "digit-argument",
            "exchange-point-and-mark",
            "tab-complete-next",
            "accept-next-suggestion-word",
            "vi-command-mode",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(registry.get("no-such-command").is_none());
    }
}
