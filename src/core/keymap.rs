//! Key binding tables
//!
//! Each edit mode has a trie over key presses whose nodes may carry a
//! command name. A node can be both bound and a prefix of longer chords;
//! the dispatcher decides what to do with that.

use std::collections::HashMap;

use crate::config::EditMode;
use crate::core::input::{KeyPress, format_chord, parse_chord};
use crate::error::Result;

/// Result of looking a key sequence up in a trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    /// The sequence leads nowhere
    DeadEnd,
    /// The sequence is bound, and nothing longer starts with it
    Command(&'a str),
    /// Longer sequences start here; `command` is set when the sequence is
    /// itself bound too
    Prefix { command: Option<&'a str> },
}

/// A node in the key binding trie
#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// The command bound to this sequence (if any)
    command: Option<String>,
    /// Child nodes for multi-key sequences
    children: HashMap<KeyPress, TrieNode>,
}

/// Trie structure for multi-key binding lookups
#[derive(Debug, Clone, Default)]
pub struct KeyTrie {
    root: TrieNode,
}

impl KeyTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding sequence into the trie
    pub fn bind(&mut self, chord: &[KeyPress], command: &str) {
        let mut node = &mut self.root;
        for key in chord {
            node = node.children.entry(key.normalized()).or_default();
        }
        node.command = Some(command.to_string());
    }

    /// Remove a binding; returns whether one existed
    pub fn unbind(&mut self, chord: &[KeyPress]) -> bool {
        let mut node = &mut self.root;
        for key in chord {
            match node.children.get_mut(&key.normalized()) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.command.take().is_some()
    }

    pub fn lookup(&self, sequence: &[KeyPress]) -> LookupResult<'_> {
        let mut node = &self.root;
        for key in sequence {
            match node.children.get(key) {
                Some(child) => node = child,
                None => return LookupResult::DeadEnd,
            }
        }
        match (&node.command, node.children.is_empty()) {
            (Some(cmd), true) => LookupResult::Command(cmd),
            (command, false) => LookupResult::Prefix {
                command: command.as_deref(),
            },
            (None, true) => LookupResult::DeadEnd,
        }
    }

    /// Every binding as `(chord text, command)`, sorted by chord
    pub fn bindings(&self) -> Vec<(String, String)> {
        fn walk(node: &TrieNode, path: &mut Vec<KeyPress>, out: &mut Vec<(String, String)>) {
            if let Some(cmd) = &node.command {
                out.push((format_chord(path), cmd.clone()));
            }
            for (key, child) in &node.children {
                path.push(*key);
                walk(child, path, out);
                path.pop();
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out.sort();
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTableId {
    Cmd,
    Emacs,
    ViInsert,
    /// Bindings consulted in Vi normal mode before the built-in grammar
    ViCommand,
}

impl KeyTableId {
    /// The table a mode types into
    pub fn for_mode(mode: EditMode) -> Self {
        match mode {
            EditMode::Cmd => KeyTableId::Cmd,
            EditMode::Emacs => KeyTableId::Emacs,
            EditMode::Vi => KeyTableId::ViInsert,
        }
    }
}

const DIGIT_ARGUMENT: &[(&str, &str)] = &[
    ("Alt+0", "digit-argument"),
    ("Alt+1", "digit-argument"),
    ("Alt+2", "digit-argument"),
    ("Alt+3", "digit-argument"),
    ("Alt+4", "digit-argument"),
    ("Alt+5", "digit-argument"),
    ("Alt+6", "digit-argument"),
    ("Alt+7", "digit-argument"),
    ("Alt+8", "digit-argument"),
    ("Alt+9", "digit-argument"),
    ("Alt+-", "digit-argument"),
];

const CMD_BINDINGS: &[(&str, &str)] = &[
    ("Enter", "accept-line"),
    ("Shift+Enter", "add-line"),
    ("Escape", "revert-line"),
    ("LeftArrow", "backward-char"),
    ("RightArrow", "forward-char"),
    ("Ctrl+LeftArrow", "backward-word"),
    ("Ctrl+RightArrow", "next-word"),
    ("Home", "beginning-of-line"),
    ("End", "end-of-line"),
    ("UpArrow", "previous-history"),
    ("DownArrow", "next-history"),
    ("Backspace", "backward-delete-char"),
    ("Delete", "delete-char"),
    ("Ctrl+Backspace", "backward-kill-word"),
    ("Ctrl+Delete", "kill-word"),
    ("Ctrl+End", "kill-line"),
    ("Ctrl+Home", "backward-kill-line"),
    ("Shift+LeftArrow", "select-backward-char"),
    ("Shift+RightArrow", "select-forward-char"),
    ("Ctrl+Shift+LeftArrow", "select-backward-word"),
    ("Ctrl+Shift+RightArrow", "select-next-word"),
    ("Shift+Home", "select-line-start"),
    ("Shift+End", "select-line-end"),
    ("Ctrl+a", "select-all"),
    ("Ctrl+c", "copy-or-cancel-line"),
    ("Ctrl+x", "cut"),
    ("Ctrl+v", "paste"),
    ("Ctrl+z", "undo"),
    ("Ctrl+y", "redo"),
    ("Tab", "tab-complete-next"),
    ("Shift+Tab", "tab-complete-previous"),
    ("Ctrl+Space", "possible-completions"),
    ("Ctrl+r", "reverse-search-history"),
    ("Ctrl+s", "forward-search-history"),
    ("F8", "history-search-backward"),
    ("Shift+F8", "history-search-forward"),
    ("Ctrl+l", "clear-screen"),
    ("Ctrl+]", "goto-brace"),
    ("F2", "switch-prediction-view"),
];

const EMACS_BINDINGS: &[(&str, &str)] = &[
    ("Enter", "accept-line"),
    ("Shift+Enter", "add-line"),
    ("Ctrl+a", "beginning-of-line"),
    ("Ctrl+e", "end-of-line"),
    ("Home", "beginning-of-line"),
    ("End", "end-of-line"),
    ("Ctrl+b", "backward-char"),
    ("Ctrl+f", "forward-char"),
    ("LeftArrow", "backward-char"),
    ("RightArrow", "forward-char"),
    ("Alt+b", "backward-word"),
    ("Alt+f", "forward-word"),
    ("Ctrl+LeftArrow", "backward-word"),
    ("Ctrl+RightArrow", "forward-word"),
    ("Ctrl+p", "previous-history"),
    ("Ctrl+n", "next-history"),
    ("UpArrow", "previous-history"),
    ("DownArrow", "next-history"),
    ("Alt+<", "beginning-of-history"),
    ("Alt+>", "end-of-history"),
    ("Alt+p", "history-search-backward"),
    ("Alt+n", "history-search-forward"),
    ("Backspace", "backward-delete-char"),
    ("Delete", "delete-char"),
    ("Ctrl+d", "delete-char-or-exit"),
    ("Ctrl+k", "kill-line"),
    ("Ctrl+u", "backward-kill-line"),
    ("Alt+d", "kill-word"),
    ("Alt+Backspace", "backward-kill-word"),
    ("Ctrl+w", "unix-word-rubout"),
    ("Ctrl+y", "yank"),
    ("Alt+y", "yank-pop"),
    ("Ctrl+Space", "set-mark"),
    ("Ctrl+x,Ctrl+x", "exchange-point-and-mark"),
    ("Ctrl+x,Ctrl+u", "undo"),
    ("Ctrl+_", "undo"),
    ("Alt+r", "revert-line"),
    ("Ctrl+t", "transpose-chars"),
    ("Alt+u", "upcase-word"),
    ("Alt+l", "downcase-word"),
    ("Alt+c", "capitalize-word"),
    ("Tab", "complete"),
    ("Alt+=", "possible-completions"),
    ("Alt+?", "possible-completions"),
    ("Ctrl+r", "reverse-search-history"),
    ("Ctrl+s", "forward-search-history"),
    ("Ctrl+g", "abort"),
    ("Ctrl+c", "cancel-line"),
    ("Ctrl+l", "clear-screen"),
    ("Ctrl+]", "goto-brace"),
    ("F2", "switch-prediction-view"),
];

const VI_INSERT_BINDINGS: &[(&str, &str)] = &[
    ("Escape", "vi-command-mode"),
    ("Enter", "accept-line"),
    ("Shift+Enter", "add-line"),
    ("Backspace", "backward-delete-char"),
    ("Delete", "delete-char"),
    ("LeftArrow", "backward-char"),
    ("RightArrow", "forward-char"),
    ("Ctrl+LeftArrow", "backward-word"),
    ("Ctrl+RightArrow", "next-word"),
    ("Home", "beginning-of-line"),
    ("End", "end-of-line"),
    ("UpArrow", "previous-history"),
    ("DownArrow", "next-history"),
    ("Ctrl+w", "unix-word-rubout"),
    ("Ctrl+u", "backward-kill-line"),
    ("Ctrl+c", "cancel-line"),
    ("Ctrl+d", "delete-char-or-exit"),
    ("Tab", "complete"),
    ("Ctrl+Space", "possible-completions"),
    ("Ctrl+r", "reverse-search-history"),
    ("Ctrl+s", "forward-search-history"),
    ("Ctrl+l", "clear-screen"),
    ("F2", "switch-prediction-view"),
];

const VI_COMMAND_BINDINGS: &[(&str, &str)] = &[
    ("Enter", "accept-line"),
    ("LeftArrow", "backward-char"),
    ("RightArrow", "forward-char"),
    ("Home", "beginning-of-line"),
    ("End", "end-of-line"),
    ("UpArrow", "previous-history"),
    ("DownArrow", "next-history"),
    ("Ctrl+c", "cancel-line"),
    ("Ctrl+d", "delete-char-or-exit"),
    ("Ctrl+l", "clear-screen"),
    ("Ctrl+r", "redo"),
];

/// The binding tables of every mode
#[derive(Debug, Clone)]
pub struct Keymaps {
    cmd: KeyTrie,
    emacs: KeyTrie,
    vi_insert: KeyTrie,
    vi_command: KeyTrie,
}

fn build(defaults: &[&[(&str, &str)]]) -> KeyTrie {
    let mut trie = KeyTrie::new();
    for list in defaults {
        for (chord, command) in *list {
            // the default tables are static and known to parse
            if let Ok(chord) = parse_chord(chord) {
                trie.bind(&chord, command);
            }
        }
    }
    trie
}

impl Default for Keymaps {
    fn default() -> Self {
        Self {
            cmd: build(&[CMD_BINDINGS, DIGIT_ARGUMENT]),
            emacs: build(&[EMACS_BINDINGS, DIGIT_ARGUMENT]),
            vi_insert: build(&[VI_INSERT_BINDINGS]),
            vi_command: build(&[VI_COMMAND_BINDINGS]),
        }
    }
}

impl Keymaps {
    pub fn table(&self, id: KeyTableId) -> &KeyTrie {
        match id {
            KeyTableId::Cmd => &self.cmd,
            KeyTableId::Emacs => &self.emacs,
            KeyTableId::ViInsert => &self.vi_insert,
            KeyTableId::ViCommand => &self.vi_command,
        }
    }

    pub fn table_mut(&mut self, id: KeyTableId) -> &mut KeyTrie {
        match id {
            KeyTableId::Cmd => &mut self.cmd,
            KeyTableId::Emacs => &mut self.emacs,
            KeyTableId::ViInsert => &mut self.vi_insert,
            KeyTableId::ViCommand => &mut self.vi_command,
        }
    }

    /// Parse `chord` and bind it in table `id`
    pub fn bind(&mut self, id: KeyTableId, chord: &str, command: &str) -> Result<()> {
        let chord = parse_chord(chord)?;
        self.table_mut(id).bind(&chord, command);
        Ok(())
    }
}
