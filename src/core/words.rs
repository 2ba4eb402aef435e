//! Word boundaries for the Cmd/Emacs commands and inline suggestions
//!
//! A word is a run of chars that are neither whitespace nor one of the
//! configured delimiters. Vi keeps its own word/WORD classes in
//! `vi::motion`.

pub const DEFAULT_WORD_DELIMITERS: &str = ";:,.[]{}()/\\|^&*-=+'\"`\u{2013}\u{2014}\u{2015}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDelimiters(String);

impl Default for WordDelimiters {
    fn default() -> Self {
        Self(DEFAULT_WORD_DELIMITERS.to_string())
    }
}

impl WordDelimiters {
    pub fn new(delimiters: &str) -> Self {
        Self(delimiters.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_word_char(&self, c: char) -> bool {
        !c.is_whitespace() && !self.0.contains(c)
    }

    /// End of the word at or after `pos` (Emacs `forward-word`)
    pub fn forward_word_end(&self, text: &[char], pos: usize) -> usize {
        let mut i = pos.min(text.len());
        while i < text.len() && !self.is_word_char(text[i]) {
            i += 1;
        }
        while i < text.len() && self.is_word_char(text[i]) {
            i += 1;
        }
        i
    }

    /// Start of the word before `pos` (`backward-word`)
    pub fn backward_word_start(&self, text: &[char], pos: usize) -> usize {
        let mut i = pos.min(text.len());
        while i > 0 && !self.is_word_char(text[i - 1]) {
            i -= 1;
        }
        while i > 0 && self.is_word_char(text[i - 1]) {
            i -= 1;
        }
        i
    }

    /// Start of the next word after `pos` (Cmd `next-word`)
    pub fn next_word_start(&self, text: &[char], pos: usize) -> usize {
        let mut i = pos.min(text.len());
        while i < text.len() && self.is_word_char(text[i]) {
            i += 1;
        }
        while i < text.len() && !self.is_word_char(text[i]) {
            i += 1;
        }
        i
    }

    /// End of the next word in `text` starting at `from`, including the
    /// whitespace that precedes it. Used to accept a suggestion word by word.
    pub fn next_suggestion_word(&self, text: &[char], from: usize) -> usize {
        let mut i = from.min(text.len());
        while i < text.len() && text[i].is_whitespace() {
            i += 1;
        }
        if i < text.len() && !self.is_word_char(text[i]) {
            return i + 1;
        }
        while i < text.len() && self.is_word_char(text[i]) {
            i += 1;
        }
        i
    }
}

/// Start of the whitespace-delimited word before `pos` (`unix-word-rubout`)
pub fn unix_word_start(text: &[char], pos: usize) -> usize {
    let mut i = pos.min(text.len());
    while i > 0 && text[i - 1].is_whitespace() {
        i -= 1;
    }
    while i > 0 && !text[i - 1].is_whitespace() {
        i -= 1;
    }
    i
}
