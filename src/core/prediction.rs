//! Suggestions drawn from history
//!
//! The inline view shows the most recent entry that starts with the input;
//! the list view shows several entries containing it, with the position of
//! the match so the list renderer can keep it visible.

use crate::core::history::History;
use crate::terminal::suggestion::{SuggestionEntry, chars_eq_ignore_case};

/// Source label shown next to list entries
pub const HISTORY_SOURCE: &str = "History";

/// Number of list entries shown at most
pub const MAX_LIST_ENTRIES: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryPredictor;

impl HistoryPredictor {
    /// Most recent entry that extends `input` (case-insensitive)
    pub fn inline<'h>(&self, history: &'h History, input: &str) -> Option<&'h str> {
        if input.trim().is_empty() {
            return None;
        }
        let input: Vec<char> = input.chars().collect();
        history
            .entries()
            .rev()
            .map(|e| e.line.as_str())
            .find(|line| {
                let line: Vec<char> = line.chars().collect();
                line.len() > input.len() && matches_at(&line, &input, 0)
            })
    }

    /// Up to [`MAX_LIST_ENTRIES`] recent entries containing `input`
    pub fn list(&self, history: &History, input: &str) -> Vec<SuggestionEntry> {
        if input.trim().is_empty() {
            return Vec::new();
        }
        let needle: Vec<char> = input.chars().collect();
        history
            .entries()
            .rev()
            .filter(|e| e.line != input)
            .filter_map(|e| {
                let line: Vec<char> = e.line.chars().collect();
                let index = (0..=line.len().checked_sub(needle.len())?)
                    .find(|&i| matches_at(&line, &needle, i))?;
                Some(SuggestionEntry::new(HISTORY_SOURCE, &e.line, Some(index)))
            })
            .take(MAX_LIST_ENTRIES)
            .collect()
    }
}

/// Whether `needle` matches `line` at char `at`, comparing char by char
/// without case so the index stays valid in the original text
fn matches_at(line: &[char], needle: &[char], at: usize) -> bool {
    line.get(at..at + needle.len())
        .is_some_and(|window| window.iter().zip(needle).all(|(&a, &b)| chars_eq_ignore_case(a, b)))
}

/// Prediction state of one read-line call
#[derive(Debug, Clone, Default)]
pub struct PredictionState {
    /// Set when the last edit happened while suggestions were suppressed;
    /// cleared by the next ordinary edit
    pub hidden: bool,
    /// Input the list was built from while the user walks the list
    pub list_input: Option<String>,
    /// Highlighted list row
    pub list_selected: Option<usize>,
}

impl PredictionState {
    pub fn end_list_navigation(&mut self) {
        self.list_input = None;
        self.list_selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> History {
        let mut h = History::default();
        for line in ["git status", "git commit -m wip", "ls", "Git Stash"] {
            h.add(line);
        }
        h
    }

    #[test]
    fn test_inline_prefers_most_recent() {
        let h = history();
        let p = HistoryPredictor;
        assert_eq!(p.inline(&h, "git st"), Some("Git Stash"));
        assert_eq!(p.inline(&h, "git c"), Some("git commit -m wip"));
        assert_eq!(p.inline(&h, "ls"), None);
        assert_eq!(p.inline(&h, "  "), None);
    }

    #[test]
    fn test_list_reports_match_index() {
        let h = history();
        let list = HistoryPredictor.list(&h, "st");
        let texts: Vec<_> = list.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Git Stash", "git status"]);
        assert_eq!(list[0].match_index, Some(4));
        assert_eq!(list[0].source, HISTORY_SOURCE);
    }

    #[test]
    fn test_list_index_counts_original_chars() {
        let mut h = History::default();
        h.add("İab cd");
        let list = HistoryPredictor.list(&h, "AB");
        assert_eq!(list[0].match_index, Some(1));
        let shown: String = list[0].text.chars().skip(1).take(2).collect();
        assert_eq!(shown, "ab");
    }

    #[test]
    fn test_list_is_bounded() {
        let mut h = History::default();
        for i in 0..30 {
            h.add(&format!("echo {}", i));
        }
        assert_eq!(HistoryPredictor.list(&h, "echo").len(), MAX_LIST_ENTRIES);
    }
}
