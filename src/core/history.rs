//! History engine
//!
//! Accepted lines, oldest first, with a navigation cursor. Position
//! `entries.len()` is the line being edited; stepping away from it saves
//! that line so stepping back restores it.

use std::collections::VecDeque;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub line: String,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Backward,
    Forward,
}

impl SearchDirection {
    pub fn reversed(self) -> Self {
        match self {
            SearchDirection::Backward => SearchDirection::Forward,
            SearchDirection::Forward => SearchDirection::Backward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Prefix,
    Substring,
}

impl MatchKind {
    pub fn matches(self, line: &str, query: &str) -> Option<usize> {
        match self {
            MatchKind::Prefix => line.starts_with(query).then_some(0),
            MatchKind::Substring => line.find(query).map(|byte| line[..byte].chars().count()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    next_seq: u64,
    max_count: usize,
    no_duplicates: bool,
    index: usize,
    saved_current: Option<String>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(4096, true)
    }
}

impl History {
    pub fn new(max_count: usize, no_duplicates: bool) -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 1,
            max_count: max_count.max(1),
            no_duplicates,
            index: 0,
            saved_current: None,
        }
    }

    /// Append an accepted line. Returns false when the line was skipped.
    pub fn add(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        if self.no_duplicates {
            if self.entries.back().is_some_and(|e| e.line == line) {
                self.reset_navigation();
                return false;
            }
            self.entries.retain(|e| e.line != line);
        }

        self.entries.push_back(HistoryEntry {
            line: line.to_string(),
            seq: self.next_seq,
        });
        self.next_seq += 1;

        while self.entries.len() > self.max_count {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(seq = evicted.seq, "history entry evicted");
            }
        }
        self.reset_navigation();
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.reset_navigation();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn set_max_count(&mut self, max_count: usize) {
        self.max_count = max_count.max(1);
        while self.entries.len() > self.max_count {
            self.entries.pop_front();
        }
        self.reset_navigation();
    }

    pub fn set_no_duplicates(&mut self, no_duplicates: bool) {
        self.no_duplicates = no_duplicates;
    }

    // ==================== Navigation ====================

    /// Current navigation position; `len()` means the edited line
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset_navigation(&mut self) {
        self.index = self.entries.len();
        self.saved_current = None;
    }

    /// Step one entry in `direction`, returning the line to show
    pub fn navigate(&mut self, direction: SearchDirection, current: &str) -> Option<String> {
        match direction {
            SearchDirection::Backward => {
                if self.index == 0 || self.entries.is_empty() {
                    return None;
                }
                self.go_to(self.index - 1, current)
            }
            SearchDirection::Forward => {
                if self.index >= self.entries.len() {
                    return None;
                }
                self.go_to(self.index + 1, current)
            }
        }
    }

    /// Jump to `index` (clamped), returning the line to show
    pub fn go_to(&mut self, index: usize, current: &str) -> Option<String> {
        let index = index.min(self.entries.len());
        if self.index >= self.entries.len() && index < self.entries.len() {
            self.saved_current = Some(current.to_string());
        }
        self.index = index;
        if index == self.entries.len() {
            Some(self.saved_current.take().unwrap_or_default())
        } else {
            self.entries.get(index).map(|e| e.line.clone())
        }
    }

    // ==================== Search ====================

    /// Index of the nearest entry matching `query`, strictly beyond `from`
    /// in `direction`. Returns the entry index and the char offset of the
    /// match within it.
    pub fn find(
        &self,
        direction: SearchDirection,
        query: &str,
        kind: MatchKind,
        from: usize,
    ) -> Option<(usize, usize)> {
        let len = self.entries.len();
        match direction {
            SearchDirection::Backward => (0..from.min(len))
                .rev()
                .find_map(|i| kind.matches(&self.entries[i].line, query).map(|m| (i, m))),
            SearchDirection::Forward => (from.saturating_add(1)..len)
                .find_map(|i| kind.matches(&self.entries[i].line, query).map(|m| (i, m))),
        }
    }

    /// Prefix search from the navigation position (`history-search-*`)
    pub fn search(
        &mut self,
        direction: SearchDirection,
        query: &str,
        current: &str,
    ) -> Option<String> {
        let mut from = self.index;
        loop {
            let (found, _) = self.find(direction, query, MatchKind::Prefix, from)?;
            from = found;
            // skip entries identical to what is already shown
            if self.entries[found].line != current {
                return self.go_to(found, current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(lines: &[&str]) -> History {
        let mut h = History::default();
        for line in lines {
            h.add(line);
        }
        h
    }

    fn lines(h: &History) -> Vec<String> {
        h.entries().map(|e| e.line.clone()).collect()
    }

    #[test]
    fn test_no_duplicates_moves_entry_to_end() {
        let mut h = history_of(&["a", "b", "a"]);
        assert_eq!(lines(&h), vec!["b", "a"]);
        assert!(!h.add("a"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_duplicates_allowed_when_disabled() {
        let mut h = History::new(10, false);
        h.add("a");
        h.add("a");
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_max_count_evicts_oldest() {
        let mut h = History::new(2, true);
        h.add("1");
        h.add("2");
        h.add("3");
        assert_eq!(lines(&h), vec!["2", "3"]);
        assert_eq!(h.get(0).unwrap().seq, 2);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut h = History::default();
        assert!(!h.add("   "));
        assert!(h.is_empty());
    }

    #[test]
    fn test_navigation_restores_current_line() {
        let mut h = history_of(&["ps p*", "dir c*"]);
        assert_eq!(h.navigate(SearchDirection::Backward, "draft"), Some("dir c*".into()));
        assert_eq!(h.navigate(SearchDirection::Backward, "dir c*"), Some("ps p*".into()));
        assert_eq!(h.navigate(SearchDirection::Backward, "ps p*"), None);
        assert_eq!(h.navigate(SearchDirection::Forward, "ps p*"), Some("dir c*".into()));
        assert_eq!(h.navigate(SearchDirection::Forward, "dir c*"), Some("draft".into()));
        assert_eq!(h.navigate(SearchDirection::Forward, "draft"), None);
    }

    #[test]
    fn test_find_substring_and_prefix() {
        let h = history_of(&["git status", "ls", "git log"]);
        assert_eq!(h.find(SearchDirection::Backward, "git", MatchKind::Prefix, 3), Some((2, 0)));
        assert_eq!(h.find(SearchDirection::Backward, "git", MatchKind::Prefix, 2), Some((0, 0)));
        assert_eq!(h.find(SearchDirection::Forward, "s", MatchKind::Substring, 0), Some((1, 1)));
        assert_eq!(h.find(SearchDirection::Backward, "xyz", MatchKind::Substring, 3), None);
    }

    #[test]
    fn test_prefix_search_skips_identical() {
        let mut h = History::new(10, false);
        for line in ["git a", "git b", "git b"] {
            h.add(line);
        }
        assert_eq!(h.search(SearchDirection::Backward, "git", "git"), Some("git b".into()));
        assert_eq!(h.search(SearchDirection::Backward, "git", "git b"), Some("git a".into()));
        assert_eq!(h.search(SearchDirection::Backward, "git", "git a"), None);
    }
}
