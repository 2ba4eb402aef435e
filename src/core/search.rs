//! Incremental history search (`reverse-search-history` / `forward-search-history`)
//!
//! Every keystroke pushes a [`SearchFrame`], so Backspace can return to the
//! exact previous state. A failed search keeps the last successful entry
//! so a search in the opposite direction resumes from it.

use crate::core::history::{History, MatchKind, SearchDirection};
use crate::core::undo::UndoFrame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFrame {
    pub query: String,
    /// History entry currently shown, if any has matched yet
    pub found: Option<usize>,
    /// Char offset of the match within the found entry
    pub match_at: usize,
    pub failed: bool,
    pub direction: SearchDirection,
}

/// What the buffer should show after a search step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchView {
    /// Show this history line with the cursor on the match
    Found { line: String, cursor: usize },
    /// Leave the buffer as it is
    Unchanged,
    /// Put back the text the search started from
    Original,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    frames: Vec<SearchFrame>,
    original: UndoFrame,
    /// Navigation index when the search began
    start_index: usize,
    /// Query of the previous search, reused when repeating with an empty query
    last_query: Option<String>,
}

impl SearchState {
    pub fn new(
        direction: SearchDirection,
        original: UndoFrame,
        start_index: usize,
        last_query: Option<String>,
    ) -> Self {
        Self {
            frames: vec![SearchFrame {
                query: String::new(),
                found: None,
                match_at: 0,
                failed: false,
                direction,
            }],
            original,
            start_index,
            last_query,
        }
    }

    pub fn current(&self) -> &SearchFrame {
        // the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    pub fn query(&self) -> &str {
        &self.current().query
    }

    pub fn failed(&self) -> bool {
        self.current().failed
    }

    pub fn direction(&self) -> SearchDirection {
        self.current().direction
    }

    pub fn original(&self) -> &UndoFrame {
        &self.original
    }

    /// Status line text, e.g. `failed-bck-i-search: foo_`
    pub fn prompt(&self) -> String {
        let frame = self.current();
        let dir = match frame.direction {
            SearchDirection::Backward => "bck",
            SearchDirection::Forward => "fwd",
        };
        let failed = if frame.failed { "failed-" } else { "" };
        format!("{}{}-i-search: {}_", failed, dir, frame.query)
    }

    /// Position searches start from when nothing has matched yet
    fn anchor(&self) -> usize {
        self.current().found.unwrap_or(self.start_index)
    }

    /// Extend the query by one character
    pub fn add_char(&mut self, c: char, history: &History) -> SearchView {
        let prev = self.current().clone();
        let mut query = prev.query.clone();
        query.push(c);

        // the shown entry may still match the longer query
        let inclusive = match (prev.direction, prev.found) {
            (SearchDirection::Backward, Some(i)) => i + 1,
            (SearchDirection::Forward, Some(i)) => i.wrapping_sub(1),
            (_, None) => self.start_index,
        };
        let hit = if prev.failed {
            None
        } else if prev.direction == SearchDirection::Forward && prev.found == Some(0) {
            // wrapping_sub above cannot express "from before entry 0"
            history
                .get(0)
                .and_then(|e| MatchKind::Substring.matches(&e.line, &query))
                .map(|m| (0, m))
                .or_else(|| history.find(prev.direction, &query, MatchKind::Substring, 0))
        } else {
            history.find(prev.direction, &query, MatchKind::Substring, inclusive)
        };
        self.push_result(query, prev, hit, history)
    }

    /// Find the next match beyond the current one (repeated Ctrl+R / Ctrl+S),
    /// possibly switching direction
    pub fn repeat(&mut self, direction: SearchDirection, history: &History) -> SearchView {
        let mut prev = self.current().clone();
        let mut query = prev.query.clone();
        if query.is_empty() {
            match &self.last_query {
                Some(q) if !q.is_empty() => query = q.clone(),
                _ => {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.direction = direction;
                    }
                    return SearchView::Unchanged;
                }
            }
        }
        prev.direction = direction;
        let hit = history.find(direction, &query, MatchKind::Substring, self.anchor());
        self.push_result(query, prev, hit, history)
    }

    fn push_result(
        &mut self,
        query: String,
        prev: SearchFrame,
        hit: Option<(usize, usize)>,
        history: &History,
    ) -> SearchView {
        match hit {
            Some((index, match_at)) => {
                self.frames.push(SearchFrame {
                    query,
                    found: Some(index),
                    match_at,
                    failed: false,
                    direction: prev.direction,
                });
                match history.get(index) {
                    Some(entry) => SearchView::Found {
                        line: entry.line.clone(),
                        cursor: match_at,
                    },
                    None => SearchView::Unchanged,
                }
            }
            None => {
                self.frames.push(SearchFrame {
                    query,
                    failed: true,
                    ..prev
                });
                SearchView::Unchanged
            }
        }
    }

    /// Undo the last search step
    pub fn backspace(&mut self, history: &History) -> SearchView {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        let frame = self.current();
        match frame.found.and_then(|i| history.get(i)) {
            Some(entry) => SearchView::Found {
                line: entry.line.clone(),
                cursor: frame.match_at,
            },
            None => SearchView::Original,
        }
    }

    /// The entry shown when the search ends, for positioning history
    /// navigation
    pub fn found(&self) -> Option<usize> {
        self.current().found
    }
}
