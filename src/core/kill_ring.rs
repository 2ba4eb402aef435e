use std::collections::VecDeque;

/// Maximum size of a single kill ring entry (10 MB)
const MAX_KILL_SIZE: usize = 10 * 1024 * 1024;

/// Which side of the previous kill a merged kill goes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillDirection {
    /// Killed text follows the previous kill (kill-line, kill-word)
    Forward,
    /// Killed text precedes it (backward-kill-word, unix-word-rubout)
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillRingEntry {
    pub text: String,
    /// Set once a later adjacent kill was merged into this entry
    pub appended: bool,
}

/// Kill ring for storing cut/copied text
#[derive(Debug, Clone)]
pub struct KillRing {
    /// Oldest entry first
    ring: VecDeque<KillRingEntry>,
    /// Maximum size of the ring
    max_size: usize,
    /// Index of the entry the last yank/yank-pop produced
    yank_index: usize,
    /// Whether the last action was a kill (for appending)
    last_action_was_kill: bool,
}

impl Default for KillRing {
    fn default() -> Self {
        Self::with_size(10)
    }
}

impl KillRing {
    /// Create a new kill ring with specified size
    pub fn with_size(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            ring: VecDeque::with_capacity(max_size),
            max_size,
            yank_index: 0,
            last_action_was_kill: false,
        }
    }

    /// Record killed text.
    ///
    /// A kill that directly follows another kill merges into the newest
    /// entry. Empty text is ignored entirely, including for the merge state.
    /// Text larger than MAX_KILL_SIZE is rejected to prevent OOM.
    pub fn kill(&mut self, text: &str, direction: KillDirection) {
        if text.is_empty() || text.len() > MAX_KILL_SIZE {
            return;
        }

        if self.last_action_was_kill {
            if let Some(last) = self.ring.back_mut() {
                if last.text.len() + text.len() <= MAX_KILL_SIZE {
                    match direction {
                        KillDirection::Forward => last.text.push_str(text),
                        KillDirection::Backward => last.text.insert_str(0, text),
                    }
                    last.appended = true;
                }
                self.yank_index = self.ring.len() - 1;
                return;
            }
        }

        self.push_entry(text);
        self.last_action_was_kill = true;
    }

    /// Record text as its own entry, never merging (copies, Vi yanks)
    pub fn kill_new(&mut self, text: &str) {
        self.end_kill_sequence();
        if text.is_empty() || text.len() > MAX_KILL_SIZE {
            return;
        }
        self.push_entry(text);
    }

    fn push_entry(&mut self, text: &str) {
        while self.ring.len() >= self.max_size {
            self.ring.pop_front(); // Remove oldest
        }
        self.ring.push_back(KillRingEntry {
            text: text.to_string(),
            appended: false,
        });
        self.yank_index = self.ring.len() - 1;
    }

    /// Newest entry; resets the yank-pop position to it
    pub fn yank(&mut self) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        self.yank_index = self.ring.len() - 1;
        self.ring.get(self.yank_index).map(|e| e.text.as_str())
    }

    /// Step to the previous entry, wrapping past the oldest back to the newest
    pub fn yank_pop(&mut self) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        self.yank_index = if self.yank_index == 0 {
            self.ring.len() - 1
        } else {
            self.yank_index - 1
        };
        self.ring.get(self.yank_index).map(|e| e.text.as_str())
    }

    /// Reset the "last action was kill" state
    pub fn end_kill_sequence(&mut self) {
        self.last_action_was_kill = false;
    }

    pub fn clear(&mut self) {
        self.ring.clear();
        self.yank_index = 0;
        self.last_action_was_kill = false;
    }

    pub fn set_capacity(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        while self.ring.len() > self.max_size {
            self.ring.pop_front();
        }
        self.yank_index = self.ring.len().saturating_sub(1);
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &KillRingEntry> {
        self.ring.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_and_yank() {
        let mut kr = KillRing::default();
        kr.kill("hello", KillDirection::Forward);
        assert_eq!(kr.yank(), Some("hello"));

        kr.end_kill_sequence();
        kr.kill("world", KillDirection::Forward);
        assert_eq!(kr.yank(), Some("world"));
        assert_eq!(kr.len(), 2);
    }

    #[test]
    fn test_adjacent_kills_merge() {
        let mut kr = KillRing::default();
        kr.kill("hello", KillDirection::Forward);
        kr.kill(" world", KillDirection::Forward);
        kr.kill(">> ", KillDirection::Backward);
        assert_eq!(kr.len(), 1);
        assert_eq!(kr.yank(), Some(">> hello world"));
        assert!(kr.entries().next().unwrap().appended);
    }

    #[test]
    fn test_empty_kill_is_ignored() {
        let mut kr = KillRing::default();
        kr.kill("", KillDirection::Forward);
        assert!(kr.is_empty());

        kr.kill("a", KillDirection::Forward);
        kr.end_kill_sequence();
        kr.kill("", KillDirection::Forward);
        // the empty kill must not re-arm merging
        kr.kill("b", KillDirection::Forward);
        assert_eq!(kr.len(), 2);
    }

    #[test]
    fn test_yank_pop_wraps() {
        let mut kr = KillRing::with_size(3);
        for text in ["one", "two", "three"] {
            kr.kill_new(text);
        }
        assert_eq!(kr.yank(), Some("three"));
        assert_eq!(kr.yank_pop(), Some("two"));
        assert_eq!(kr.yank_pop(), Some("one"));
        assert_eq!(kr.yank_pop(), Some("three"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut kr = KillRing::with_size(2);
        kr.kill_new("a");
        kr.kill_new("b");
        kr.kill_new("c");
        let texts: Vec<_> = kr.entries().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["b", "c"]);
        kr.set_capacity(1);
        assert_eq!(kr.yank(), Some("c"));
    }

    #[test]
    fn test_oversized_kill_rejected() {
        let mut kr = KillRing::default();
        let huge = "x".repeat(MAX_KILL_SIZE + 1);
        kr.kill(&huge, KillDirection::Forward);
        assert!(kr.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut kr = KillRing::default();
        kr.kill("x", KillDirection::Forward);
        kr.clear();
        assert_eq!(kr.yank(), None);
        assert_eq!(kr.yank_pop(), None);
    }
}
