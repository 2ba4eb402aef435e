//! Undo/redo for one read-line call
//!
//! Frames are whole-buffer snapshots `(text, cursor)` taken *before* an
//! edit. Consecutive typed characters share one frame, and a group (a Vi
//! operator, a Vi insert session) collapses into a single frame that is only
//! kept when the text actually changed.

use std::collections::VecDeque;

/// Maximum undo stack depth to prevent unbounded growth on long inputs
const MAX_UNDO_DEPTH: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoFrame {
    pub text: String,
    pub cursor: usize,
}

impl UndoFrame {
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        Self {
            text: text.into(),
            cursor,
        }
    }
}

/// What kind of edit is being recorded; runs of `SelfInsert` coalesce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    SelfInsert,
    Other,
}

#[derive(Debug, Default)]
pub struct UndoStack {
    undo: VecDeque<UndoFrame>,
    redo: Vec<UndoFrame>,
    last_kind: Option<EditKind>,
    group_depth: usize,
    group_start: Option<UndoFrame>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, frame: UndoFrame) {
        if self.undo.len() >= MAX_UNDO_DEPTH {
            self.undo.pop_front();
        }
        self.undo.push_back(frame);
        self.redo.clear();
    }

    /// Record the state before an edit of `kind`
    pub fn record(&mut self, before: UndoFrame, kind: EditKind) {
        if self.group_depth > 0 {
            return;
        }
        let coalesce = kind == EditKind::SelfInsert && self.last_kind == Some(EditKind::SelfInsert);
        if !coalesce {
            self.push(before);
        }
        self.last_kind = Some(kind);
    }

    /// The next typed character starts a new frame
    pub fn break_sequence(&mut self) {
        self.last_kind = None;
    }

    pub fn begin_group(&mut self, before: UndoFrame) {
        if self.group_depth == 0 {
            self.group_start = Some(before);
        }
        self.group_depth += 1;
    }

    /// Close a group; returns whether a frame was kept
    pub fn end_group(&mut self, after: &UndoFrame) -> bool {
        if self.group_depth == 0 {
            return false;
        }
        self.group_depth -= 1;
        if self.group_depth > 0 {
            return false;
        }
        self.last_kind = None;
        match self.group_start.take() {
            Some(start) if start.text != after.text => {
                self.push(start);
                true
            }
            _ => false,
        }
    }

    pub fn in_group(&self) -> bool {
        self.group_depth > 0
    }

    /// Pop the newest frame, saving `current` for redo
    pub fn undo(&mut self, current: UndoFrame) -> Option<UndoFrame> {
        let frame = self.undo.pop_back()?;
        self.redo.push(current);
        self.last_kind = None;
        Some(frame)
    }

    pub fn redo(&mut self, current: UndoFrame) -> Option<UndoFrame> {
        let frame = self.redo.pop()?;
        self.undo.push_back(current);
        self.last_kind = None;
        Some(frame)
    }

    /// The oldest frame, i.e. the line as it was before any edit
    pub fn oldest(&self) -> Option<&UndoFrame> {
        self.undo.front()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> UndoFrame {
        UndoFrame::new(text, text.chars().count())
    }

    #[test]
    fn test_typing_coalesces_into_one_frame() {
        let mut stack = UndoStack::new();
        stack.record(frame(""), EditKind::SelfInsert);
        stack.record(frame("a"), EditKind::SelfInsert);
        stack.record(frame("ab"), EditKind::SelfInsert);
        assert_eq!(stack.undo(frame("abc")), Some(frame("")));
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_break_sequence_starts_new_frame() {
        let mut stack = UndoStack::new();
        stack.record(frame(""), EditKind::SelfInsert);
        stack.break_sequence();
        stack.record(frame("a"), EditKind::SelfInsert);
        assert_eq!(stack.undo(frame("ab")), Some(frame("a")));
        assert_eq!(stack.undo(frame("a")), Some(frame("")));
    }

    #[test]
    fn test_redo_cleared_by_new_edit() {
        let mut stack = UndoStack::new();
        stack.record(frame("x"), EditKind::Other);
        let restored = stack.undo(frame("xy")).unwrap();
        assert_eq!(restored, frame("x"));
        assert!(stack.can_redo());
        assert_eq!(stack.redo(frame("x")), Some(frame("xy")));

        stack.undo(frame("xy"));
        stack.record(frame("x"), EditKind::Other);
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_group_collapses_and_drops_noop() {
        let mut stack = UndoStack::new();
        stack.begin_group(frame("abc"));
        stack.record(frame("abc"), EditKind::Other);
        stack.record(frame("ab"), EditKind::SelfInsert);
        assert!(stack.end_group(&frame("abX")));
        assert_eq!(stack.undo(frame("abX")), Some(frame("abc")));
        assert!(!stack.can_undo());

        stack.begin_group(frame("q"));
        assert!(!stack.end_group(&frame("q")));
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_nested_groups() {
        let mut stack = UndoStack::new();
        stack.begin_group(frame("1"));
        stack.begin_group(frame("2"));
        assert!(!stack.end_group(&frame("3")));
        assert!(stack.in_group());
        assert!(stack.end_group(&frame("3")));
        assert_eq!(stack.undo(frame("3")), Some(frame("1")));
    }
}
