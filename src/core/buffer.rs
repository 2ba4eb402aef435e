//! EditBuffer: the text being edited, plus cursor, selection and mark
//!
//! Uses a ropey Rope for the text. All offsets are char indices, which is
//! what ropey indexes by natively; line segmentation comes from the rope's
//! own line index, so it is always in sync with the text.

use std::ops::Range;

use ropey::Rope;

use crate::error::{EditError, Result};

/// Active selection: `anchor` is where it started, `length` is signed so the
/// cursor end can be on either side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub length: isize,
}

impl Selection {
    pub fn range(&self) -> Range<usize> {
        let end = self.anchor as isize + self.length;
        if self.length >= 0 {
            self.anchor..end as usize
        } else {
            end.max(0) as usize..self.anchor
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    rope: Rope,
    cursor: usize,
    selection: Option<Selection>,
    /// Emacs mark, independent of the selection
    mark: Option<usize>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the cursor at the end
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let cursor = rope.len_chars();
        Self {
            rope,
            cursor,
            selection: None,
            mark: None,
        }
    }

    // ==================== Content Access ====================

    /// Length in chars
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn chars(&self) -> Vec<char> {
        self.rope.chars().collect()
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.rope.get_char(pos)
    }

    /// Text in `range`, clamped to the buffer
    pub fn slice(&self, range: Range<usize>) -> String {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        self.rope.slice(start..end).to_string()
    }

    // ==================== Cursor ====================

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamping to `[0, len]`
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.len());
    }

    /// Host-facing variant of [`EditBuffer::set_cursor`] that accepts any
    /// signed offset and clamps it
    pub fn set_cursor_position(&mut self, pos: isize) {
        self.set_cursor(pos.max(0) as usize);
    }

    // ==================== Line Operations ====================

    /// Number of logical lines (an empty buffer has one)
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line index containing `pos`
    pub fn line_of(&self, pos: usize) -> usize {
        self.rope.char_to_line(pos.min(self.len()))
    }

    /// First char of `line`
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line)
    }

    /// Offset of the line's terminating newline, or the buffer end
    pub fn line_end(&self, line: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        let start = self.rope.line_to_char(line);
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
        }
        start + len
    }

    /// Start..end of the logical line around `pos`, newline excluded
    pub fn line_range_at(&self, pos: usize) -> Range<usize> {
        let line = self.line_of(pos);
        self.line_start(line)..self.line_end(line)
    }

    /// Column of `pos` within its line
    pub fn column_of(&self, pos: usize) -> usize {
        let pos = pos.min(self.len());
        pos - self.line_start(self.line_of(pos))
    }

    // ==================== Editing Operations ====================

    /// Insert at the cursor and move the cursor past the inserted text
    pub fn insert(&mut self, text: &str) {
        let at = self.cursor;
        self.insert_at(at, text);
        self.cursor = at + text.chars().count();
    }

    /// Insert at `pos` without moving the cursor relative to the text after it
    pub fn insert_at(&mut self, pos: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let pos = pos.min(self.len());
        let added = text.chars().count();
        self.rope.insert(pos, text);
        if self.cursor > pos {
            self.cursor += added;
        }
        if let Some(mark) = self.mark.as_mut() {
            if *mark > pos {
                *mark += added;
            }
        }
        self.selection = None;
    }

    /// Remove `range` (clamped) and return what was there.
    ///
    /// The cursor keeps its place relative to the surrounding text.
    pub fn remove(&mut self, range: Range<usize>) -> String {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        if start == end {
            return String::new();
        }
        let removed = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);

        let shift = |pos: usize| {
            if pos >= end {
                pos - (end - start)
            } else if pos > start {
                start
            } else {
                pos
            }
        };
        self.cursor = shift(self.cursor);
        self.mark = self.mark.map(shift);
        self.selection = None;
        removed
    }

    /// Replace the whole text, cursor at the end
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = self.rope.len_chars();
        self.selection = None;
        self.mark = None;
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    /// Validate a signed `(start, length)` pair against the buffer
    pub fn check_range(&self, start: isize, length: isize) -> Result<Range<usize>> {
        let len = self.len();
        let out_of_range = EditError::OutOfRange {
            start,
            length,
            buffer_len: len,
        };
        if start < 0 || length < 0 {
            return Err(out_of_range);
        }
        let (start_u, length_u) = (start as usize, length as usize);
        match start_u.checked_add(length_u) {
            Some(end) if start_u <= len && end <= len => Ok(start_u..end),
            _ => Err(out_of_range),
        }
    }

    /// Delete `length` chars at `start`; the cursor lands on `start`
    pub fn delete(&mut self, start: isize, length: isize) -> Result<String> {
        let range = self.check_range(start, length)?;
        let removed = self.remove(range.clone());
        self.cursor = range.start;
        Ok(removed)
    }

    /// Splice `text` over `length` chars at `start`; the cursor lands after
    /// the inserted text
    pub fn replace(&mut self, start: isize, length: isize, text: &str) -> Result<()> {
        let range = self.check_range(start, length)?;
        self.remove(range.clone());
        self.insert_at(range.start, text);
        self.cursor = range.start + text.chars().count();
        Ok(())
    }

    // ==================== Selection and Mark ====================

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn selection_range(&self) -> Option<Range<usize>> {
        self.selection.map(|s| s.range()).filter(|r| !r.is_empty())
    }

    /// `(start, length)` of the selection, `(-1, -1)` when there is none
    pub fn selection_state(&self) -> (isize, isize) {
        match self.selection_range() {
            Some(r) => (r.start as isize, (r.end - r.start) as isize),
            None => (-1, -1),
        }
    }

    /// Extend (or start) the selection so that it ends at `pos`, and move the
    /// cursor there
    pub fn select_to(&mut self, pos: usize) {
        let pos = pos.min(self.len());
        let anchor = self.selection.map(|s| s.anchor).unwrap_or(self.cursor);
        self.selection = Some(Selection {
            anchor,
            length: pos as isize - anchor as isize,
        });
        self.cursor = pos;
    }

    pub fn set_selection(&mut self, anchor: usize, length: isize) {
        let anchor = anchor.min(self.len());
        let end = (anchor as isize + length).clamp(0, self.len() as isize);
        self.selection = Some(Selection {
            anchor,
            length: end - anchor as isize,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    pub fn set_mark(&mut self, pos: Option<usize>) {
        self.mark = pos.map(|p| p.min(self.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_line_feed_breaks_lines() {
        let mut buf = EditBuffer::new();
        buf.insert("a\rb\u{2028}c\nd");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.line_range_at(2), 0..5);
        assert_eq!(buf.line_range_at(6), 6..7);
    }

    #[test]
    fn test_insert_moves_cursor() {
        let mut buf = EditBuffer::new();
        buf.insert("héllo");
        assert_eq!(buf.text(), "héllo");
        assert_eq!(buf.cursor(), 5);
        buf.set_cursor(1);
        buf.insert("漢");
        assert_eq!(buf.text(), "h漢éllo");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_replace_places_cursor_after_insert() {
        let mut buf = EditBuffer::from_text("hello world");
        buf.replace(6, 5, "there!").unwrap();
        assert_eq!(buf.text(), "hello there!");
        assert_eq!(buf.cursor(), 12);
    }

    #[test]
    fn test_delete_and_bounds() {
        let mut buf = EditBuffer::from_text("abcdef");
        assert_eq!(buf.delete(1, 2).unwrap(), "bc");
        assert_eq!(buf.text(), "adef");
        assert_eq!(buf.cursor(), 1);

        for (start, length) in [(-1, 1), (5, 0), (2, 3), (0, -1), (isize::MAX, 1)] {
            let err = buf.delete(start, length).unwrap_err();
            assert!(matches!(err, EditError::OutOfRange { .. }));
            assert!(buf.replace(start, length, "x").is_err());
        }
        assert_eq!(buf.text(), "adef");
        // end of buffer with zero length is valid
        assert!(buf.delete(4, 0).is_ok());
    }

    #[test]
    fn test_set_cursor_position_clamps() {
        let mut buf = EditBuffer::from_text("abc");
        buf.set_cursor_position(-5);
        assert_eq!(buf.cursor(), 0);
        buf.set_cursor_position(99);
        assert_eq!(buf.cursor(), 3);
    }

    #[test]
    fn test_remove_adjusts_cursor_and_mark() {
        let mut buf = EditBuffer::from_text("0123456789");
        buf.set_cursor(8);
        buf.set_mark(Some(4));
        buf.remove(2..6);
        assert_eq!(buf.text(), "016789");
        assert_eq!(buf.cursor(), 4);
        assert_eq!(buf.mark(), Some(2));
    }

    #[test]
    fn test_lines() {
        let buf = EditBuffer::from_text("one\ntwo\n\nfour");
        assert_eq!(buf.line_count(), 4);
        assert_eq!(buf.line_of(5), 1);
        assert_eq!(buf.line_range_at(5), 4..7);
        assert_eq!(buf.line_range_at(8), 8..8);
        assert_eq!(buf.line_range_at(buf.len()), 9..13);
        assert_eq!(buf.column_of(6), 2);
    }

    #[test]
    fn test_selection_state() {
        let mut buf = EditBuffer::from_text("hello");
        assert_eq!(buf.selection_state(), (-1, -1));
        buf.set_cursor(4);
        buf.select_to(1);
        assert_eq!(buf.selection_state(), (1, 3));
        assert_eq!(buf.cursor(), 1);
        buf.select_to(5);
        assert_eq!(buf.selection_state(), (4, 1));
        buf.insert("!");
        assert_eq!(buf.selection_state(), (-1, -1));
    }
}
