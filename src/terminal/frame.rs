//! Logical frame: what the prompt, the input and everything drawn below it
//! look like, cell by cell, independent of what is on screen now.
//!
//! Row 0 is the prompt row. Rows wrap at the terminal width; a wide
//! grapheme that does not fit in the last column moves to the next row.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::core::colorizer::TokenKind;
use crate::terminal::color::{Color, Palette};
use crate::terminal::suggestion::ListEntryLine;
use crate::terminal::width::{control_caret, grapheme_width};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub symbol: String,
    pub fg: Color,
    pub bg: Color,
    /// If true, this cell is covered by the previous wide symbol and should be skipped
    pub hidden: bool,
}

impl Cell {
    pub fn new(symbol: &str, fg: Color, bg: Color) -> Self {
        Self {
            symbol: symbol.to_string(),
            fg,
            bg,
            hidden: false,
        }
    }

    pub fn hidden() -> Self {
        Self {
            symbol: String::new(),
            fg: Color::Reset,
            bg: Color::Reset,
            hidden: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<Vec<Cell>>,
    /// (row, column) of the cursor
    pub cursor: (usize, usize),
}

impl Frame {
    pub fn row_text(&self, row: usize) -> String {
        self.rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .filter(|c| !c.hidden)
                    .map(|c| c.symbol.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        (0..self.rows.len()).map(|r| self.row_text(r)).collect()
    }
}

/// Everything the frame shows
#[derive(Debug, Clone, Default)]
pub struct FrameSpec<'a> {
    pub prompt: &'a str,
    pub continuation_prompt: &'a str,
    pub text: &'a str,
    /// Cursor, in chars of `text`
    pub cursor: usize,
    /// Token kind per char of `text`
    pub kinds: &'a [TokenKind],
    pub selection: Option<Range<usize>>,
    /// Dimmed text drawn right after the input
    pub inline_suggestion: Option<&'a str>,
    /// Line below the input (search prompt, messages)
    pub status: Option<&'a str>,
    pub list: &'a [ListEntryLine],
    pub list_selected: Option<usize>,
    /// Completion listing, already split into rows
    pub menu: &'a [String],
}

struct FrameBuilder {
    width: usize,
    rows: Vec<Vec<Cell>>,
    col: usize,
}

impl FrameBuilder {
    fn new(width: usize) -> Self {
        Self {
            width: width.max(2),
            rows: vec![Vec::new()],
            col: 0,
        }
    }

    fn row(&self) -> usize {
        self.rows.len() - 1
    }

    fn newline(&mut self) {
        self.rows.push(Vec::new());
        self.col = 0;
    }

    /// Where the next symbol lands, resolving a pending wrap
    fn cursor_here(&self) -> (usize, usize) {
        if self.col >= self.width {
            (self.row() + 1, 0)
        } else {
            (self.row(), self.col)
        }
    }

    fn put(&mut self, symbol: &str, width: usize, fg: Color, bg: Color) {
        if width == 0 {
            // combining leftovers stick to the cell before them
            if let Some(cell) = self.rows.last_mut().and_then(|r| r.iter_mut().rev().find(|c| !c.hidden)) {
                cell.symbol.push_str(symbol);
            }
            return;
        }
        if self.col + width > self.width && self.col > 0 {
            self.newline();
        }
        let row = self.rows.len() - 1;
        self.rows[row].push(Cell::new(symbol, fg, bg));
        for _ in 1..width {
            self.rows[row].push(Cell::hidden());
        }
        self.col += width;
    }

    fn put_grapheme(&mut self, g: &str, fg: Color, bg: Color) {
        match control_caret(g) {
            Some(caret) => self.put(&caret, 2, fg, bg),
            None => self.put(g, grapheme_width(g), fg, bg),
        }
    }

    fn put_str(&mut self, s: &str, fg: Color, bg: Color) {
        for g in s.graphemes(true) {
            self.put_grapheme(g, fg, bg);
        }
    }
}

/// Lay `spec` out for a terminal `width` columns wide
pub fn layout(spec: &FrameSpec<'_>, palette: &Palette, width: usize) -> Frame {
    let mut b = FrameBuilder::new(width);
    b.put_str(spec.prompt, palette.prompt, Color::Reset);

    let mut cursor = None;
    let mut index = 0;
    for g in spec.text.graphemes(true) {
        let n = g.chars().count();
        if cursor.is_none() && spec.cursor < index + n {
            cursor = Some(b.cursor_here());
        }
        if g == "\n" || g == "\r\n" {
            b.newline();
            b.put_str(spec.continuation_prompt, palette.continuation_prompt, Color::Reset);
        } else {
            let selected = spec.selection.as_ref().is_some_and(|r| r.contains(&index));
            let (fg, bg) = if selected {
                (palette.selection_fg, palette.selection_bg)
            } else {
                let kind = spec.kinds.get(index).copied().unwrap_or_default();
                (palette.token(kind), Color::Reset)
            };
            b.put_grapheme(g, fg, bg);
        }
        index += n;
    }
    let cursor = cursor.unwrap_or_else(|| b.cursor_here());

    if let Some(tail) = spec.inline_suggestion {
        b.put_str(tail, palette.inline_prediction, Color::Reset);
    }
    // a pending wrap owns the next row; rows below start after it
    while b.row() < cursor.0 {
        b.newline();
    }

    if let Some(status) = spec.status {
        b.newline();
        b.put_str(status, palette.status, Color::Reset);
    }
    for (i, line) in spec.list.iter().enumerate() {
        b.newline();
        let bg = if spec.list_selected == Some(i) {
            palette.selection_bg
        } else {
            Color::Reset
        };
        for (ci, ch) in line.text.chars().enumerate() {
            let fg = if line.highlight.as_ref().is_some_and(|r| r.contains(&ci)) {
                palette.list_highlight
            } else if line.source.as_ref().is_some_and(|r| r.contains(&ci)) {
                palette.list_source
            } else {
                palette.default
            };
            let mut buf = [0u8; 4];
            b.put_grapheme(ch.encode_utf8(&mut buf), fg, bg);
        }
    }
    for row in spec.menu {
        b.newline();
        b.put_str(row, palette.default, Color::Reset);
    }

    Frame {
        rows: b.rows,
        cursor,
    }
}
