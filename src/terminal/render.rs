//! Terminal rendering module
//!
//! Diffs the new [`Frame`] against the one on screen and produces the
//! smallest [`ScreenDelta`] that turns one into the other. Frames are
//! positioned relative to the row the prompt started on, which moves up
//! when the input grows past the bottom of the screen and the terminal
//! scrolls.

use std::fmt;

use crossterm::Command as AnsiCommand;
use crossterm::{cursor, terminal};

use crate::terminal::color::Color;
use crate::terminal::frame::{Cell, Frame};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOp {
    MoveTo { row: u16, col: u16 },
    SetColors { fg: Color, bg: Color },
    ResetColors,
    Print(String),
    ClearToEndOfLine,
    /// Clear from the cursor to the end of the screen
    ClearBelow,
    ClearScreen,
    ScrollUp(u16),
    HideCursor,
    ShowCursor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenDelta {
    pub ops: Vec<DeltaOp>,
}

impl ScreenDelta {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of cells printed, for measuring how minimal a delta is
    pub fn printed(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DeltaOp::Print(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn write_ansi(&self, out: &mut impl fmt::Write) -> fmt::Result {
        for op in &self.ops {
            match op {
                DeltaOp::MoveTo { row, col } => cursor::MoveTo(*col, *row).write_ansi(out)?,
                DeltaOp::SetColors { fg, bg } => out.write_str(&Color::sgr(*fg, *bg))?,
                DeltaOp::ResetColors => out.write_str("\x1b[0m")?,
                DeltaOp::Print(s) => out.write_str(s)?,
                DeltaOp::ClearToEndOfLine => {
                    terminal::Clear(terminal::ClearType::UntilNewLine).write_ansi(out)?
                }
                DeltaOp::ClearBelow => {
                    terminal::Clear(terminal::ClearType::FromCursorDown).write_ansi(out)?
                }
                DeltaOp::ClearScreen => {
                    terminal::Clear(terminal::ClearType::All).write_ansi(out)?;
                    cursor::MoveTo(0, 0).write_ansi(out)?
                }
                DeltaOp::ScrollUp(n) => terminal::ScrollUp(*n).write_ansi(out)?,
                DeltaOp::HideCursor => cursor::Hide.write_ansi(out)?,
                DeltaOp::ShowCursor => cursor::Show.write_ansi(out)?,
            }
        }
        Ok(())
    }

    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        // fmt::Write for String never fails
        let _ = self.write_ansi(&mut out);
        out
    }
}

/// Keeps the frame currently on screen and diffs new frames against it
#[derive(Debug, Clone)]
pub struct Renderer {
    previous: Option<Frame>,
    width: usize,
    height: usize,
    /// Screen row of frame row 0
    origin_row: usize,
    full_repaint: bool,
    clear_screen: bool,
}

impl Renderer {
    pub fn new(width: u16, height: u16, origin_row: u16) -> Self {
        Self {
            previous: None,
            width: width.max(1) as usize,
            height: height.max(1) as usize,
            origin_row: origin_row as usize,
            full_repaint: true,
            clear_screen: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn origin_row(&self) -> usize {
        self.origin_row
    }

    /// New terminal dimensions; the next render repaints everything
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width.max(1) as usize;
        self.height = height.max(1) as usize;
        self.origin_row = self.origin_row.min(self.height - 1);
        self.full_repaint = true;
    }

    /// Clear the screen and draw the next frame at the top
    pub fn request_clear(&mut self) {
        self.clear_screen = true;
        self.full_repaint = true;
    }

    pub fn render(&mut self, frame: &Frame) -> ScreenDelta {
        let mut ops = vec![DeltaOp::HideCursor];

        if self.clear_screen {
            ops.push(DeltaOp::ClearScreen);
            self.origin_row = 0;
            self.clear_screen = false;
        }

        let needed = frame.rows.len();
        let overflow = (self.origin_row + needed).saturating_sub(self.height);
        let scroll = overflow.min(self.origin_row);
        if scroll > 0 {
            ops.push(DeltaOp::ScrollUp(scroll as u16));
            self.origin_row -= scroll;
        }

        let full = self.full_repaint || self.previous.is_none();
        if full {
            ops.push(self.move_to(0, 0));
            ops.push(DeltaOp::ResetColors);
            ops.push(DeltaOp::ClearBelow);
        }

        let empty = Frame::default();
        let previous = match &self.previous {
            Some(p) if !full => p,
            _ => &empty,
        };

        let rows = needed.max(previous.rows.len());
        for r in 0..rows {
            if self.origin_row + r >= self.height {
                break;
            }
            let new_row = frame.rows.get(r).map(Vec::as_slice).unwrap_or(&[]);
            let old_row = previous.rows.get(r).map(Vec::as_slice).unwrap_or(&[]);
            self.diff_row(r, new_row, old_row, &mut ops);
        }

        let (cursor_row, cursor_col) = frame.cursor;
        let row = (self.origin_row + cursor_row).min(self.height - 1);
        ops.push(DeltaOp::MoveTo {
            row: row as u16,
            col: cursor_col.min(self.width - 1) as u16,
        });
        ops.push(DeltaOp::ShowCursor);

        self.previous = Some(frame.clone());
        self.full_repaint = false;
        ScreenDelta { ops }
    }

    fn move_to(&self, row: usize, col: usize) -> DeltaOp {
        DeltaOp::MoveTo {
            row: (self.origin_row + row).min(self.height - 1) as u16,
            col: col as u16,
        }
    }

    fn diff_row(&self, r: usize, new: &[Cell], old: &[Cell], ops: &mut Vec<DeltaOp>) {
        let Some(mut first) = (0..new.len().max(old.len())).find(|&i| new.get(i) != old.get(i)) else {
            return;
        };
        // never start in the middle of a wide symbol
        while first > 0 && (new.get(first).is_some_and(|c| c.hidden) || old.get(first).is_some_and(|c| c.hidden)) {
            first -= 1;
        }
        let last = (0..new.len())
            .rev()
            .find(|&i| new.get(i) != old.get(i))
            .map_or(first, |i| i + 1);

        if first < new.len() {
            ops.push(self.move_to(r, first));
            push_cells(&new[first..last.max(first).min(new.len())], ops);
        } else {
            ops.push(self.move_to(r, new.len()));
        }
        if old.len() > new.len() {
            if first < new.len() && last < new.len() {
                ops.push(self.move_to(r, new.len()));
            }
            ops.push(DeltaOp::ResetColors);
            ops.push(DeltaOp::ClearToEndOfLine);
        }
    }

    /// Leave the cursor on a fresh line after the input of `frame`, which
    /// should be the frame last rendered
    pub fn finish(&mut self, frame: &Frame) -> ScreenDelta {
        let last = frame
            .rows
            .iter()
            .rposition(|r| !r.is_empty())
            .unwrap_or(0)
            .max(frame.cursor.0.min(frame.rows.len().saturating_sub(1)));
        let col = frame.rows.get(last).map_or(0, Vec::len).min(self.width - 1);
        let ops = vec![
            self.move_to(last, col),
            DeltaOp::ResetColors,
            DeltaOp::Print("\r\n".to_string()),
            DeltaOp::ShowCursor,
        ];
        self.previous = None;
        self.full_repaint = true;
        ScreenDelta { ops }
    }
}

fn push_cells(cells: &[Cell], ops: &mut Vec<DeltaOp>) {
    let mut colors: Option<(Color, Color)> = None;
    let mut text = String::new();
    for cell in cells.iter().filter(|c| !c.hidden) {
        if colors != Some((cell.fg, cell.bg)) {
            if !text.is_empty() {
                ops.push(DeltaOp::Print(std::mem::take(&mut text)));
            }
            ops.push(DeltaOp::SetColors {
                fg: cell.fg,
                bg: cell.bg,
            });
            colors = Some((cell.fg, cell.bg));
        }
        text.push_str(&cell.symbol);
    }
    if !text.is_empty() {
        ops.push(DeltaOp::Print(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::color::Palette;
    use crate::terminal::frame::{FrameSpec, layout};

    fn frame(text: &str, cursor: usize, width: usize) -> Frame {
        layout(
            &FrameSpec {
                prompt: "> ",
                continuation_prompt: ".. ",
                text,
                cursor,
                ..Default::default()
            },
            &Palette::default(),
            width,
        )
    }

    #[test]
    fn test_first_render_paints_everything() {
        let mut r = Renderer::new(20, 10, 3);
        let delta = r.render(&frame("ls", 2, 20));
        assert_eq!(delta.printed(), "> ls");
        assert!(delta.ops.contains(&DeltaOp::ClearBelow));
        assert_eq!(
            delta.ops[delta.ops.len() - 2],
            DeltaOp::MoveTo { row: 3, col: 4 }
        );
    }

    #[test]
    fn test_append_prints_only_new_cells() {
        let mut r = Renderer::new(20, 10, 0);
        r.render(&frame("ls", 2, 20));
        let delta = r.render(&frame("ls -l", 5, 20));
        assert_eq!(delta.printed(), " -l");
        assert!(delta.ops.contains(&DeltaOp::MoveTo { row: 0, col: 4 }));
    }

    #[test]
    fn test_cursor_move_prints_nothing() {
        let mut r = Renderer::new(20, 10, 0);
        r.render(&frame("abc", 3, 20));
        let delta = r.render(&frame("abc", 1, 20));
        assert_eq!(delta.printed(), "");
        assert!(delta.ops.contains(&DeltaOp::MoveTo { row: 0, col: 3 }));
    }

    #[test]
    fn test_shrinking_row_is_cleared() {
        let mut r = Renderer::new(20, 10, 0);
        r.render(&frame("abcdef", 6, 20));
        let delta = r.render(&frame("abc", 3, 20));
        assert_eq!(delta.printed(), "");
        assert!(delta.ops.contains(&DeltaOp::ClearToEndOfLine));
    }

    #[test]
    fn test_removed_rows_are_cleared() {
        let mut r = Renderer::new(20, 10, 0);
        r.render(&frame("a\nb", 3, 20));
        let delta = r.render(&frame("a", 1, 20));
        assert!(delta.ops.contains(&DeltaOp::MoveTo { row: 1, col: 0 }));
        assert!(delta.ops.contains(&DeltaOp::ClearToEndOfLine));
    }

    #[test]
    fn test_resize_forces_full_repaint() {
        let mut r = Renderer::new(20, 10, 0);
        r.render(&frame("abc", 3, 20));
        r.resize(30, 10);
        let delta = r.render(&frame("abc", 3, 30));
        assert_eq!(delta.printed(), "> abc");
    }

    #[test]
    fn test_overflow_scrolls_origin_up() {
        let mut r = Renderer::new(10, 3, 2);
        let delta = r.render(&frame("a\nb\nc", 5, 10));
        assert!(delta.ops.contains(&DeltaOp::ScrollUp(2)));
        assert_eq!(r.origin_row(), 0);
    }

    #[test]
    fn test_clear_screen_moves_origin_to_top() {
        let mut r = Renderer::new(10, 5, 3);
        r.render(&frame("x", 1, 10));
        r.request_clear();
        let delta = r.render(&frame("x", 1, 10));
        assert_eq!(delta.ops[1], DeltaOp::ClearScreen);
        assert_eq!(r.origin_row(), 0);
    }

    #[test]
    fn test_ansi_output() {
        let delta = ScreenDelta {
            ops: vec![
                DeltaOp::MoveTo { row: 0, col: 2 },
                DeltaOp::Print("x".into()),
                DeltaOp::ClearToEndOfLine,
            ],
        };
        assert_eq!(delta.to_ansi(), "\x1b[1;3Hx\x1b[K");
    }

    #[test]
    fn test_finish_moves_past_input() {
        let mut r = Renderer::new(20, 10, 4);
        let f = frame("exit", 4, 20);
        r.render(&f);
        let delta = r.finish(&f);
        assert_eq!(delta.ops[0], DeltaOp::MoveTo { row: 4, col: 6 });
        assert_eq!(delta.printed(), "\r\n");
    }
}
