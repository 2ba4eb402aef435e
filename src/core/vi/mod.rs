//! Vi modal editing
//!
//! Normal-mode keys are parsed by a small grammar instead of the flat chord
//! tables: `[count] operator [count] motion`, `[count] command`, and the
//! commands that wait for one more char (`f`, `t`, `r`, ...). Every change
//! runs inside one undo group, so `u` reverts a whole command, and the keys
//! that made it are kept for `.`.

pub mod motion;

use std::ops::Range;

use tracing::debug;

use crate::core::dispatcher::{DispatchResult, dispatch};
use crate::core::editor::LineEditor;
use crate::core::input::{KeyCode, KeyPress};
use motion::{CharSearch, Motion, Word};

/// Upper bound for typed counts
const MAX_COUNT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Change,
    Yank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViMode {
    Insert,
    Replace,
    Normal,
    OperatorPending(Operator),
    Visual,
}

/// A command waiting for its char argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    /// `f`, `t`, `F` or `T`
    Search(char),
    /// `r`
    ReplaceChar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LastChange {
    count: Option<usize>,
    /// Keys of the change, without its counts
    keys: Vec<KeyPress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InsertSession {
    count: usize,
    start: usize,
    /// Opened with `o`/`O`; repeats go on new lines
    new_line: bool,
}

#[derive(Debug, Clone)]
pub struct ViState {
    pub mode: ViMode,
    count: Option<usize>,
    /// Count typed before the operator
    op_count: Option<usize>,
    awaiting: Option<Awaiting>,
    last_search: Option<CharSearch>,
    last_change: Option<LastChange>,
    keys: Vec<KeyPress>,
    /// Count of a change that continues in insert mode
    recording: Option<Option<usize>>,
    insert: Option<InsertSession>,
    /// Chars overwritten in Replace mode, `None` where the line was extended
    replaced: Vec<Option<char>>,
    visual_anchor: usize,
}

impl ViState {
    pub fn new(start_in_insert: bool) -> Self {
        Self {
            mode: if start_in_insert {
                ViMode::Insert
            } else {
                ViMode::Normal
            },
            count: None,
            op_count: None,
            awaiting: None,
            last_search: None,
            last_change: None,
            keys: Vec::new(),
            recording: None,
            insert: start_in_insert.then_some(InsertSession {
                count: 1,
                start: 0,
                new_line: false,
            }),
            replaced: Vec::new(),
            visual_anchor: 0,
        }
    }

    /// Normal, operator-pending or visual: keys are commands, not text
    pub fn in_command_mode(&self) -> bool {
        !matches!(self.mode, ViMode::Insert | ViMode::Replace)
    }

    pub fn has_pending(&self) -> bool {
        self.count.is_some()
            || self.op_count.is_some()
            || self.awaiting.is_some()
            || matches!(self.mode, ViMode::OperatorPending(_))
    }

    /// Nothing typed towards a command yet
    pub fn is_idle(&self) -> bool {
        self.in_command_mode() && !self.has_pending()
    }

    /// Drop a partly typed command
    pub fn cancel_pending(&mut self) {
        self.count = None;
        self.op_count = None;
        self.awaiting = None;
        self.keys.clear();
        if let ViMode::OperatorPending(_) = self.mode {
            self.mode = ViMode::Normal;
        }
    }

    /// Whether keys typed in insert mode belong to a change being recorded
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn record_key(&mut self, key: KeyPress) {
        self.keys.push(key);
    }

    fn push_count_digit(&mut self, d: char) {
        let digit = d.to_digit(10).unwrap_or(0) as usize;
        let count = self.count.unwrap_or(0);
        self.count = Some((count * 10 + digit).min(MAX_COUNT));
    }

    /// Effective count of the command, operator and motion counts multiplied
    fn take_count(&mut self) -> Option<usize> {
        match (self.op_count.take(), self.count.take()) {
            (None, None) => None,
            (a, b) => Some((a.unwrap_or(1) * b.unwrap_or(1)).min(MAX_COUNT)),
        }
    }

    fn commit_change(&mut self, count: Option<usize>) {
        let keys = std::mem::take(&mut self.keys);
        if !keys.is_empty() {
            self.last_change = Some(LastChange { count, keys });
        }
    }

    fn discard_keys(&mut self) {
        self.keys.clear();
    }
}

fn search_for(kind: char, c: char) -> CharSearch {
    match kind {
        't' => CharSearch::ForwardBefore(c),
        'F' => CharSearch::Backward(c),
        'T' => CharSearch::BackwardAfter(c),
        _ => CharSearch::Forward(c),
    }
}

/// Motion keys that need no further input
fn simple_motion(key: KeyPress) -> Option<Motion> {
    if key.ctrl || key.alt {
        return None;
    }
    let motion = match key.code {
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => Motion::Left,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => Motion::Right,
        KeyCode::Home | KeyCode::Char('0') => Motion::LineStart,
        KeyCode::Char('^') => Motion::FirstNonBlank,
        KeyCode::End | KeyCode::Char('$') => Motion::LineEnd,
        KeyCode::Char('w') => Motion::NextWordStart(Word::ViWord),
        KeyCode::Char('W') => Motion::NextWordStart(Word::BigWord),
        KeyCode::Char('e') => Motion::WordEnd(Word::ViWord),
        KeyCode::Char('E') => Motion::WordEnd(Word::BigWord),
        KeyCode::Char('b') => Motion::PrevWordStart(Word::ViWord),
        KeyCode::Char('B') => Motion::PrevWordStart(Word::BigWord),
        KeyCode::Char('%') => Motion::MatchBracket,
        _ => return None,
    };
    Some(motion)
}

fn char_key(key: KeyPress) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if !key.ctrl && !key.alt => Some(c),
        _ => None,
    }
}

/// Handle one key in normal, operator-pending or visual mode
pub fn handle_key(editor: &mut LineEditor<'_>, key: KeyPress) -> DispatchResult {
    if let Some(awaiting) = editor.vi.awaiting.take() {
        editor.vi.keys.push(key);
        let Some(c) = key.printable() else {
            editor.vi.cancel_pending();
            return DispatchResult::Alert;
        };
        return match awaiting {
            Awaiting::Search(kind) => {
                let search = search_for(kind, c);
                editor.vi.last_search = Some(search);
                apply_motion(editor, Motion::Search { search, repeat: false })
            }
            Awaiting::ReplaceChar => replace_chars(editor, c),
        };
    }

    if let Some(d) = char_key(key).filter(char::is_ascii_digit) {
        if d != '0' || editor.vi.count.is_some() {
            editor.vi.push_count_digit(d);
            return DispatchResult::Success;
        }
    }

    if key.code == KeyCode::Esc {
        let was_pending = editor.vi.has_pending() || editor.vi.mode == ViMode::Visual;
        editor.vi.cancel_pending();
        if editor.vi.mode == ViMode::Visual {
            exit_visual(editor);
        }
        return if was_pending {
            DispatchResult::Success
        } else {
            DispatchResult::Alert
        };
    }

    editor.vi.keys.push(key);
    match editor.vi.mode {
        ViMode::OperatorPending(op) => operator_key(editor, op, key),
        ViMode::Visual => visual_key(editor, key),
        _ => normal_key(editor, key),
    }
}

/// Resolve a motion key, or arrange to wait for its char; `Err` carries the
/// result to return right away
fn parse_motion(editor: &mut LineEditor<'_>, key: KeyPress) -> Result<Motion, DispatchResult> {
    if let Some(motion) = simple_motion(key) {
        return Ok(motion);
    }
    match char_key(key) {
        Some(kind @ ('f' | 't' | 'F' | 'T')) => {
            editor.vi.awaiting = Some(Awaiting::Search(kind));
            Err(DispatchResult::Success)
        }
        Some(c @ (';' | ',')) => match editor.vi.last_search {
            Some(search) => Ok(Motion::Search {
                search: if c == ',' { search.reversed() } else { search },
                repeat: true,
            }),
            None => {
                editor.vi.cancel_pending();
                Err(DispatchResult::Alert)
            }
        },
        _ => {
            editor.vi.cancel_pending();
            Err(DispatchResult::Alert)
        }
    }
}

fn apply_motion(editor: &mut LineEditor<'_>, motion: Motion) -> DispatchResult {
    match editor.vi.mode {
        ViMode::OperatorPending(op) => apply_operator_motion(editor, op, motion),
        _ => {
            let count = editor.vi.take_count().unwrap_or(1);
            editor.vi.discard_keys();
            let text = editor.chars();
            match motion::target(&text, editor.buffer.cursor(), motion, count, false) {
                Some(target) => {
                    editor.buffer.set_cursor(target);
                    if editor.vi.mode == ViMode::Visual {
                        update_visual_selection(editor);
                    }
                    DispatchResult::Success
                }
                None => DispatchResult::Alert,
            }
        }
    }
}

fn normal_key(editor: &mut LineEditor<'_>, key: KeyPress) -> DispatchResult {
    if key.ctrl && key.code == KeyCode::Char('r') {
        return redo(editor);
    }
    let Some(c) = char_key(key) else {
        return match parse_motion(editor, key) {
            Ok(motion) => apply_motion(editor, motion),
            Err(result) => result,
        };
    };
    match c {
        'd' | 'c' | 'y' => {
            let op = match c {
                'd' => Operator::Delete,
                'c' => Operator::Change,
                _ => Operator::Yank,
            };
            editor.vi.op_count = editor.vi.count.take();
            editor.vi.mode = ViMode::OperatorPending(op);
            DispatchResult::Success
        }
        'r' => {
            editor.vi.awaiting = Some(Awaiting::ReplaceChar);
            DispatchResult::Success
        }
        'x' | 'X' | 's' => {
            let count = editor.vi.take_count();
            let n = count.unwrap_or(1);
            let cursor = editor.buffer.cursor();
            let line = editor.buffer.line_range_at(cursor);
            let span = if c == 'X' {
                cursor.saturating_sub(n).max(line.start)..cursor
            } else {
                cursor..(cursor + n).min(line.end)
            };
            if c == 's' {
                return change_span(editor, span, count);
            }
            if span.is_empty() {
                editor.vi.discard_keys();
                return DispatchResult::Alert;
            }
            delete_span(editor, span, count)
        }
        'S' => linewise(editor, Operator::Change),
        'C' | 'D' => {
            let count = editor.vi.take_count();
            let cursor = editor.buffer.cursor();
            let span = cursor..editor.buffer.line_range_at(cursor).end;
            if c == 'C' {
                change_span(editor, span, count)
            } else if span.is_empty() {
                editor.vi.discard_keys();
                DispatchResult::Alert
            } else {
                delete_span(editor, span, count)
            }
        }
        'Y' => linewise(editor, Operator::Yank),
        'p' | 'P' => put(editor, c == 'p'),
        '~' => toggle_case(editor),
        'i' | 'a' | 'I' | 'A' => {
            let count = editor.vi.take_count();
            let cursor = editor.buffer.cursor();
            let line = editor.buffer.line_range_at(cursor);
            let at = match c {
                'a' => (cursor + 1).min(line.end),
                'I' => motion::first_non_blank(&editor.chars(), line),
                'A' => line.end,
                _ => cursor,
            };
            editor.begin_undo_group();
            editor.buffer.set_cursor(at);
            start_insert(editor, count, ViMode::Insert, false);
            DispatchResult::Success
        }
        'o' | 'O' => {
            let count = editor.vi.take_count();
            let cursor = editor.buffer.cursor();
            let line = editor.buffer.line_range_at(cursor);
            editor.begin_undo_group();
            if c == 'o' {
                editor.insert_text_at(line.end, "\n");
                editor.buffer.set_cursor(line.end + 1);
            } else {
                editor.insert_text_at(line.start, "\n");
                editor.buffer.set_cursor(line.start);
            }
            start_insert(editor, count, ViMode::Insert, true);
            DispatchResult::Success
        }
        'R' => {
            let count = editor.vi.take_count();
            editor.begin_undo_group();
            start_insert(editor, count, ViMode::Replace, false);
            DispatchResult::Success
        }
        'u' => {
            let n = editor.vi.take_count().unwrap_or(1);
            editor.vi.discard_keys();
            if editor.undo_once() == DispatchResult::Alert {
                return DispatchResult::Alert;
            }
            for _ in 1..n {
                if editor.undo_once() == DispatchResult::Alert {
                    break;
                }
            }
            DispatchResult::Success
        }
        'U' => redo(editor),
        '.' => repeat_last_change(editor),
        'v' => {
            editor.vi.cancel_pending();
            editor.vi.mode = ViMode::Visual;
            editor.vi.visual_anchor = editor.buffer.cursor();
            update_visual_selection(editor);
            DispatchResult::Success
        }
        'j' | 'k' => vertical(editor, c == 'j'),
        _ => match parse_motion(editor, key) {
            Ok(motion) => apply_motion(editor, motion),
            Err(result) => result,
        },
    }
}

fn redo(editor: &mut LineEditor<'_>) -> DispatchResult {
    let n = editor.vi.take_count().unwrap_or(1);
    editor.vi.discard_keys();
    if editor.redo_once() == DispatchResult::Alert {
        return DispatchResult::Alert;
    }
    for _ in 1..n {
        if editor.redo_once() == DispatchResult::Alert {
            break;
        }
    }
    DispatchResult::Success
}

/// `j`/`k`: move between lines of a multi-line input, or through history
fn vertical(editor: &mut LineEditor<'_>, down: bool) -> DispatchResult {
    let n = editor.vi.take_count().unwrap_or(1);
    editor.vi.discard_keys();
    if editor.buffer.line_count() <= 1 {
        if editor.vi.mode == ViMode::Visual {
            return DispatchResult::Alert;
        }
        let command = if down { "next-history" } else { "previous-history" };
        return dispatch(editor, command, Some(n as i32));
    }
    let cursor = editor.buffer.cursor();
    let line = editor.buffer.line_of(cursor);
    let target = if down {
        line + n
    } else {
        match line.checked_sub(n) {
            Some(l) => l,
            None => return DispatchResult::Alert,
        }
    };
    if target >= editor.buffer.line_count() {
        return DispatchResult::Alert;
    }
    let column = editor.buffer.column_of(cursor);
    let start = editor.buffer.line_start(target);
    let end = editor.buffer.line_end(target);
    editor.buffer.set_cursor((start + column).min(end));
    if editor.vi.mode == ViMode::Visual {
        update_visual_selection(editor);
    }
    DispatchResult::Success
}

fn operator_key(editor: &mut LineEditor<'_>, op: Operator, key: KeyPress) -> DispatchResult {
    let same = matches!(
        (op, char_key(key)),
        (Operator::Delete, Some('d')) | (Operator::Change, Some('c')) | (Operator::Yank, Some('y'))
    );
    if same {
        return linewise(editor, op);
    }
    if let Some(c @ ('j' | 'k')) = char_key(key) {
        let n = editor.vi.take_count().unwrap_or(1);
        let line = editor.buffer.line_of(editor.buffer.cursor());
        let (first, last) = if c == 'j' {
            (line, line + n)
        } else {
            match line.checked_sub(n) {
                Some(first) => (first, line),
                None => (usize::MAX, line),
            }
        };
        if first == usize::MAX || last >= editor.buffer.line_count() {
            editor.vi.cancel_pending();
            return DispatchResult::Alert;
        }
        editor.vi.mode = ViMode::Normal;
        return apply_linewise(editor, op, first, last, Some(n));
    }
    match parse_motion(editor, key) {
        Ok(motion) => apply_operator_motion(editor, op, motion),
        Err(result) => result,
    }
}

fn apply_operator_motion(editor: &mut LineEditor<'_>, op: Operator, motion: Motion) -> DispatchResult {
    let count = editor.vi.take_count();
    let n = count.unwrap_or(1);
    editor.vi.mode = ViMode::Normal;
    let text = editor.chars();
    let cursor = editor.buffer.cursor();

    let span = match motion {
        // `cw` on a word changes to its end, like `ce`
        Motion::NextWordStart(word)
            if op == Operator::Change && text.get(cursor).is_some_and(|c| !c.is_whitespace()) =>
        {
            let mut end = motion::current_word_end(&text, cursor, word);
            for _ in 1..n {
                match motion::word_end(&text, end, word) {
                    Some(e) => end = e,
                    None => break,
                }
            }
            Some(cursor..(end + 1).min(text.len()))
        }
        // a `w` span never runs past the end of the cursor's line
        Motion::NextWordStart(_) => motion::span(&text, cursor, motion, n).map(|span| {
            let line_end = motion::line_range(&text, cursor).end;
            if span.end > line_end && span.start < line_end {
                span.start..line_end
            } else {
                span
            }
        }),
        _ => motion::span(&text, cursor, motion, n),
    };

    let Some(span) = span.filter(|s| !s.is_empty()) else {
        editor.vi.discard_keys();
        return DispatchResult::Alert;
    };
    match op {
        Operator::Delete => delete_span(editor, span, count),
        Operator::Change => change_span(editor, span, count),
        Operator::Yank => {
            let yanked = editor.buffer.slice(span.clone());
            editor.session.kill_ring.kill_new(&yanked);
            editor.buffer.set_cursor(span.start);
            editor.vi.discard_keys();
            DispatchResult::Success
        }
    }
}

/// Delete `span` into the kill ring as one undoable change
fn delete_span(editor: &mut LineEditor<'_>, span: Range<usize>, count: Option<usize>) -> DispatchResult {
    editor.begin_undo_group();
    let removed = editor.delete_span(span.clone());
    editor.session.kill_ring.kill_new(&removed);
    editor.buffer.set_cursor(span.start);
    editor.end_undo_group();
    editor.vi.mode = ViMode::Normal;
    editor.vi.commit_change(count);
    DispatchResult::Success
}

/// Delete `span` (which may be empty) and insert in its place
fn change_span(editor: &mut LineEditor<'_>, span: Range<usize>, count: Option<usize>) -> DispatchResult {
    editor.begin_undo_group();
    if !span.is_empty() {
        let removed = editor.delete_span(span.clone());
        editor.session.kill_ring.kill_new(&removed);
    }
    editor.buffer.set_cursor(span.start);
    editor.vi.recording = Some(count);
    start_insert(editor, None, ViMode::Insert, false);
    DispatchResult::Success
}

/// `dd`, `cc`, `yy` and their single-letter forms
fn linewise(editor: &mut LineEditor<'_>, op: Operator) -> DispatchResult {
    let count = editor.vi.take_count();
    let n = count.unwrap_or(1);
    editor.vi.mode = ViMode::Normal;
    if op == Operator::Delete && editor.buffer.is_empty() {
        editor.vi.discard_keys();
        return DispatchResult::Alert;
    }
    let first = editor.buffer.line_of(editor.buffer.cursor());
    let last = (first + n - 1).min(editor.buffer.line_count().saturating_sub(1));
    apply_linewise(editor, op, first, last, count)
}

fn apply_linewise(
    editor: &mut LineEditor<'_>,
    op: Operator,
    first: usize,
    last: usize,
    count: Option<usize>,
) -> DispatchResult {
    let start = editor.buffer.line_start(first);
    let end = editor.buffer.line_end(last);
    let mut yanked = editor.buffer.slice(start..end);
    yanked.push('\n');
    editor.session.kill_ring.kill_new(&yanked);

    match op {
        Operator::Yank => {
            editor.vi.discard_keys();
            DispatchResult::Success
        }
        Operator::Change => {
            editor.begin_undo_group();
            editor.delete_span(start..end);
            editor.buffer.set_cursor(start);
            editor.vi.recording = Some(count);
            start_insert(editor, None, ViMode::Insert, false);
            DispatchResult::Success
        }
        Operator::Delete => {
            let len = editor.buffer.len();
            let span = if end < len {
                start..end + 1
            } else if start > 0 {
                start - 1..end
            } else {
                start..end
            };
            editor.begin_undo_group();
            editor.delete_span(span);
            let line = editor.buffer.line_of(start.min(editor.buffer.len()));
            let range = editor.buffer.line_start(line)..editor.buffer.line_end(line);
            let at = motion::first_non_blank(&editor.chars(), range);
            editor.buffer.set_cursor(at);
            editor.end_undo_group();
            editor.vi.commit_change(count);
            DispatchResult::Success
        }
    }
}

/// `p` puts after the cursor (below the line for linewise text), `P` before
fn put(editor: &mut LineEditor<'_>, after: bool) -> DispatchResult {
    let count = editor.vi.take_count();
    let n = count.unwrap_or(1);
    let Some(text) = editor.session.kill_ring.yank().map(str::to_string) else {
        editor.vi.discard_keys();
        return DispatchResult::Alert;
    };
    let cursor = editor.buffer.cursor();
    let line = editor.buffer.line_range_at(cursor);

    editor.begin_undo_group();
    if let Some(body) = text.strip_suffix('\n') {
        let lines = vec![body; n].join("\n");
        if after {
            editor.insert_text_at(line.end, &format!("\n{}", lines));
            editor.buffer.set_cursor(line.end + 1);
        } else {
            editor.insert_text_at(line.start, &format!("{}\n", lines));
            editor.buffer.set_cursor(line.start);
        }
    } else {
        let repeated = text.repeat(n);
        let at = if after && !editor.buffer.is_empty() {
            (cursor + 1).min(editor.buffer.len())
        } else {
            cursor
        };
        editor.insert_text_at(at, &repeated);
        let inserted = repeated.chars().count();
        editor.buffer.set_cursor(at + inserted.saturating_sub(1));
    }
    editor.end_undo_group();
    editor.vi.commit_change(count);
    DispatchResult::Success
}

fn replace_chars(editor: &mut LineEditor<'_>, c: char) -> DispatchResult {
    let count = editor.vi.take_count();
    let n = count.unwrap_or(1);
    let cursor = editor.buffer.cursor();
    let line = editor.buffer.line_range_at(cursor);
    if cursor + n > line.end {
        editor.vi.cancel_pending();
        return DispatchResult::Alert;
    }
    let replacement: String = std::iter::repeat_n(c, n).collect();
    editor.begin_undo_group();
    editor.replace_span(cursor..cursor + n, &replacement);
    editor.buffer.set_cursor(cursor + n - 1);
    editor.end_undo_group();
    editor.vi.commit_change(count);
    DispatchResult::Success
}

fn toggled(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            let flipped: Vec<char> = if c.is_uppercase() {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            flipped
        })
        .collect()
}

fn toggle_case(editor: &mut LineEditor<'_>) -> DispatchResult {
    let count = editor.vi.take_count();
    let cursor = editor.buffer.cursor();
    let line = editor.buffer.line_range_at(cursor);
    if cursor >= line.end {
        editor.vi.discard_keys();
        return DispatchResult::Alert;
    }
    let end = (cursor + count.unwrap_or(1)).min(line.end);
    let flipped = toggled(&editor.buffer.slice(cursor..end));
    editor.begin_undo_group();
    editor.replace_span(cursor..end, &flipped);
    editor.buffer.set_cursor(cursor + flipped.chars().count());
    editor.end_undo_group();
    editor.vi.commit_change(count);
    DispatchResult::Success
}

fn repeat_last_change(editor: &mut LineEditor<'_>) -> DispatchResult {
    let count = editor.vi.take_count();
    editor.vi.discard_keys();
    let Some(change) = editor.vi.last_change.clone() else {
        return DispatchResult::Alert;
    };
    let mut keys: Vec<KeyPress> = count
        .or(change.count)
        .map(|n| n.to_string().chars().map(KeyPress::char).collect())
        .unwrap_or_default();
    keys.extend(change.keys);
    editor.chords.replay_front(keys);
    DispatchResult::Success
}

fn start_insert(editor: &mut LineEditor<'_>, count: Option<usize>, mode: ViMode, new_line: bool) {
    if editor.vi.recording.is_none() {
        editor.vi.recording = Some(count);
    }
    editor.vi.insert = Some(InsertSession {
        count: count.unwrap_or(1),
        start: editor.buffer.cursor(),
        new_line,
    });
    editor.vi.replaced.clear();
    editor.vi.mode = mode;
    debug!(?mode, "vi insert");
}

/// Leave insert or replace mode (Escape)
pub fn enter_normal(editor: &mut LineEditor<'_>) -> DispatchResult {
    if editor.vi.in_command_mode() {
        return DispatchResult::Alert;
    }
    if let Some(session) = editor.vi.insert.take() {
        let cursor = editor.buffer.cursor();
        if editor.vi.mode == ViMode::Insert && session.count > 1 && cursor > session.start {
            let typed = editor.buffer.slice(session.start..cursor);
            let unit = if session.new_line {
                format!("\n{}", typed)
            } else {
                typed
            };
            editor.insert_str(&unit.repeat(session.count - 1));
        } else if editor.vi.mode == ViMode::Replace && session.count > 1 && cursor > session.start {
            // repeats overwrite what follows, like the first pass
            let typed = editor.buffer.slice(session.start..cursor);
            for _ in 1..session.count {
                for c in typed.chars() {
                    replace_char(editor, c);
                }
            }
        }
    }
    editor.end_undo_group();
    if let Some(count) = editor.vi.recording.take() {
        editor.vi.commit_change(count);
    } else {
        editor.vi.discard_keys();
    }
    editor.vi.replaced.clear();
    editor.vi.mode = ViMode::Normal;

    let cursor = editor.buffer.cursor();
    if cursor > editor.buffer.line_range_at(cursor).start {
        editor.buffer.set_cursor(cursor - 1);
    }
    debug!("vi normal");
    DispatchResult::Success
}

/// `vi-insert-mode`: insert at the cursor
pub fn enter_insert(editor: &mut LineEditor<'_>) -> DispatchResult {
    if !editor.vi.in_command_mode() {
        return DispatchResult::Success;
    }
    editor.vi.cancel_pending();
    if editor.vi.mode == ViMode::Visual {
        exit_visual(editor);
    }
    editor.begin_undo_group();
    start_insert(editor, None, ViMode::Insert, false);
    DispatchResult::Success
}

/// Type `c` over the text in Replace mode
pub fn replace_char(editor: &mut LineEditor<'_>, c: char) {
    let cursor = editor.buffer.cursor();
    let line = editor.buffer.line_range_at(cursor);
    let mut buf = [0u8; 4];
    if cursor < line.end {
        let old = editor.buffer.char_at(cursor);
        editor.replace_span(cursor..cursor + 1, c.encode_utf8(&mut buf));
        editor.vi.replaced.push(old);
    } else {
        editor.insert_str(c.encode_utf8(&mut buf));
        editor.vi.replaced.push(None);
    }
}

/// Backspace in Replace mode puts back what was overwritten
pub fn replace_backspace(editor: &mut LineEditor<'_>) -> DispatchResult {
    let cursor = editor.buffer.cursor();
    if cursor == 0 {
        return DispatchResult::Alert;
    }
    match editor.vi.replaced.pop() {
        Some(Some(old)) => {
            let mut buf = [0u8; 4];
            editor.replace_span(cursor - 1..cursor, old.encode_utf8(&mut buf));
            editor.buffer.set_cursor(cursor - 1);
        }
        Some(None) => {
            editor.delete_span(cursor - 1..cursor);
        }
        None => editor.buffer.set_cursor(cursor - 1),
    }
    DispatchResult::Success
}

fn update_visual_selection(editor: &mut LineEditor<'_>) {
    let anchor = editor.vi.visual_anchor;
    let cursor = editor.buffer.cursor();
    let lo = anchor.min(cursor);
    let hi = (anchor.max(cursor) + 1).min(editor.buffer.len());
    editor.buffer.set_selection(lo, hi as isize - lo as isize);
}

fn exit_visual(editor: &mut LineEditor<'_>) {
    editor.buffer.clear_selection();
    editor.vi.mode = ViMode::Normal;
}

fn visual_key(editor: &mut LineEditor<'_>, key: KeyPress) -> DispatchResult {
    let span = {
        let anchor = editor.vi.visual_anchor;
        let cursor = editor.buffer.cursor();
        anchor.min(cursor)..(anchor.max(cursor) + 1).min(editor.buffer.len())
    };
    match char_key(key) {
        Some('v') => {
            editor.vi.discard_keys();
            exit_visual(editor);
            DispatchResult::Success
        }
        // visual edits are not repeatable with `.`, so their keys are dropped
        Some('d' | 'x') => {
            exit_visual(editor);
            editor.vi.discard_keys();
            if span.is_empty() {
                return DispatchResult::Alert;
            }
            delete_span(editor, span, None)
        }
        Some('c' | 's') => {
            exit_visual(editor);
            editor.vi.discard_keys();
            let result = change_span(editor, span, None);
            editor.vi.recording = None;
            result
        }
        Some('y') => {
            exit_visual(editor);
            editor.vi.discard_keys();
            let yanked = editor.buffer.slice(span.clone());
            editor.session.kill_ring.kill_new(&yanked);
            editor.buffer.set_cursor(span.start);
            DispatchResult::Success
        }
        Some('~') => {
            exit_visual(editor);
            editor.vi.discard_keys();
            let flipped = toggled(&editor.buffer.slice(span.clone()));
            editor.begin_undo_group();
            editor.replace_span(span.clone(), &flipped);
            editor.buffer.set_cursor(span.start);
            editor.end_undo_group();
            DispatchResult::Success
        }
        Some(c @ ('j' | 'k')) => vertical(editor, c == 'j'),
        _ => match parse_motion(editor, key) {
            Ok(motion) => apply_motion(editor, motion),
            Err(result) => result,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::ViMode;
    use crate::config::{EditMode, Options};
    use crate::core::editor::LineEditor;
    use crate::core::input::{KeyCode, KeyPress};
    use crate::core::session::EditorSession;

    fn vi_session() -> EditorSession {
        EditorSession::new(Options {
            edit_mode: EditMode::Vi,
            ..Options::default()
        })
    }

    fn typed(ed: &mut LineEditor<'_>, keys: &str) {
        for c in keys.chars() {
            ed.process_key(KeyPress::char(c));
        }
    }

    fn esc(ed: &mut LineEditor<'_>) {
        ed.process_key(KeyPress::new(KeyCode::Esc));
    }

    #[test]
    fn test_delete_then_put_restores_char() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "abcd");
        esc(&mut ed);
        assert_eq!(ed.get_buffer_state(), ("abcd".to_string(), 3));
        typed(&mut ed, "x");
        assert_eq!(ed.get_buffer_state(), ("abc".to_string(), 2));
        typed(&mut ed, "p");
        assert_eq!(ed.get_buffer_state(), ("abcd".to_string(), 3));
    }

    #[test]
    fn test_escape_in_normal_mode_alerts() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "a");
        esc(&mut ed);
        assert_eq!(ed.vi_mode(), Some(ViMode::Normal));
        assert!(!ed.alert);
        esc(&mut ed);
        assert!(ed.alert);
    }

    #[test]
    fn test_operator_motion_and_repeat() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "foo bar baz");
        esc(&mut ed);
        typed(&mut ed, "0dw");
        assert_eq!(ed.get_buffer_state(), ("bar baz".to_string(), 0));
        typed(&mut ed, ".");
        assert_eq!(ed.get_buffer_state(), ("baz".to_string(), 0));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "bar baz");
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "foo bar baz");
    }

    #[test]
    fn test_change_word_repeats_with_inserted_text() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "foo bar");
        esc(&mut ed);
        typed(&mut ed, "0cwqux");
        esc(&mut ed);
        assert_eq!(ed.get_buffer_state(), ("qux bar".to_string(), 2));
        typed(&mut ed, "w.");
        assert_eq!(ed.get_buffer_state(), ("qux qux".to_string(), 6));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "qux bar");
    }

    #[test]
    fn test_counts_and_redo() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "abcdef");
        esc(&mut ed);
        typed(&mut ed, "03x");
        assert_eq!(ed.get_buffer_state(), ("def".to_string(), 0));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "abcdef");
        ed.process_key(KeyPress::char('r').ctrl());
        assert_eq!(ed.get_buffer_state().0, "def");
        typed(&mut ed, "u");
        typed(&mut ed, "U");
        assert_eq!(ed.get_buffer_state().0, "def");
    }

    #[test]
    fn test_char_search_and_repeat() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "a,b,c,d");
        esc(&mut ed);
        typed(&mut ed, "0f,");
        assert_eq!(ed.get_buffer_state().1, 1);
        typed(&mut ed, ";");
        assert_eq!(ed.get_buffer_state().1, 3);
        typed(&mut ed, ",");
        assert_eq!(ed.get_buffer_state().1, 1);
        typed(&mut ed, "D");
        assert_eq!(ed.get_buffer_state(), ("a".to_string(), 0));
    }

    #[test]
    fn test_replace_mode_backspace_restores() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "abc");
        esc(&mut ed);
        typed(&mut ed, "0Rxy");
        assert_eq!(ed.vi_mode(), Some(ViMode::Replace));
        assert_eq!(ed.get_buffer_state(), ("xyc".to_string(), 2));
        ed.process_key(KeyPress::new(KeyCode::Backspace));
        assert_eq!(ed.get_buffer_state(), ("xbc".to_string(), 1));
        esc(&mut ed);
        assert_eq!(ed.get_buffer_state(), ("xbc".to_string(), 0));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "abc");
    }

    #[test]
    fn test_replace_count_overwrites_repeats() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "foo bar");
        esc(&mut ed);
        typed(&mut ed, "03Rxy");
        esc(&mut ed);
        assert_eq!(ed.get_buffer_state(), ("xyxyxyr".to_string(), 5));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "foo bar");
    }

    #[test]
    fn test_operator_and_motion_counts_multiply() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "a b c d e f g h");
        esc(&mut ed);
        typed(&mut ed, "02d3w");
        assert_eq!(ed.get_buffer_state(), ("g h".to_string(), 0));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "a b c d e f g h");
    }

    #[test]
    fn test_repeat_keeps_the_change_count() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "a b c d e f g h");
        esc(&mut ed);
        typed(&mut ed, "0d2w");
        assert_eq!(ed.get_buffer_state(), ("c d e f g h".to_string(), 0));
        typed(&mut ed, ".");
        assert_eq!(ed.get_buffer_state(), ("e f g h".to_string(), 0));
        typed(&mut ed, "3.");
        assert_eq!(ed.get_buffer_state(), ("h".to_string(), 0));
    }

    #[test]
    fn test_visual_delete() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "hello world");
        esc(&mut ed);
        typed(&mut ed, "0ve");
        assert_eq!(ed.vi_mode(), Some(ViMode::Visual));
        assert_eq!(ed.get_selection_state(), (0, 5));
        typed(&mut ed, "d");
        assert_eq!(ed.get_buffer_state(), (" world".to_string(), 0));
        assert_eq!(ed.vi_mode(), Some(ViMode::Normal));
    }

    #[test]
    fn test_yank_line_and_put_below() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "one");
        esc(&mut ed);
        typed(&mut ed, "yyp");
        assert_eq!(ed.get_buffer_state(), ("one\none".to_string(), 4));
        typed(&mut ed, "dd");
        assert_eq!(ed.get_buffer_state().0, "one");
    }

    #[test]
    fn test_insert_count_repeats_text() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        esc(&mut ed);
        typed(&mut ed, "3ia");
        esc(&mut ed);
        assert_eq!(ed.get_buffer_state(), ("aaa".to_string(), 2));
        typed(&mut ed, "u");
        assert_eq!(ed.get_buffer_state().0, "");
    }

    #[test]
    fn test_pending_operator_cancelled_by_escape() {
        let mut s = vi_session();
        let mut ed = s.editor("");
        typed(&mut ed, "abc");
        esc(&mut ed);
        typed(&mut ed, "d");
        assert_eq!(ed.vi_mode(), Some(ViMode::OperatorPending(super::Operator::Delete)));
        esc(&mut ed);
        assert!(!ed.alert);
        assert_eq!(ed.vi_mode(), Some(ViMode::Normal));
        assert_eq!(ed.get_buffer_state().0, "abc");
    }
}
