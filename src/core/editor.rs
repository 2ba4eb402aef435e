//! The state of one read-line call
//!
//! A [`LineEditor`] borrows the session (history, kill ring, key tables,
//! collaborators) for the duration of the call and owns everything that
//! dies with it: the buffer, undo stack, Vi state, a half-typed chord, an
//! incremental search or completion cycle in progress.
//!
//! Keys come in through [`LineEditor::process_key`]; commands get at the
//! buffer through the edit primitives below, which keep undo, selection and
//! suggestion state consistent.

use std::ops::{Deref, DerefMut, Range};

use tracing::{debug, trace};

use crate::config::{EditMode, PredictionView};
use crate::core::buffer::EditBuffer;
use crate::core::colorizer::classify_chars;
use crate::core::completion::{CompletionCycle, Completions};
use crate::core::dispatcher::{ChordDispatcher, ChordStep, DIGIT_ARGUMENT, DispatchResult, dispatch};
use crate::core::history::SearchDirection;
use crate::core::input::{KeyCode, KeyPress};
use crate::core::keymap::KeyTableId;
use crate::core::kill_ring::KillDirection;
use crate::core::prediction::{HistoryPredictor, PredictionState};
use crate::core::search::{SearchState, SearchView};
use crate::core::session::SessionCore;
use crate::core::undo::{EditKind, UndoFrame, UndoStack};
use crate::core::vi::{self, ViMode, ViState};
use crate::error::Result;
use crate::terminal::frame::{Frame, FrameSpec, layout};
use crate::terminal::suggestion::{ListEntryLine, SuggestionEntry, render_inline, render_list_entry};

/// How a read-line call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLineOutcome {
    Accepted(String),
    Cancelled,
    /// Input ended on an empty line
    Eof,
}

pub struct LineEditor<'s> {
    pub(crate) session: &'s mut SessionCore,
    pub(crate) buffer: EditBuffer,
    pub(crate) undo: UndoStack,
    pub(crate) vi: ViState,
    pub(crate) chords: ChordDispatcher,
    pub(crate) search: Option<SearchState>,
    pub(crate) completion: Option<CompletionCycle>,
    /// Completions waiting for the answer to "Display all N possibilities?"
    pub(crate) completion_query: Option<Completions>,
    /// Completion listing shown below the input
    pub(crate) menu: Vec<String>,
    pub(crate) prediction: PredictionState,
    suggestions_suppressed: bool,
    /// Span inserted by the last yank, for yank-pop
    pub(crate) last_yank: Option<Range<usize>>,
    /// Query of a running `history-search-*` sequence
    pub(crate) search_prefix: Option<String>,
    /// Key that triggered the running command
    pub(crate) current_key: Option<KeyPress>,
    prompt: String,
    /// One-shot message for the status line
    pub(crate) status: Option<String>,
    pub(crate) dispatch_depth: usize,
    pub(crate) clear_requested: bool,
    pub(crate) alert: bool,
    pub(crate) width: usize,
}

/// Suggestions stay hidden for edits made while this guard lives
pub(crate) struct SuggestionGuard<'e, 's> {
    editor: &'e mut LineEditor<'s>,
    previous: bool,
}

impl<'s> Deref for SuggestionGuard<'_, 's> {
    type Target = LineEditor<'s>;

    fn deref(&self) -> &LineEditor<'s> {
        self.editor
    }
}

impl<'s> DerefMut for SuggestionGuard<'_, 's> {
    fn deref_mut(&mut self) -> &mut LineEditor<'s> {
        self.editor
    }
}

impl Drop for SuggestionGuard<'_, '_> {
    fn drop(&mut self) {
        self.editor.suggestions_suppressed = self.previous;
    }
}

impl<'s> LineEditor<'s> {
    pub(crate) fn new(session: &'s mut SessionCore, prompt: &str) -> Self {
        let vi = ViState::new(session.options.vi_start_in_insert);
        let chords = ChordDispatcher::new(session.options.max_chord_length);
        session.history.reset_navigation();
        let mut editor = Self {
            session,
            buffer: EditBuffer::new(),
            undo: UndoStack::new(),
            vi,
            chords,
            search: None,
            completion: None,
            completion_query: None,
            menu: Vec::new(),
            prediction: PredictionState::default(),
            suggestions_suppressed: false,
            last_yank: None,
            search_prefix: None,
            current_key: None,
            prompt: prompt.to_string(),
            status: None,
            dispatch_depth: 0,
            clear_requested: false,
            alert: false,
            width: 80,
        };
        if editor.mode() == EditMode::Vi && !editor.vi.in_command_mode() {
            // the first insert session undoes as one unit, like any other
            editor.begin_undo_group();
        }
        editor
    }

    pub fn mode(&self) -> EditMode {
        self.session.options.edit_mode
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn vi_mode(&self) -> Option<ViMode> {
        (self.mode() == EditMode::Vi).then_some(self.vi.mode)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub(crate) fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
    }

    pub(crate) fn chars(&self) -> Vec<char> {
        self.buffer.chars()
    }

    // ==================== Host editing API ====================

    /// Insert `text` at the cursor
    pub fn insert(&mut self, text: &str) {
        self.insert_str(text);
    }

    /// Delete `length` chars at `start`
    pub fn delete(&mut self, start: isize, length: isize) -> Result<()> {
        self.buffer.check_range(start, length)?;
        self.record_edit(EditKind::Other);
        self.buffer.delete(start, length)?;
        self.note_edit();
        Ok(())
    }

    /// Replace `length` chars at `start` with `text`; the cursor ends up
    /// after the inserted text
    pub fn replace(&mut self, start: isize, length: isize, text: &str) -> Result<()> {
        self.buffer.check_range(start, length)?;
        self.record_edit(EditKind::Other);
        self.buffer.replace(start, length, text)?;
        self.note_edit();
        Ok(())
    }

    /// `(text, cursor)`
    pub fn get_buffer_state(&self) -> (String, usize) {
        (self.buffer.text(), self.buffer.cursor())
    }

    /// `(start, length)`, or `(-1, -1)` without a selection
    pub fn get_selection_state(&self) -> (isize, isize) {
        self.buffer.selection_state()
    }

    /// Move the cursor, clamped to the buffer
    pub fn set_cursor_position(&mut self, offset: isize) {
        self.buffer.clear_selection();
        self.buffer.set_cursor_position(offset);
    }

    // ==================== Edit primitives ====================

    pub(crate) fn snapshot(&self) -> UndoFrame {
        UndoFrame::new(self.buffer.text(), self.buffer.cursor())
    }

    fn restore(&mut self, frame: UndoFrame) {
        self.buffer.set_text(&frame.text);
        self.buffer.set_cursor(frame.cursor);
        self.note_edit();
    }

    pub(crate) fn record_edit(&mut self, kind: EditKind) {
        let before = self.snapshot();
        self.undo.record(before, kind);
    }

    pub(crate) fn begin_undo_group(&mut self) {
        let before = self.snapshot();
        self.undo.begin_group(before);
    }

    pub(crate) fn end_undo_group(&mut self) {
        let after = self.snapshot();
        self.undo.end_group(&after);
    }

    /// Every buffer change goes through here
    pub(crate) fn note_edit(&mut self) {
        self.prediction.hidden = self.suggestions_suppressed;
    }

    pub(crate) fn suppress_suggestions(&mut self) -> SuggestionGuard<'_, 's> {
        let previous = self.suggestions_suppressed;
        self.suggestions_suppressed = true;
        SuggestionGuard {
            editor: self,
            previous,
        }
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.record_edit(EditKind::Other);
        self.buffer.insert(text);
        self.note_edit();
    }

    /// Insert at `pos` without moving a cursor that is before it
    pub(crate) fn insert_text_at(&mut self, pos: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.record_edit(EditKind::Other);
        self.buffer.insert_at(pos, text);
        self.note_edit();
    }

    /// A typed character; runs of them undo together. Typing over a
    /// selection replaces it.
    pub(crate) fn self_insert(&mut self, c: char, count: usize) {
        if count == 0 {
            return;
        }
        if self.mode() == EditMode::Vi && self.vi.mode == ViMode::Replace {
            for _ in 0..count {
                vi::replace_char(self, c);
            }
            return;
        }
        match self.buffer.selection_range() {
            Some(selected) => {
                self.record_edit(EditKind::Other);
                self.buffer.remove(selected.clone());
                self.buffer.set_cursor(selected.start);
            }
            None => self.record_edit(EditKind::SelfInsert),
        }
        let text: String = std::iter::repeat_n(c, count).collect();
        self.buffer.insert(&text);
        self.note_edit();
    }

    pub(crate) fn delete_span(&mut self, span: Range<usize>) -> String {
        if span.is_empty() {
            return String::new();
        }
        self.record_edit(EditKind::Other);
        let removed = self.buffer.remove(span);
        self.note_edit();
        removed
    }

    /// Replace `span` and leave the cursor after the new text
    pub(crate) fn replace_span(&mut self, span: Range<usize>, text: &str) {
        self.record_edit(EditKind::Other);
        let start = span.start.min(self.buffer.len());
        self.buffer.remove(span);
        self.buffer.insert_at(start, text);
        self.buffer.set_cursor(start + text.chars().count());
        self.note_edit();
    }

    /// Show a whole new line, cursor at `cursor` (clamped)
    pub(crate) fn set_buffer_text(&mut self, text: &str, cursor: usize) {
        self.record_edit(EditKind::Other);
        self.buffer.set_text(text);
        self.buffer.set_cursor(cursor);
        self.note_edit();
    }

    /// Plain cursor movement; drops the selection
    pub(crate) fn move_cursor(&mut self, pos: usize) {
        self.buffer.clear_selection();
        self.buffer.set_cursor(pos);
    }

    /// Delete `span` into the kill ring
    pub(crate) fn kill_span(&mut self, span: Range<usize>, direction: KillDirection) -> bool {
        if span.is_empty() {
            return false;
        }
        let killed = self.delete_span(span);
        self.session.kill_ring.kill(&killed, direction);
        true
    }

    pub(crate) fn undo_once(&mut self) -> DispatchResult {
        let current = self.snapshot();
        match self.undo.undo(current) {
            Some(frame) => {
                self.restore(frame);
                DispatchResult::Success
            }
            None => DispatchResult::Alert,
        }
    }

    pub(crate) fn redo_once(&mut self) -> DispatchResult {
        let current = self.snapshot();
        match self.undo.redo(current) {
            Some(frame) => {
                self.restore(frame);
                DispatchResult::Success
            }
            None => DispatchResult::Alert,
        }
    }

    /// Called by the dispatcher after every command
    pub(crate) fn after_command(&mut self, name: &str) {
        if name != "yank" && name != "yank-pop" {
            self.last_yank = None;
        }
        if name != "previous-history" && name != "next-history" {
            self.prediction.end_list_navigation();
        }
        if !matches!(name, "history-search-backward" | "history-search-forward") {
            self.search_prefix = None;
        }
        if !matches!(name, "tab-complete-next" | "tab-complete-previous" | "complete") {
            self.completion = None;
        }
        if !matches!(name, "possible-completions" | "complete") {
            self.menu.clear();
        }
    }

    // ==================== Suggestions ====================

    /// Full text of the inline suggestion, when one applies
    pub(crate) fn inline_suggestion(&self) -> Option<String> {
        if self.session.options.prediction_view != PredictionView::Inline
            || self.prediction.hidden
            || self.search.is_some()
            || self.buffer.cursor() != self.buffer.len()
        {
            return None;
        }
        let text = self.buffer.text();
        HistoryPredictor
            .inline(&self.session.history, &text)
            .filter(|s| render_inline(s, &text).is_some())
            .map(str::to_string)
    }

    /// List entries and the input they were matched against
    pub(crate) fn list_suggestions(&self) -> (Vec<SuggestionEntry>, String) {
        if self.session.options.prediction_view != PredictionView::List
            || self.prediction.hidden
            || self.search.is_some()
        {
            return (Vec::new(), String::new());
        }
        let input = self
            .prediction
            .list_input
            .clone()
            .unwrap_or_else(|| self.buffer.text());
        (HistoryPredictor.list(&self.session.history, &input), input)
    }

    // ==================== Incremental search ====================

    pub(crate) fn start_search(&mut self, direction: SearchDirection) {
        let original = self.snapshot();
        let start = self.session.history.index();
        let last = self.session.last_search_query.clone();
        self.search = Some(SearchState::new(direction, original, start, last));
    }

    fn apply_search_view(&mut self, view: SearchView) {
        match view {
            SearchView::Found { line, cursor } => {
                self.buffer.set_text(&line);
                self.buffer.set_cursor(cursor);
            }
            SearchView::Original => {
                if let Some(original) = self.search.as_ref().map(|s| s.original().clone()) {
                    self.buffer.set_text(&original.text);
                    self.buffer.set_cursor(original.cursor);
                }
            }
            SearchView::Unchanged => {}
        }
    }

    /// Keep the found line and leave the search
    pub(crate) fn end_search(&mut self) {
        let Some(search) = self.search.take() else {
            return;
        };
        if !search.query().is_empty() {
            self.session.last_search_query = Some(search.query().to_string());
        }
        let original = search.original().clone();
        if let Some(index) = search.found() {
            self.session.history.go_to(index, &original.text);
        }
        if self.buffer.text() != original.text {
            self.undo.record(original, EditKind::Other);
            self.prediction.hidden = true;
        }
    }

    /// Put back the line the search started from
    pub(crate) fn abort_search(&mut self) {
        if let Some(search) = self.search.take() {
            let original = search.original();
            self.buffer.set_text(&original.text);
            self.buffer.set_cursor(original.cursor);
        }
    }

    /// Returns whether the search consumed the key
    fn handle_search_key(&mut self, key: KeyPress) -> bool {
        let Some(search) = self.search.as_mut() else {
            return false;
        };
        let history = &self.session.history;
        let view = if let Some(c) = key.printable() {
            search.add_char(c, history)
        } else if key.is_plain(KeyCode::Backspace) {
            search.backspace(history)
        } else if key == KeyPress::char('r').ctrl() {
            search.repeat(SearchDirection::Backward, history)
        } else if key == KeyPress::char('s').ctrl() {
            search.repeat(SearchDirection::Forward, history)
        } else if key.is_plain(KeyCode::Esc) || key == KeyPress::char('g').ctrl() {
            self.abort_search();
            return true;
        } else {
            self.end_search();
            return false;
        };
        self.apply_search_view(view);
        true
    }

    // ==================== Key handling ====================

    fn has_pending_state(&self) -> bool {
        self.chords.is_pending()
            || self.chords.has_arg()
            || self.search.is_some()
            || self.completion_query.is_some()
            || (self.mode() == EditMode::Vi && self.vi.has_pending())
    }

    /// Ctrl+C while something is half done: drop it, nothing else
    fn unwind(&mut self) {
        debug!("unwinding pending state");
        self.chords.reset();
        self.abort_search();
        self.completion_query = None;
        self.vi.cancel_pending();
    }

    /// Feed one decoded key. Returns the outcome once the call is over.
    pub fn process_key(&mut self, key: KeyPress) -> Option<ReadLineOutcome> {
        let mut next = Some(key);
        while let Some(key) = next {
            if let Some(outcome) = self.handle_one(key) {
                self.chords.reset();
                return Some(outcome);
            }
            next = self.chords.next_replay();
        }
        None
    }

    fn handle_one(&mut self, key: KeyPress) -> Option<ReadLineOutcome> {
        trace!(key = %key, "key");
        self.current_key = Some(key);
        self.status = None;

        if key == KeyPress::char('c').ctrl() && self.has_pending_state() {
            self.unwind();
            return None;
        }

        if let Some(completions) = self.completion_query.take() {
            if matches!(key.printable(), Some('y' | 'Y' | ' ')) {
                let labels: Vec<&str> = completions.candidates.iter().map(|c| c.label()).collect();
                self.menu = crate::core::completion::format_columns(&labels, self.width);
            }
            return None;
        }

        if self.handle_search_key(key) {
            return None;
        }

        let vi = self.mode() == EditMode::Vi;
        if vi && !self.vi.in_command_mode() && self.vi.is_recording() {
            self.vi.record_key(key);
        }

        let result = if vi && self.vi.in_command_mode() {
            self.handle_vi_command_key(key)
        } else if vi && self.vi.mode == ViMode::Replace && key.is_plain(KeyCode::Backspace) {
            vi::replace_backspace(self)
        } else {
            let table = KeyTableId::for_mode(self.mode());
            self.handle_table_key(key, table, true)
        };

        let outcome = self.finish_key(result);
        if outcome.is_none() && vi && self.vi.in_command_mode() {
            self.clamp_normal_cursor();
        }
        outcome
    }

    fn handle_table_key(&mut self, key: KeyPress, table: KeyTableId, self_insert: bool) -> DispatchResult {
        let step = self
            .chords
            .feed(self.session.keymaps.table(table), key, self_insert);
        match step {
            ChordStep::Pending => DispatchResult::Success,
            ChordStep::Execute(name) if name == DIGIT_ARGUMENT => dispatch(self, &name, None),
            ChordStep::Execute(name) => {
                let arg = self.chords.take_arg();
                dispatch(self, &name, arg)
            }
            ChordStep::SelfInsert(c) => {
                let (count, _) = crate::core::command::repeat_count(self.chords.take_arg());
                self.session.kill_ring.end_kill_sequence();
                self.self_insert(c, count);
                self.after_command("self-insert");
                DispatchResult::Success
            }
            ChordStep::Unbound(chord) => {
                self.chords.take_arg();
                if chord.len() > 1 {
                    DispatchResult::Alert
                } else {
                    DispatchResult::NotHandled
                }
            }
        }
    }

    /// Bindings in the vi command table win while no vi command is half
    /// typed; everything else goes to the vi grammar
    fn handle_vi_command_key(&mut self, key: KeyPress) -> DispatchResult {
        if !(self.vi.is_idle() || self.chords.is_pending()) {
            return self.vi_grammar_key(key);
        }
        let step = self
            .chords
            .feed(self.session.keymaps.table(KeyTableId::ViCommand), key, false);
        match step {
            ChordStep::Pending => DispatchResult::Success,
            ChordStep::Execute(name) => dispatch(self, &name, None),
            ChordStep::Unbound(chord) if chord.len() == 1 => self.vi_grammar_key(key),
            ChordStep::SelfInsert(_) => self.vi_grammar_key(key),
            ChordStep::Unbound(_) => DispatchResult::Alert,
        }
    }

    fn vi_grammar_key(&mut self, key: KeyPress) -> DispatchResult {
        self.undo.break_sequence();
        let result = vi::handle_key(self, key);
        self.session.kill_ring.end_kill_sequence();
        self.last_yank = None;
        self.search_prefix = None;
        self.completion = None;
        self.menu.clear();
        self.prediction.end_list_navigation();
        result
    }

    fn finish_key(&mut self, result: DispatchResult) -> Option<ReadLineOutcome> {
        match result {
            DispatchResult::Accept => {
                self.end_search();
                let line = self.buffer.text();
                debug!(len = line.len(), "line accepted");
                Some(ReadLineOutcome::Accepted(line))
            }
            DispatchResult::Cancel => {
                debug!("line cancelled");
                Some(ReadLineOutcome::Cancelled)
            }
            DispatchResult::Eof => Some(ReadLineOutcome::Eof),
            DispatchResult::Alert => {
                self.alert = true;
                None
            }
            DispatchResult::Redraw => {
                self.clear_requested = true;
                None
            }
            DispatchResult::Success | DispatchResult::NotHandled => None,
        }
    }

    /// In vi command mode the cursor sits on a char, never past the line
    fn clamp_normal_cursor(&mut self) {
        let cursor = self.buffer.cursor();
        let line = self.buffer.line_range_at(cursor);
        if cursor >= line.end && line.end > line.start {
            self.buffer.set_cursor(line.end - 1);
        }
    }

    // ==================== Rendering ====================

    fn status_line(&self) -> Option<String> {
        if let Some(search) = &self.search {
            return Some(search.prompt());
        }
        if let Some(completions) = &self.completion_query {
            return Some(format!(
                "Display all {} possibilities? (y or n)",
                completions.len()
            ));
        }
        if let Some(arg) = self.chords.arg_status() {
            return Some(arg);
        }
        if let Some(message) = &self.status {
            return Some(message.clone());
        }
        match self.vi_mode() {
            Some(ViMode::Replace) => Some("-- REPLACE --".to_string()),
            Some(ViMode::Visual) => Some("-- VISUAL --".to_string()),
            _ => None,
        }
    }

    /// Everything on screen for a terminal `width` columns wide
    pub fn frame(&self, width: usize) -> Frame {
        let text = self.buffer.text();
        let kinds = classify_chars(self.session.colorizer.as_deref(), &text);
        let suggestion = self.inline_suggestion();
        let tail = suggestion.as_deref().and_then(|s| render_inline(s, &text));
        let status = self.status_line();
        let (entries, input) = self.list_suggestions();
        let list: Vec<ListEntryLine> = entries
            .iter()
            .map(|entry| render_list_entry(entry, &input, width))
            .collect();
        let spec = FrameSpec {
            prompt: &self.prompt,
            continuation_prompt: &self.session.options.continuation_prompt,
            text: &text,
            cursor: self.buffer.cursor(),
            kinds: &kinds,
            selection: self.buffer.selection_range(),
            inline_suggestion: tail,
            status: status.as_deref(),
            list: &list,
            list_selected: self.prediction.list_selected,
            menu: &self.menu,
        };
        layout(&spec, &self.session.palette, width)
    }

    /// The input alone, as left on screen once the call is over
    pub fn final_frame(&self, width: usize) -> Frame {
        let text = self.buffer.text();
        let kinds = classify_chars(self.session.colorizer.as_deref(), &text);
        let spec = FrameSpec {
            prompt: &self.prompt,
            continuation_prompt: &self.session.options.continuation_prompt,
            text: &text,
            cursor: self.buffer.len(),
            kinds: &kinds,
            ..Default::default()
        };
        layout(&spec, &self.session.palette, width)
    }
}
