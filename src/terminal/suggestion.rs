//! Suggestion view
//!
//! Two ways of showing a prediction next to the live input:
//!
//! - inline: the part of the suggestion the user has not typed yet, drawn
//!   dimmed after the cursor;
//! - list: one row per suggestion, squeezed into a fixed column budget with
//!   the matched input kept visible and highlighted.
//!
//! List rows look like `> <text> [source]`. The text is fitted by trying the
//! layouts below in order, each putting `...` on the side(s) it cuts:
//!
//! 1. everything fits: pad to the budget;
//! 2. no match: keep the head, cut the tail;
//! 3. match: cut only the right side, then only the left side, then both
//!    sides around a centered match;
//! 4. the match fits but not with a marker on each side: keep it whole and
//!    clip the tail without a marker;
//! 5. the match itself is wider than the row: cut the match.
//!
//! The source label is dropped when keeping it would leave the match
//! without room for its markers.

use std::ops::Range;

use crate::terminal::width::{
    display_width, substring_by_width, substring_by_width_from_end, truncate_with_marker,
};

pub const LIST_LEAD: &str = "> ";
pub const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;
/// Source labels longer than this are cut
pub const SOURCE_MAX_WIDTH: usize = 7;
/// Below this many cells of text the source label is dropped
const MIN_TEXT_WIDTH: usize = 7;

/// One candidate suggestion for the list view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionEntry {
    pub source: String,
    pub text: String,
    /// Char index in `text` where the live input matches, if it does
    pub match_index: Option<usize>,
}

impl SuggestionEntry {
    pub fn new(source: &str, text: &str, match_index: Option<usize>) -> Self {
        Self {
            source: source.to_string(),
            text: text.to_string(),
            match_index,
        }
    }
}

/// A fitted list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntryLine {
    pub text: String,
    /// Char range of the highlighted match within `text`
    pub highlight: Option<Range<usize>>,
    /// Char range of the source label within `text`
    pub source: Option<Range<usize>>,
}

/// Unmatched remainder of `suggestion` once `input` has been typed.
///
/// Matching ignores case; the tail keeps the suggestion's own spelling.
pub fn render_inline<'a>(suggestion: &'a str, input: &str) -> Option<&'a str> {
    if input.is_empty() {
        return None;
    }
    let mut rest = suggestion.char_indices();
    for expected in input.chars() {
        let (_, actual) = rest.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
    }
    let tail = rest.as_str();
    if tail.is_empty() { None } else { Some(tail) }
}

pub(crate) fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Fit one suggestion into `width` display cells
pub fn render_list_entry(entry: &SuggestionEntry, input: &str, width: usize) -> ListEntryLine {
    let lead_width = display_width(LIST_LEAD);
    let label = format!(
        " [{}]",
        truncate_with_marker(&entry.source, SOURCE_MAX_WIDTH, "…")
    );
    let label_width = display_width(&label);

    let input_len = input.chars().count();
    let text_len = entry.text.chars().count();
    let span = entry
        .match_index
        .filter(|i| input_len > 0 && i + input_len <= text_len);
    let match_width = span.map_or(0, |i| display_width(slice(&entry.text, i, i + input_len)));

    let mut text_width = width.saturating_sub(lead_width + label_width);
    // the label gives way before the match loses its markers
    let show_label = !entry.source.is_empty()
        && text_width >= MIN_TEXT_WIDTH
        && match_width + 2 * ELLIPSIS_WIDTH <= text_width;
    if !show_label {
        text_width = width.saturating_sub(lead_width);
    }

    let (body, highlight) = fit_text(&entry.text, span.map(|i| i..i + input_len), text_width);

    let mut text = String::from(LIST_LEAD);
    let lead_chars = text.chars().count();
    text.push_str(&body);
    let pad = text_width.saturating_sub(display_width(&body));
    text.extend(std::iter::repeat_n(' ', pad));

    let source = if show_label {
        let start = text.chars().count();
        text.push_str(&label);
        Some(start..text.chars().count())
    } else {
        None
    };

    // a budget too small for the lead itself still must not overflow
    if display_width(&text) > width {
        text = substring_by_width(&text, 0, width).to_string();
    }

    ListEntryLine {
        highlight: highlight.map(|r| r.start + lead_chars..r.end + lead_chars),
        text,
        source,
    }
}

/// Fit `text` into `budget` cells, returning the body and the char range of
/// the (possibly shifted) match inside it
fn fit_text(text: &str, span: Option<Range<usize>>, budget: usize) -> (String, Option<Range<usize>>) {
    let total = display_width(text);

    let Some(span) = span else {
        if total <= budget {
            return (text.to_string(), None);
        }
        return (truncate_with_marker(text, budget, ELLIPSIS), None);
    };

    let before_text = slice(text, 0, span.start);
    let mid_text = slice(text, span.start, span.end);
    let after_text = slice(text, span.end, usize::MAX);
    let before = display_width(before_text);
    let mid = display_width(mid_text);
    let after = display_width(after_text);

    if total <= budget {
        return (text.to_string(), Some(span));
    }

    // right side only
    if before + mid + ELLIPSIS_WIDTH <= budget {
        let room = budget - before - mid - ELLIPSIS_WIDTH;
        let right = substring_by_width(after_text, 0, room);
        let body = format!("{}{}{}{}", before_text, mid_text, right, ELLIPSIS);
        return (body, Some(span));
    }

    // left side only
    if ELLIPSIS_WIDTH + mid + after <= budget {
        let room = budget - ELLIPSIS_WIDTH - mid - after;
        let left = substring_by_width_from_end(before_text, usize::MAX, room);
        let start = ELLIPSIS.len() + left.chars().count();
        let body = format!("{}{}{}{}", ELLIPSIS, left, mid_text, after_text);
        return (body, Some(start..start + mid_text.chars().count()));
    }

    // both sides, match centered
    if ELLIPSIS_WIDTH + mid + ELLIPSIS_WIDTH <= budget {
        let remaining = budget - 2 * ELLIPSIS_WIDTH - mid;
        let left_room = remaining / 2;
        let right_room = remaining - left_room;
        let left = substring_by_width_from_end(before_text, usize::MAX, left_room);
        let right = substring_by_width(after_text, 0, right_room);
        let start = ELLIPSIS.len() + left.chars().count();
        let body = format!("{}{}{}{}{}", ELLIPSIS, left, mid_text, right, ELLIPSIS);
        return (body, Some(start..start + mid_text.chars().count()));
    }

    // the whole match fits but not with both markers: clip the tail bare
    if mid <= budget {
        let lead = if before > 0 && ELLIPSIS_WIDTH + mid <= budget {
            ELLIPSIS
        } else {
            ""
        };
        let room = budget - display_width(lead) - mid;
        let right = substring_by_width(after_text, 0, room);
        let start = lead.len();
        let body = format!("{}{}{}", lead, mid_text, right);
        return (body, Some(start..start + mid_text.chars().count()));
    }

    // the match alone is too wide; keep as much of it as fits
    let start = if before > 0 { ELLIPSIS.len() } else { 0 };
    let lead = if before > 0 { ELLIPSIS } else { "" };
    let room = budget.saturating_sub(display_width(lead) + ELLIPSIS_WIDTH);
    let kept = substring_by_width(mid_text, 0, room);
    if kept.is_empty() {
        return (substring_by_width(text, 0, budget).to_string(), None);
    }
    let body = format!("{}{}{}", lead, kept, ELLIPSIS);
    (body, Some(start..start + kept.chars().count()))
}

fn slice(s: &str, from: usize, to: usize) -> &str {
    crate::terminal::width::char_slice(s, from, to)
}
