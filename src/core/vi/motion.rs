//! Vi motions
//!
//! Pure functions over the buffer's chars. A motion computes a target
//! position; an operator turns the cursor and the target into a span, which
//! includes the target char for inclusive motions (`e`, `f`, `t`, `%`).

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    /// Runs of letters, digits and `_`, or runs of other non-blank chars
    ViWord,
    /// Any run of non-blank chars
    BigWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSearch {
    /// `f`
    Forward(char),
    /// `t`
    ForwardBefore(char),
    /// `F`
    Backward(char),
    /// `T`
    BackwardAfter(char),
}

impl CharSearch {
    pub fn reversed(self) -> Self {
        match self {
            CharSearch::Forward(c) => CharSearch::Backward(c),
            CharSearch::ForwardBefore(c) => CharSearch::BackwardAfter(c),
            CharSearch::Backward(c) => CharSearch::Forward(c),
            CharSearch::BackwardAfter(c) => CharSearch::ForwardBefore(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    LineStart,
    FirstNonBlank,
    LineEnd,
    NextWordStart(Word),
    WordEnd(Word),
    PrevWordStart(Word),
    /// `repeat` is set for `;` and `,`, which skip a match right next to
    /// the cursor for `t`/`T`
    Search { search: CharSearch, repeat: bool },
    MatchBracket,
}

impl Motion {
    pub fn is_inclusive(self) -> bool {
        matches!(
            self,
            Motion::WordEnd(_)
                | Motion::MatchBracket
                | Motion::Search {
                    search: CharSearch::Forward(_) | CharSearch::ForwardBefore(_),
                    ..
                }
        )
    }
}

fn class(c: char, word: Word) -> u8 {
    if c.is_whitespace() {
        0
    } else if word == Word::BigWord || c.is_alphanumeric() || c == '_' {
        1
    } else {
        2
    }
}

/// Logical line around `pos`, without its newline
pub fn line_range(text: &[char], pos: usize) -> Range<usize> {
    let pos = pos.min(text.len());
    let start = text[..pos]
        .iter()
        .rposition(|&c| c == '\n')
        .map_or(0, |i| i + 1);
    let end = text[pos..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(text.len(), |i| pos + i);
    start..end
}

pub fn first_non_blank(text: &[char], line: Range<usize>) -> usize {
    let end = line.end;
    line.clone()
        .find(|&i| !text[i].is_whitespace())
        .unwrap_or(end)
}

/// Start of the next word (`w`); the end of the text if there is none
pub fn next_word_start(text: &[char], pos: usize, word: Word) -> usize {
    let len = text.len();
    if pos >= len {
        return len;
    }
    let mut i = pos;
    let start_class = class(text[i], word);
    if start_class != 0 {
        while i < len && class(text[i], word) == start_class {
            i += 1;
        }
    }
    while i < len && class(text[i], word) == 0 {
        i += 1;
    }
    i
}

/// Last char of the next word end after `pos` (`e`)
pub fn word_end(text: &[char], pos: usize, word: Word) -> Option<usize> {
    let len = text.len();
    let mut i = pos + 1;
    while i < len && class(text[i], word) == 0 {
        i += 1;
    }
    if i >= len {
        return None;
    }
    let c = class(text[i], word);
    while i + 1 < len && class(text[i + 1], word) == c {
        i += 1;
    }
    Some(i)
}

/// Last char of the word under `pos`
pub fn current_word_end(text: &[char], pos: usize, word: Word) -> usize {
    let len = text.len();
    if pos >= len {
        return len;
    }
    let c = class(text[pos], word);
    let mut i = pos;
    while i + 1 < len && class(text[i + 1], word) == c {
        i += 1;
    }
    i
}

/// Start of the word before `pos` (`b`)
pub fn prev_word_start(text: &[char], pos: usize, word: Word) -> Option<usize> {
    let mut i = pos.min(text.len());
    if i == 0 {
        return None;
    }
    while i > 0 && class(text[i - 1], word) == 0 {
        i -= 1;
    }
    if i == 0 {
        return Some(0);
    }
    let c = class(text[i - 1], word);
    while i > 0 && class(text[i - 1], word) == c {
        i -= 1;
    }
    Some(i)
}

fn char_search(text: &[char], cursor: usize, search: CharSearch, repeat: bool, count: usize) -> Option<usize> {
    let line = line_range(text, cursor);
    let count = count.max(1);
    match search {
        CharSearch::Forward(c) | CharSearch::ForwardBefore(c) => {
            let before = matches!(search, CharSearch::ForwardBefore(_));
            let skip = if before && repeat { 2 } else { 1 };
            let idx = (cursor + skip..line.end)
                .filter(|&i| text[i] == c)
                .nth(count - 1)?;
            Some(if before { idx - 1 } else { idx })
        }
        CharSearch::Backward(c) | CharSearch::BackwardAfter(c) => {
            let after = matches!(search, CharSearch::BackwardAfter(_));
            let skip: usize = if after && repeat { 2 } else { 1 };
            let idx = (line.start..cursor.checked_sub(skip.saturating_sub(1))?)
                .rev()
                .filter(|&i| i < cursor && text[i] == c)
                .nth(count - 1)?;
            Some(if after { idx + 1 } else { idx })
        }
    }
}

fn bracket_partner(c: char) -> Option<(char, bool)> {
    match c {
        '(' => Some((')', true)),
        '[' => Some((']', true)),
        '{' => Some(('}', true)),
        ')' => Some(('(', false)),
        ']' => Some(('[', false)),
        '}' => Some(('{', false)),
        _ => None,
    }
}

/// Bracket matching the first bracket at or after `cursor` on its line (`%`)
pub fn match_bracket(text: &[char], cursor: usize) -> Option<usize> {
    let line = line_range(text, cursor);
    let start = (cursor..line.end).find(|&i| bracket_partner(text[i]).is_some())?;
    let open = text[start];
    let (close, forward) = bracket_partner(open)?;
    let mut depth = 0usize;
    let mut step = |i: usize| {
        if text[i] == open {
            depth += 1;
        } else if text[i] == close {
            depth -= 1;
            if depth == 0 {
                return true;
            }
        }
        false
    };
    if forward {
        (start..text.len()).find(|&i| step(i))
    } else {
        (0..=start).rev().find(|&i| step(i))
    }
}

fn repeat_opt(count: usize, pos: usize, f: impl Fn(usize) -> Option<usize>) -> Option<usize> {
    let mut pos = pos;
    for _ in 0..count.max(1) {
        pos = f(pos)?;
    }
    Some(pos)
}

/// Where `motion` takes the cursor. `None` when there is nowhere to go.
///
/// With `operator` set, `l` may reach the end of the line.
pub fn target(text: &[char], cursor: usize, motion: Motion, count: usize, operator: bool) -> Option<usize> {
    let cursor = cursor.min(text.len());
    let line = line_range(text, cursor);
    let count = count.max(1);
    let t = match motion {
        Motion::Left => {
            if cursor <= line.start {
                return None;
            }
            cursor.saturating_sub(count).max(line.start)
        }
        Motion::Right => {
            let limit = if operator {
                line.end
            } else {
                line.end.saturating_sub(1).max(line.start)
            };
            (cursor + count).min(limit)
        }
        Motion::LineStart => line.start,
        Motion::FirstNonBlank => first_non_blank(text, line),
        Motion::LineEnd => line.end,
        Motion::NextWordStart(word) => {
            let mut pos = cursor;
            for _ in 0..count {
                pos = next_word_start(text, pos, word);
            }
            pos
        }
        Motion::WordEnd(word) => repeat_opt(count, cursor, |p| word_end(text, p, word))?,
        Motion::PrevWordStart(word) => repeat_opt(count, cursor, |p| prev_word_start(text, p, word))?,
        Motion::Search { search, repeat } => char_search(text, cursor, search, repeat, count)?,
        Motion::MatchBracket => match_bracket(text, cursor)?,
    };
    match motion {
        // moving to where the cursor already is counts as a failed motion
        Motion::LineStart | Motion::FirstNonBlank | Motion::LineEnd => Some(t),
        _ if t == cursor => None,
        _ => Some(t),
    }
}

/// Span an operator acts on for `motion`
pub fn span(text: &[char], cursor: usize, motion: Motion, count: usize) -> Option<Range<usize>> {
    let cursor = cursor.min(text.len());
    let t = target(text, cursor, motion, count, true)?;
    let (lo, hi) = if t < cursor { (t, cursor) } else { (cursor, t) };
    let hi = if motion.is_inclusive() {
        (hi + 1).min(text.len())
    } else {
        hi
    };
    (lo < hi).then_some(lo..hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_word_motions() {
        let t = chars("foo.bar  baz");
        assert_eq!(next_word_start(&t, 0, Word::ViWord), 3);
        assert_eq!(next_word_start(&t, 0, Word::BigWord), 9);
        assert_eq!(word_end(&t, 0, Word::ViWord), Some(2));
        assert_eq!(word_end(&t, 2, Word::ViWord), Some(3));
        assert_eq!(word_end(&t, 4, Word::BigWord), Some(6));
        assert_eq!(word_end(&t, 11, Word::ViWord), None);
        assert_eq!(prev_word_start(&t, 9, Word::ViWord), Some(4));
        assert_eq!(prev_word_start(&t, 9, Word::BigWord), Some(0));
        assert_eq!(prev_word_start(&t, 0, Word::ViWord), None);
    }

    #[test]
    fn test_line_range_and_first_non_blank() {
        let t = chars("ab\n  cd\n");
        assert_eq!(line_range(&t, 1), 0..2);
        assert_eq!(line_range(&t, 4), 3..7);
        assert_eq!(line_range(&t, 8), 8..8);
        assert_eq!(first_non_blank(&t, 3..7), 5);
    }

    #[test]
    fn test_char_search() {
        let t = chars("a,b,c,d");
        let f = |s, repeat, n| target(&t, 0, Motion::Search { search: s, repeat }, n, false);
        assert_eq!(f(CharSearch::Forward(','), false, 1), Some(1));
        assert_eq!(f(CharSearch::Forward(','), false, 3), Some(5));
        assert_eq!(f(CharSearch::ForwardBefore('c'), false, 1), Some(3));
        assert_eq!(f(CharSearch::Forward('z'), false, 1), None);

        assert_eq!(
            target(&t, 6, Motion::Search { search: CharSearch::Backward('b'), repeat: false }, 1, false),
            Some(2)
        );
        assert_eq!(
            target(&t, 6, Motion::Search { search: CharSearch::BackwardAfter(','), repeat: false }, 1, false),
            None
        );
        // `t,` repeated from just before a comma moves on to the next one
        assert_eq!(
            target(&t, 0, Motion::Search { search: CharSearch::ForwardBefore(','), repeat: true }, 1, false),
            Some(2)
        );
    }

    #[test]
    fn test_match_bracket() {
        let t = chars("f(a[1], (b))");
        assert_eq!(match_bracket(&t, 0), Some(11));
        assert_eq!(match_bracket(&t, 3), Some(5));
        assert_eq!(match_bracket(&t, 11), Some(1));
        assert_eq!(match_bracket(&chars("(open"), 0), None);
        assert_eq!(match_bracket(&chars("none"), 0), None);
    }

    #[test]
    fn test_spans() {
        let t = chars("echo abc def");
        assert_eq!(span(&t, 5, Motion::NextWordStart(Word::ViWord), 1), Some(5..9));
        assert_eq!(span(&t, 5, Motion::WordEnd(Word::ViWord), 1), Some(5..8));
        assert_eq!(span(&t, 5, Motion::PrevWordStart(Word::ViWord), 1), Some(0..5));
        assert_eq!(span(&t, 5, Motion::LineEnd, 1), Some(5..12));
        assert_eq!(span(&t, 12, Motion::LineEnd, 1), None);
        assert_eq!(span(&t, 11, Motion::Right, 1), Some(11..12));
    }

    #[test]
    fn test_horizontal_limits() {
        let t = chars("abc\ndef");
        assert_eq!(target(&t, 4, Motion::Left, 1, false), None);
        assert_eq!(target(&t, 2, Motion::Right, 1, false), None);
        assert_eq!(target(&t, 2, Motion::Right, 1, true), Some(3));
        assert_eq!(target(&t, 5, Motion::Left, 9, false), Some(4));
    }
}
