//! Display-cell arithmetic
//!
//! Everything that places text on the screen measures it here: the render
//! engine when it lays out the input, and the suggestion view when it fits
//! list entries into a column budget. Offsets are char (Unicode scalar)
//! indices; measuring walks grapheme clusters so combining sequences never
//! get split.

use unicode_segmentation::UnicodeSegmentation;

/// Get the display width of a single character (for monospace terminal display)
/// Returns 0 for control characters, 1 for ASCII, 2 for wide CJK characters, etc.
pub fn char_width(c: char) -> usize {
    unicode_width::UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Width of a grapheme cluster as the renderer draws it.
///
/// Control characters are drawn in caret notation (`^A`), so they take two
/// cells even though the terminal would give them none.
pub fn grapheme_width(g: &str) -> usize {
    match control_caret(g) {
        Some(_) => 2,
        None => g.chars().map(char_width).sum(),
    }
}

/// The caret form of a single control character, e.g. `\u{1}` -> `^A`
pub fn control_caret(g: &str) -> Option<String> {
    let mut chars = g.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_control() || c == '\n' {
        return None;
    }
    let code = c as u32;
    let shown = match code {
        0x00..=0x1f => char::from_u32(code + 0x40)?,
        0x7f => '?',
        // C1 controls have no caret form; show them as a generic marker
        _ => '?',
    };
    Some(format!("^{}", shown))
}

/// Display width of a whole string
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Display width of the chars in `[from, to)`
pub fn display_width_range(s: &str, from: usize, to: usize) -> usize {
    let to = to.min(s.chars().count());
    if from >= to {
        return 0;
    }
    display_width(char_slice(s, from, to))
}

/// Slice a `str` by char indices (clamped)
pub fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let start = byte_index(s, from);
    let end = byte_index(s, to).max(start);
    &s[start..end]
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Longest prefix of `s[start..]` whose width does not exceed `max_width`.
///
/// Never splits a grapheme; a wide grapheme that would straddle the limit is
/// left out, so the result may be one cell narrower than asked for.
pub fn substring_by_width(s: &str, start: usize, max_width: usize) -> &str {
    let tail = char_slice(s, start, usize::MAX);
    let mut used = 0;
    let mut end = 0;
    for (idx, g) in tail.grapheme_indices(true) {
        let w = grapheme_width(g);
        if used + w > max_width {
            break;
        }
        used += w;
        end = idx + g.len();
    }
    &tail[..end]
}

/// Longest suffix of `s[..end]` whose width does not exceed `max_width`
pub fn substring_by_width_from_end(s: &str, end: usize, max_width: usize) -> &str {
    let head = char_slice(s, 0, end);
    let mut used = 0;
    let mut start = head.len();
    for (idx, g) in head.grapheme_indices(true).rev() {
        let w = grapheme_width(g);
        if used + w > max_width {
            break;
        }
        used += w;
        start = idx;
    }
    &head[start..]
}

/// Truncate to `max_width` cells, replacing the cut tail with `marker`
pub fn truncate_with_marker(s: &str, max_width: usize, marker: &str) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    let marker_width = display_width(marker);
    if max_width < marker_width {
        return substring_by_width(s, 0, max_width).to_string();
    }
    let mut out = substring_by_width(s, 0, max_width - marker_width).to_string();
    out.push_str(marker);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('漢'), 2);
        assert_eq!(char_width('\u{301}'), 0);
    }

    #[test]
    fn test_control_chars_are_caret_drawn() {
        assert_eq!(control_caret("\u{1}"), Some("^A".to_string()));
        assert_eq!(control_caret("\u{7f}"), Some("^?".to_string()));
        assert_eq!(control_caret("\t"), Some("^I".to_string()));
        assert_eq!(control_caret("\n"), None);
        assert_eq!(control_caret("a"), None);
        assert_eq!(display_width("a\u{3}b"), 4);
    }

    #[test]
    fn test_display_width_range() {
        let s = "ab漢字cd";
        assert_eq!(display_width(s), 8);
        assert_eq!(display_width_range(s, 2, 4), 4);
        assert_eq!(display_width_range(s, 4, 100), 2);
        assert_eq!(display_width_range(s, 5, 3), 0);
    }

    #[test]
    fn test_combining_sequence_is_one_cell() {
        let s = "e\u{301}x";
        assert_eq!(display_width(s), 2);
        assert_eq!(substring_by_width(s, 0, 1), "e\u{301}");
    }

    #[test]
    fn test_substring_by_width_does_not_split_wide() {
        let s = "a漢b";
        assert_eq!(substring_by_width(s, 0, 2), "a");
        assert_eq!(substring_by_width(s, 0, 3), "a漢");
        assert_eq!(substring_by_width(s, 1, 10), "漢b");
    }

    #[test]
    fn test_substring_from_end() {
        let s = "hello world";
        assert_eq!(substring_by_width_from_end(s, 5, 3), "llo");
        assert_eq!(substring_by_width_from_end(s, 11, 0), "");
        assert_eq!(substring_by_width_from_end("漢字", 2, 3), "字");
    }

    #[test]
    fn test_truncate_with_marker() {
        assert_eq!(truncate_with_marker("short", 10, "..."), "short");
        assert_eq!(truncate_with_marker("a long label", 7, "..."), "a lo...");
        assert_eq!(truncate_with_marker("abcdef", 2, "..."), "ab");
    }
}
