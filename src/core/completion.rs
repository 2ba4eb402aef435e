//! Completion provider contract and the state the editor keeps between
//! completion keystrokes.
//!
//! Ranking is the provider's business; the editor only cycles through the
//! candidates in the order they come back.

use std::error::Error;
use std::ops::Range;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use crate::terminal::width::display_width;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted into the buffer
    pub text: String,
    /// Label shown in listings, when it differs from `text`
    pub display: Option<String>,
    pub tooltip: Option<String>,
}

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            display: None,
            tooltip: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn label(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.text)
    }
}

/// What a provider returns: the span of the input to replace, in chars, and
/// the candidates for it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    pub replacement_start: usize,
    pub replacement_length: usize,
    pub candidates: Vec<Candidate>,
}

impl Completions {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Longest prefix shared by every candidate
    pub fn common_prefix(&self) -> String {
        let mut iter = self.candidates.iter();
        let Some(first) = iter.next() else {
            return String::new();
        };
        let mut prefix: Vec<char> = first.text.chars().collect();
        for candidate in iter {
            let shared = prefix
                .iter()
                .zip(candidate.text.chars())
                .take_while(|(a, b)| **a == *b)
                .count();
            prefix.truncate(shared);
        }
        prefix.into_iter().collect()
    }
}

pub trait CompletionProvider {
    fn complete(&self, input: &str, cursor: usize) -> Result<Completions, Box<dyn Error>>;
}

/// Ask `provider` for completions.
///
/// Errors and panics inside the provider yield no candidates. The
/// replacement span is clamped to the input.
pub fn request(provider: Option<&dyn CompletionProvider>, input: &str, cursor: usize) -> Completions {
    let Some(provider) = provider else {
        return Completions::default();
    };
    let mut completions = match catch_unwind(AssertUnwindSafe(|| provider.complete(input, cursor))) {
        Ok(Ok(completions)) => completions,
        Ok(Err(e)) => {
            warn!(error = %e, "completion provider failed");
            return Completions::default();
        }
        Err(_) => {
            warn!("completion provider panicked");
            return Completions::default();
        }
    };
    let len = input.chars().count();
    completions.replacement_start = completions.replacement_start.min(len);
    completions.replacement_length = completions
        .replacement_length
        .min(len - completions.replacement_start);
    completions
}

/// Tab-cycling position through one set of completions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCycle {
    pub completions: Completions,
    /// Candidate currently in the buffer, `None` before the first step
    pub index: Option<usize>,
    /// Span of the buffer currently holding the inserted text
    pub span: Range<usize>,
}

impl CompletionCycle {
    pub fn new(completions: Completions) -> Self {
        let start = completions.replacement_start;
        let span = start..start + completions.replacement_length;
        Self {
            completions,
            index: None,
            span,
        }
    }

    /// Step to the next (or previous) candidate, wrapping around
    pub fn step(&mut self, backward: bool) -> Option<&Candidate> {
        let n = self.completions.len();
        if n == 0 {
            return None;
        }
        let next = match (self.index, backward) {
            (None, false) => 0,
            (None, true) => n - 1,
            (Some(i), false) => (i + 1) % n,
            (Some(i), true) => (i + n - 1) % n,
        };
        self.index = Some(next);
        self.completions.candidates.get(next)
    }
}

/// Lay candidate labels out in columns that fit `width`, row-major
pub fn format_columns(labels: &[&str], width: usize) -> Vec<String> {
    if labels.is_empty() {
        return Vec::new();
    }
    let widest = labels.iter().map(|l| display_width(l)).max().unwrap_or(0);
    let column = widest + 2;
    let per_row = (width / column.max(1)).max(1);
    labels
        .chunks(per_row)
        .map(|row| {
            let mut line = String::new();
            for (i, label) in row.iter().enumerate() {
                line.push_str(label);
                if i + 1 < row.len() {
                    let pad = column - display_width(label);
                    line.extend(std::iter::repeat_n(' ', pad));
                }
            }
            line
        })
        .collect()
}

/// Completes file-like words from a fixed list; used by the demo binary and
/// tests
#[derive(Debug, Clone, Default)]
pub struct WordListCompleter {
    words: Vec<String>,
}

impl WordListCompleter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompletionProvider for WordListCompleter {
    fn complete(&self, input: &str, cursor: usize) -> Result<Completions, Box<dyn Error>> {
        let chars: Vec<char> = input.chars().collect();
        let cursor = cursor.min(chars.len());
        let start = chars[..cursor]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |i| i + 1);
        let word: String = chars[start..cursor].iter().collect();
        let candidates = self
            .words
            .iter()
            .filter(|w| w.starts_with(&word))
            .map(Candidate::new)
            .collect();
        Ok(Completions {
            replacement_start: start,
            replacement_length: cursor - start,
            candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl CompletionProvider for Failing {
        fn complete(&self, _: &str, _: usize) -> Result<Completions, Box<dyn Error>> {
            Err("no completions today".into())
        }
    }

    struct Panicking;

    impl CompletionProvider for Panicking {
        fn complete(&self, _: &str, _: usize) -> Result<Completions, Box<dyn Error>> {
            panic!("provider bug")
        }
    }

    struct OutOfBounds;

    impl CompletionProvider for OutOfBounds {
        fn complete(&self, _: &str, _: usize) -> Result<Completions, Box<dyn Error>> {
            Ok(Completions {
                replacement_start: 40,
                replacement_length: 9,
                candidates: vec![Candidate::new("x")],
            })
        }
    }

    #[test]
    fn test_word_list_completer() {
        let completer = WordListCompleter::new(["cargo", "cat", "echo"]);
        let c = request(Some(&completer), "sudo ca", 7);
        assert_eq!(c.replacement_start, 5);
        assert_eq!(c.replacement_length, 2);
        assert_eq!(c.len(), 2);
        assert_eq!(c.common_prefix(), "ca");
    }

    #[test]
    fn test_provider_failures_degrade_to_empty() {
        assert!(request(Some(&Failing), "abc", 3).is_empty());
        assert!(request(Some(&Panicking), "abc", 3).is_empty());
        assert!(request(None, "abc", 3).is_empty());
    }

    #[test]
    fn test_span_is_clamped() {
        let c = request(Some(&OutOfBounds), "abc", 3);
        assert_eq!(c.replacement_start, 3);
        assert_eq!(c.replacement_length, 0);
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let completer = WordListCompleter::new(["aa", "ab", "ac"]);
        let mut cycle = CompletionCycle::new(request(Some(&completer), "a", 1));
        assert_eq!(cycle.step(false).map(|c| c.text.as_str()), Some("aa"));
        assert_eq!(cycle.step(false).map(|c| c.text.as_str()), Some("ab"));
        assert_eq!(cycle.step(false).map(|c| c.text.as_str()), Some("ac"));
        assert_eq!(cycle.step(false).map(|c| c.text.as_str()), Some("aa"));
        assert_eq!(cycle.step(true).map(|c| c.text.as_str()), Some("ac"));
    }

    #[test]
    fn test_format_columns() {
        let rows = format_columns(&["one", "two", "three"], 16);
        assert_eq!(rows, vec!["one    two", "three"]);
        assert_eq!(format_columns(&["wide-label"], 4), vec!["wide-label"]);
    }
}
