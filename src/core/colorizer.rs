//! Syntax classification for the input buffer
//!
//! The editor is language agnostic: token kinds come from a host-provided
//! [`Colorizer`]. Whatever the colorizer does (error, panic, spans out of
//! bounds), [`classify_chars`] always yields one kind per char, falling back
//! to [`TokenKind::None`] for anything it could not classify.

use std::ops::Range;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    #[default]
    None,
    Comment,
    Keyword,
    String,
    Operator,
    Variable,
    Command,
    Parameter,
    Type,
    Number,
    Member,
    Error,
}

/// A classified span, in char offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Range<usize>,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(span: Range<usize>, kind: TokenKind) -> Self {
        Self { span, kind }
    }
}

/// Partial result from a colorizer that could not finish.
///
/// `tokens` are trusted up to `valid_up_to`; the rest of the text is drawn
/// unclassified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorizeError {
    pub valid_up_to: usize,
    pub tokens: Vec<Token>,
}

pub trait Colorizer {
    fn classify(&self, text: &str) -> Result<Vec<Token>, ColorizeError>;
}

/// Classify `text` into one token kind per char
pub fn classify_chars(colorizer: Option<&dyn Colorizer>, text: &str) -> Vec<TokenKind> {
    let len = text.chars().count();
    let mut kinds = vec![TokenKind::None; len];
    let Some(colorizer) = colorizer else {
        return kinds;
    };

    let (tokens, limit) = match catch_unwind(AssertUnwindSafe(|| colorizer.classify(text))) {
        Ok(Ok(tokens)) => (tokens, len),
        Ok(Err(partial)) => {
            warn!(valid_up_to = partial.valid_up_to, "colorizer returned a partial classification");
            (partial.tokens, partial.valid_up_to.min(len))
        }
        Err(_) => {
            warn!("colorizer panicked; drawing the input unclassified");
            return kinds;
        }
    };

    for token in tokens {
        let start = token.span.start.min(limit);
        let end = token.span.end.min(limit);
        for kind in &mut kinds[start..end.max(start)] {
            *kind = token.kind;
        }
    }
    kinds
}

const KEYWORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "for", "while", "do", "done", "case", "esac", "function",
    "return", "in",
];

/// A small shell-flavoured colorizer used by the demo binary.
///
/// The first word of each command is a command name, `-x` words are
/// parameters, `$x` are variables. An unterminated quote is reported as a
/// partial classification ending where the quote starts.
#[derive(Debug, Default, Clone)]
pub struct BasicColorizer;

impl Colorizer for BasicColorizer {
    fn classify(&self, text: &str) -> Result<Vec<Token>, ColorizeError> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        let mut command_position = true;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                if c == '\n' {
                    command_position = true;
                }
                i += 1;
                continue;
            }

            let start = i;
            if c == '#' {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                tokens.push(Token::new(start..i, TokenKind::Comment));
                continue;
            }

            if c == '"' || c == '\'' {
                i += 1;
                while i < chars.len() && chars[i] != c {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(ColorizeError {
                        valid_up_to: start,
                        tokens,
                    });
                }
                i += 1;
                tokens.push(Token::new(start..i, TokenKind::String));
                command_position = false;
                continue;
            }

            if "|;&<>=(){}".contains(c) {
                i += 1;
                tokens.push(Token::new(start..i, TokenKind::Operator));
                command_position = matches!(c, '|' | ';' | '&' | '(' | '{');
                continue;
            }

            while i < chars.len() && !chars[i].is_whitespace() && !"|;&<>(){}\"'".contains(chars[i])
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let kind = if KEYWORDS.contains(&word.as_str()) {
                TokenKind::Keyword
            } else if word.starts_with('$') {
                TokenKind::Variable
            } else if word.starts_with('-') && word.len() > 1 {
                TokenKind::Parameter
            } else if word.parse::<f64>().is_ok() {
                TokenKind::Number
            } else if command_position {
                TokenKind::Command
            } else {
                TokenKind::None
            };
            let keeps_command_position = kind == TokenKind::Keyword;
            tokens.push(Token::new(start..i, kind));
            command_position = keeps_command_position;
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Panicking;

    impl Colorizer for Panicking {
        fn classify(&self, _text: &str) -> Result<Vec<Token>, ColorizeError> {
            panic!("colorizer bug");
        }
    }

    struct OutOfBounds;

    impl Colorizer for OutOfBounds {
        fn classify(&self, _text: &str) -> Result<Vec<Token>, ColorizeError> {
            Ok(vec![Token::new(2..50, TokenKind::String)])
        }
    }

    #[test]
    fn test_basic_classification() {
        let kinds = classify_chars(Some(&BasicColorizer), "ls -la $HOME");
        assert_eq!(kinds[0], TokenKind::Command);
        assert_eq!(kinds[3], TokenKind::Parameter);
        assert_eq!(kinds[7], TokenKind::Variable);
        assert_eq!(kinds[2], TokenKind::None);
    }

    #[test]
    fn test_pipeline_restarts_command_position() {
        let kinds = classify_chars(Some(&BasicColorizer), "a | b");
        assert_eq!(kinds[0], TokenKind::Command);
        assert_eq!(kinds[2], TokenKind::Operator);
        assert_eq!(kinds[4], TokenKind::Command);
    }

    #[test]
    fn test_unterminated_string_falls_back_after_valid_prefix() {
        let kinds = classify_chars(Some(&BasicColorizer), "echo \"abc");
        assert_eq!(kinds[0], TokenKind::Command);
        assert!(kinds[5..].iter().all(|k| *k == TokenKind::None));
    }

    #[test]
    fn test_panicking_colorizer_is_contained() {
        let kinds = classify_chars(Some(&Panicking), "abc");
        assert_eq!(kinds, vec![TokenKind::None; 3]);
    }

    #[test]
    fn test_out_of_bounds_spans_are_clamped() {
        let kinds = classify_chars(Some(&OutOfBounds), "abcd");
        assert_eq!(
            kinds,
            vec![TokenKind::None, TokenKind::None, TokenKind::String, TokenKind::String]
        );
    }

    #[test]
    fn test_no_colorizer() {
        assert_eq!(classify_chars(None, "xy"), vec![TokenKind::None; 2]);
    }
}
