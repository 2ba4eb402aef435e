//! Terminal color definitions and ANSI conversion
//!
//! Provides the Color enum used by the frame builder and the fixed palette
//! that maps colorizer token kinds to colors.

use crate::core::colorizer::TokenKind;

/// Terminal color definition - supporting Reset, RGB, and 16-color ANSI
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Reset,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    /// Convert Color enum to ANSI foreground color code
    pub fn to_ansi_fg_code(self) -> String {
        match self {
            Color::Reset => "39".to_string(),
            Color::Black => "30".to_string(),
            Color::Red => "31".to_string(),
            Color::Green => "32".to_string(),
            Color::Yellow => "33".to_string(),
            Color::Blue => "34".to_string(),
            Color::Magenta => "35".to_string(),
            Color::Cyan => "36".to_string(),
            Color::White => "37".to_string(),
            Color::BrightBlack => "90".to_string(),
            Color::BrightRed => "91".to_string(),
            Color::BrightGreen => "92".to_string(),
            Color::BrightYellow => "93".to_string(),
            Color::BrightBlue => "94".to_string(),
            Color::BrightMagenta => "95".to_string(),
            Color::BrightCyan => "96".to_string(),
            Color::BrightWhite => "97".to_string(),
            Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        }
    }

    /// Convert Color enum to ANSI background color code
    pub fn to_ansi_bg_code(self) -> String {
        match self {
            Color::Reset => "49".to_string(),
            Color::Black => "40".to_string(),
            Color::Red => "41".to_string(),
            Color::Green => "42".to_string(),
            Color::Yellow => "43".to_string(),
            Color::Blue => "44".to_string(),
            Color::Magenta => "45".to_string(),
            Color::Cyan => "46".to_string(),
            Color::White => "47".to_string(),
            Color::BrightBlack => "100".to_string(),
            Color::BrightRed => "101".to_string(),
            Color::BrightGreen => "102".to_string(),
            Color::BrightYellow => "103".to_string(),
            Color::BrightBlue => "104".to_string(),
            Color::BrightMagenta => "105".to_string(),
            Color::BrightCyan => "106".to_string(),
            Color::BrightWhite => "107".to_string(),
            Color::Rgb { r, g, b } => format!("48;2;{};{};{}", r, g, b),
        }
    }

    /// Full SGR sequence selecting this foreground and `bg` as background
    pub fn sgr(fg: Color, bg: Color) -> String {
        format!("\x1b[{};{}m", fg.to_ansi_fg_code(), bg.to_ansi_bg_code())
    }
}

/// Colors for every element the frame builder draws
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub default: Color,
    pub comment: Color,
    pub keyword: Color,
    pub string: Color,
    pub operator: Color,
    pub variable: Color,
    pub command: Color,
    pub parameter: Color,
    pub type_name: Color,
    pub number: Color,
    pub member: Color,
    pub error: Color,
    pub prompt: Color,
    pub continuation_prompt: Color,
    pub inline_prediction: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub list_highlight: Color,
    pub list_source: Color,
    pub status: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            default: Color::Reset,
            comment: Color::Green,
            keyword: Color::BrightGreen,
            string: Color::Cyan,
            operator: Color::BrightBlack,
            variable: Color::BrightGreen,
            command: Color::Yellow,
            parameter: Color::BrightBlack,
            type_name: Color::White,
            number: Color::BrightWhite,
            member: Color::White,
            error: Color::Red,
            prompt: Color::Reset,
            continuation_prompt: Color::BrightBlack,
            inline_prediction: Color::BrightBlack,
            selection_fg: Color::Black,
            selection_bg: Color::White,
            list_highlight: Color::BrightYellow,
            list_source: Color::BrightBlack,
            status: Color::Reset,
        }
    }
}

impl Palette {
    pub fn token(&self, kind: TokenKind) -> Color {
        match kind {
            TokenKind::None => self.default,
            TokenKind::Comment => self.comment,
            TokenKind::Keyword => self.keyword,
            TokenKind::String => self.string,
            TokenKind::Operator => self.operator,
            TokenKind::Variable => self.variable,
            TokenKind::Command => self.command,
            TokenKind::Parameter => self.parameter,
            TokenKind::Type => self.type_name,
            TokenKind::Number => self.number,
            TokenKind::Member => self.member,
            TokenKind::Error => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_codes() {
        assert_eq!(Color::Red.to_ansi_fg_code(), "31");
        assert_eq!(Color::Red.to_ansi_bg_code(), "41");
        assert_eq!(Color::Rgb { r: 1, g: 2, b: 3 }.to_ansi_fg_code(), "38;2;1;2;3");
        assert_eq!(Color::sgr(Color::Reset, Color::Reset), "\x1b[39;49m");
    }

    #[test]
    fn test_palette_maps_every_token_kind() {
        let palette = Palette::default();
        assert_eq!(palette.token(TokenKind::None), Color::Reset);
        assert_eq!(palette.token(TokenKind::Error), Color::Red);
        assert_eq!(palette.token(TokenKind::Command), Color::Yellow);
    }
}
