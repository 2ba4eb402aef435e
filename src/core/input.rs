use std::fmt;
use std::str::FromStr;

use crate::error::EditError;

/// Logical key, independent of how the terminal encoded it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    F(u8),
    Esc,
    Enter,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Insert,
    Null,
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::F(n) => write!(f, "F{}", n),
            KeyCode::Esc => write!(f, "Escape"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Delete => write!(f, "Delete"),
            KeyCode::Home => write!(f, "Home"),
            KeyCode::End => write!(f, "End"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            KeyCode::Up => write!(f, "UpArrow"),
            KeyCode::Down => write!(f, "DownArrow"),
            KeyCode::Left => write!(f, "LeftArrow"),
            KeyCode::Right => write!(f, "RightArrow"),
            KeyCode::Insert => write!(f, "Insert"),
            KeyCode::Null => write!(f, "Null"),
        }
    }
}

/// One key press with its modifier set.
///
/// Values are kept normalized (see [`KeyPress::normalized`]) so that
/// structural equality is what binding lookups need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub code: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// A sequence of key presses bound as a unit
pub type KeyChord = Vec<KeyPress>;

impl KeyPress {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self.normalized()
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self.normalized()
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self.normalized()
    }

    /// Fold the shift flag into character keys and lower-case Ctrl+letter.
    ///
    /// `Shift+a` and `A` are the same press; `Ctrl+A` and `Ctrl+a` too, since
    /// terminals cannot tell them apart.
    pub fn normalized(mut self) -> Self {
        if let KeyCode::Char(c) = self.code {
            let mut c = c;
            if self.shift && !self.ctrl {
                c = c.to_uppercase().next().unwrap_or(c);
            }
            if self.ctrl {
                c = c.to_ascii_lowercase();
            }
            self.code = KeyCode::Char(c);
            self.shift = false;
        }
        self
    }

    /// The character this press inserts when unbound, if any
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.ctrl && !self.alt && !c.is_control() => Some(c),
            _ => None,
        }
    }

    pub fn is_plain(&self, code: KeyCode) -> bool {
        self.code == code && !self.ctrl && !self.alt && !self.shift
    }
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        KeyPress::new(code)
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.code)
    }
}

fn named_key(name: &str) -> Option<KeyCode> {
    let code = match name.to_ascii_lowercase().as_str() {
        "enter" | "return" | "ret" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" | "bs" => KeyCode::Backspace,
        "escape" | "esc" => KeyCode::Esc,
        "delete" | "del" => KeyCode::Delete,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        "uparrow" | "up" => KeyCode::Up,
        "downarrow" | "down" => KeyCode::Down,
        "leftarrow" | "left" => KeyCode::Left,
        "rightarrow" | "right" => KeyCode::Right,
        "insert" | "ins" => KeyCode::Insert,
        "space" | "spacebar" => KeyCode::Char(' '),
        "null" | "nul" => KeyCode::Null,
        _ => {
            let lower = name.to_ascii_lowercase();
            let digits = lower.strip_prefix('f')?;
            let n = digits.parse::<u8>().ok()?;
            if (1..=24).contains(&n) {
                KeyCode::F(n)
            } else {
                return None;
            }
        }
    };
    Some(code)
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() > prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

impl FromStr for KeyPress {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let original = s;
        let mut rest = s.trim();
        let mut press = KeyPress::new(KeyCode::Null);

        // ^X is the caret notation for Ctrl+X
        if rest.len() == 2 && rest.starts_with('^') {
            let c = rest.chars().nth(1).unwrap_or('@');
            return Ok(KeyPress::char(c).ctrl());
        }

        loop {
            if let Some(r) = strip_prefix_ci(rest, "ctrl+").or_else(|| strip_prefix_ci(rest, "C-"))
            {
                press.ctrl = true;
                rest = r;
            } else if let Some(r) =
                strip_prefix_ci(rest, "alt+").or_else(|| strip_prefix_ci(rest, "M-"))
            {
                press.alt = true;
                rest = r;
            } else if let Some(r) =
                strip_prefix_ci(rest, "shift+").or_else(|| strip_prefix_ci(rest, "S-"))
            {
                press.shift = true;
                rest = r;
            } else {
                break;
            }
        }

        let mut chars = rest.chars();
        press.code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            (Some(_), Some(_)) => named_key(rest)
                .ok_or_else(|| EditError::InvalidChord(format!("unknown key `{}`", original)))?,
            (None, _) => {
                return Err(EditError::InvalidChord(format!(
                    "missing key in `{}`",
                    original
                )));
            }
        };

        Ok(press.normalized())
    }
}

/// Parse a chord sequence such as `Ctrl+x,Ctrl+u`.
///
/// A comma is a separator unless it is the key itself (`,` or `Alt+,`).
pub fn parse_chord(s: &str) -> Result<KeyChord, EditError> {
    let mut keys = Vec::new();
    let mut current = String::new();

    for ch in s.trim().chars() {
        if ch == ',' && !current.trim().is_empty() && !current.ends_with('+') {
            keys.push(current.trim().parse::<KeyPress>()?);
            current.clear();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() {
        keys.push(current.trim().parse::<KeyPress>()?);
    } else if !current.is_empty() {
        // a lone space separated by commas means the space bar
        keys.push(KeyPress::char(' '));
    }

    if keys.is_empty() {
        return Err(EditError::InvalidChord(format!("empty chord `{}`", s)));
    }
    Ok(keys)
}

pub fn format_chord(chord: &[KeyPress]) -> String {
    chord
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_str() {
        let ctrl_x: KeyPress = "^X".parse().unwrap();
        assert_eq!(ctrl_x, KeyPress::char('x').ctrl());

        let meta_f: KeyPress = "M-f".parse().unwrap();
        assert_eq!(meta_f, KeyPress::char('f').alt());

        let plain: KeyPress = "a".parse().unwrap();
        assert_eq!(plain, KeyPress::char('a'));
        assert!(!plain.ctrl);
        assert!(!plain.alt);
    }

    #[test]
    fn test_modifier_order_and_case() {
        let a: KeyPress = "Ctrl+Shift+LeftArrow".parse().unwrap();
        let b: KeyPress = "shift+ctrl+left".parse().unwrap();
        assert_eq!(a, b);
        assert!(a.ctrl && a.shift);
        assert_eq!(a.code, KeyCode::Left);

        let upper: KeyPress = "Ctrl+X".parse().unwrap();
        assert_eq!(upper, KeyPress::char('x').ctrl());

        let shifted: KeyPress = "Shift+a".parse().unwrap();
        assert_eq!(shifted, KeyPress::char('A'));
    }

    #[test]
    fn test_function_and_named_keys() {
        assert_eq!("F8".parse::<KeyPress>().unwrap().code, KeyCode::F(8));
        assert_eq!("Escape".parse::<KeyPress>().unwrap().code, KeyCode::Esc);
        assert_eq!("Space".parse::<KeyPress>().unwrap().code, KeyCode::Char(' '));
        assert!("F25".parse::<KeyPress>().is_err());
        assert!("Ctrl+Bogus".parse::<KeyPress>().is_err());
        assert!("Ctrl+".parse::<KeyPress>().is_err());
    }

    #[test]
    fn test_parse_chord_sequence() {
        let chord = parse_chord("Ctrl+x,Ctrl+u").unwrap();
        assert_eq!(chord, vec![KeyPress::char('x').ctrl(), KeyPress::char('u').ctrl()]);

        let comma = parse_chord("Alt+,").unwrap();
        assert_eq!(comma, vec![KeyPress::char(',').alt()]);

        let bare = parse_chord(",").unwrap();
        assert_eq!(bare, vec![KeyPress::char(',')]);

        assert!(parse_chord("").is_err());
        assert!(parse_chord("Ctrl+x,Hyper+q").is_err());
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        for text in ["Ctrl+x", "Alt+d", "Shift+Tab", "F12", "Ctrl+Alt+Delete"] {
            let key: KeyPress = text.parse().unwrap();
            assert_eq!(key.to_string().parse::<KeyPress>().unwrap(), key);
        }
        assert_eq!(format_chord(&parse_chord("Ctrl+x,Ctrl+x").unwrap()), "Ctrl+x,Ctrl+x");
    }

    #[test]
    fn test_printable() {
        assert_eq!(KeyPress::char('q').printable(), Some('q'));
        assert_eq!(KeyPress::char('q').ctrl().printable(), None);
        assert_eq!(KeyPress::new(KeyCode::Enter).printable(), None);
    }
}
