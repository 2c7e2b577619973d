use std::fmt;
use std::str::FromStr;

/// Logical key identifier. Character keys are stored lower-cased so that
/// `Z` and `z` address the same entry in the input store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
    Escape,
    Shift,
}

impl Key {
    pub fn char(c: char) -> Self {
        Self::Char(c.to_lowercase().next().unwrap_or(c))
    }
}

/// Error for a key name that does not map to a [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key name {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let key = match lower.as_str() {
            "arrowup" | "up" => Self::ArrowUp,
            "arrowdown" | "down" => Self::ArrowDown,
            "arrowleft" | "left" => Self::ArrowLeft,
            "arrowright" | "right" => Self::ArrowRight,
            "space" => Self::Space,
            "enter" | "return" => Self::Enter,
            "escape" | "esc" => Self::Escape,
            "shift" => Self::Shift,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::char(c),
                    _ => return Err(UnknownKey(s.to_string())),
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::ArrowUp => f.write_str("arrowup"),
            Self::ArrowDown => f.write_str("arrowdown"),
            Self::ArrowLeft => f.write_str("arrowleft"),
            Self::ArrowRight => f.write_str("arrowright"),
            Self::Space => f.write_str("space"),
            Self::Enter => f.write_str("enter"),
            Self::Escape => f.write_str("escape"),
            Self::Shift => f.write_str("shift"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_are_lowercased() {
        assert_eq!(Key::char('Z'), Key::Char('z'));
        assert_eq!("Q".parse::<Key>().unwrap(), Key::Char('q'));
    }

    #[test]
    fn named_keys_parse() {
        assert_eq!("ArrowUp".parse::<Key>().unwrap(), Key::ArrowUp);
        assert_eq!("esc".parse::<Key>().unwrap(), Key::Escape);
    }

    #[test]
    fn unknown_names_fail() {
        assert_eq!(
            "hyper".parse::<Key>().unwrap_err(),
            UnknownKey("hyper".into())
        );
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn display_parses_back() {
        for key in [Key::Char('f'), Key::ArrowLeft, Key::Space] {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), key);
        }
    }
}
