//! Exit-key parsing for the preview window.
//!
//! `display.exit_key` in the config is a plain string (`"q"` by default).
//! [`parse_key`] turns it into the [`egui::Key`] the window listens for.
//! Escape always ends the session as well, whatever the configured key.
//!
//! ```
//! use glavox::hotkey::parse_key;
//!
//! assert_eq!(parse_key("q"), Some(egui::Key::Q));
//! assert_eq!(parse_key("Escape"), Some(egui::Key::Escape));
//! assert_eq!(parse_key("xyz"), None);
//! ```

use egui::Key;

/// Key used when `display.exit_key` is not recognised.
pub const DEFAULT_EXIT_KEY: Key = Key::Q;

/// Parse a key name from the config.
///
/// Supports single ASCII letters and digits (case-insensitive), F1–F12 and a
/// few named keys.  Returns `None` for anything else so callers can fall back
/// to [`DEFAULT_EXIT_KEY`].
pub fn parse_key(key_str: &str) -> Option<Key> {
    let key = key_str.trim();
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return letter_or_digit(c.to_ascii_uppercase());
    }

    match key {
        "Escape" | "Esc" => Some(Key::Escape),
        "Space" => Some(Key::Space),
        "Return" | "Enter" => Some(Key::Enter),
        "Tab" => Some(Key::Tab),
        "Backspace" => Some(Key::Backspace),
        "Delete" | "Del" => Some(Key::Delete),
        "F1" => Some(Key::F1),
        "F2" => Some(Key::F2),
        "F3" => Some(Key::F3),
        "F4" => Some(Key::F4),
        "F5" => Some(Key::F5),
        "F6" => Some(Key::F6),
        "F7" => Some(Key::F7),
        "F8" => Some(Key::F8),
        "F9" => Some(Key::F9),
        "F10" => Some(Key::F10),
        "F11" => Some(Key::F11),
        "F12" => Some(Key::F12),
        _ => None,
    }
}

fn letter_or_digit(c: char) -> Option<Key> {
    const LETTERS: [Key; 26] = [
        Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
        Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
        Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
    ];
    const DIGITS: [Key; 10] = [
        Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
        Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
    ];

    match c {
        'A'..='Z' => Some(LETTERS[(c as u8 - b'A') as usize]),
        '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_letter_keys_case_insensitive() {
        assert_eq!(parse_key("q"), Some(Key::Q));
        assert_eq!(parse_key("Q"), Some(Key::Q));
        assert_eq!(parse_key("a"), Some(Key::A));
        assert_eq!(parse_key("z"), Some(Key::Z));
    }

    #[test]
    fn parse_digits() {
        assert_eq!(parse_key("0"), Some(Key::Num0));
        assert_eq!(parse_key("7"), Some(Key::Num7));
    }

    #[test]
    fn parse_named_keys() {
        assert_eq!(parse_key("Escape"), Some(Key::Escape));
        assert_eq!(parse_key("Esc"), Some(Key::Escape));
        assert_eq!(parse_key("Enter"), Some(Key::Enter));
        assert_eq!(parse_key(" F10 "), Some(Key::F10));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("?"), None);
        assert_eq!(parse_key("Ctrl+Q"), None);
    }
}
