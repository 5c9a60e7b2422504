//! Key names the model may use in `press` actions.

use std::fmt;

/// A host-independent key. The input backend maps these to native keycodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Control,
    Shift,
    Alt,
    /// Command on macOS, the Windows key elsewhere.
    Meta,
    CapsLock,
    /// F1 through F20.
    Function(u8),
    Char(char),
}

impl Key {
    /// Resolve a key name as written by the model. Names are matched
    /// case-insensitively. A single character resolves to itself.
    pub fn from_name(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(match c {
                ' ' => Key::Space,
                '\n' => Key::Enter,
                '\t' => Key::Tab,
                c => Key::Char(c),
            });
        }

        let lower = name.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "space" | "spacebar" => Key::Space,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "esc" | "escape" => Key::Escape,
            "up" | "arrowup" | "uparrow" => Key::Up,
            "down" | "arrowdown" | "downarrow" => Key::Down,
            "left" | "arrowleft" | "leftarrow" => Key::Left,
            "right" | "arrowright" | "rightarrow" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" | "page_up" => Key::PageUp,
            "pagedown" | "pgdn" | "page_down" => Key::PageDown,
            "ctrl" | "control" | "ctrlleft" | "ctrlright" => Key::Control,
            "shift" | "shiftleft" | "shiftright" => Key::Shift,
            "alt" | "option" | "altleft" | "altright" | "optionleft" | "optionright" => Key::Alt,
            "command" | "cmd" | "win" | "winleft" | "winright" | "super" | "meta" => Key::Meta,
            "capslock" => Key::CapsLock,
            other => return function_key(other),
        };
        Some(key)
    }

    pub fn is_modifier(self) -> bool {
        matches!(self, Key::Control | Key::Shift | Key::Alt | Key::Meta)
    }
}

fn function_key(name: &str) -> Option<Key> {
    let n: u8 = name.strip_prefix('f')?.parse().ok()?;
    (1..=20).contains(&n).then_some(Key::Function(n))
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Function(n) => write!(f, "f{n}"),
            Key::Char(c) => write!(f, "{c}"),
            other => write!(f, "{}", format!("{other:?}").to_ascii_lowercase()),
        }
    }
}
