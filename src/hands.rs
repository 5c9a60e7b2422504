use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use tracing::debug;

use crate::error::ExecutionError;
use crate::executor::{DisplayGeometry, InputDevice};
use crate::keys::Key;

/// The real desktop: pointer and keyboard events go to the OS through enigo.
pub struct Desktop {
    enigo: Enigo,
}

impl Desktop {
    pub fn new() -> Result<Self, ExecutionError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ExecutionError::Input(format!("failed to init enigo: {e}")))?;
        Ok(Self { enigo })
    }
}

fn input_error(context: &'static str) -> impl Fn(enigo::InputError) -> ExecutionError {
    move |e| ExecutionError::Input(format!("{context}: {e}"))
}

impl InputDevice for Desktop {
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ExecutionError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(input_error("failed to move pointer"))
    }

    fn click(&mut self) -> Result<(), ExecutionError> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(input_error("failed to click"))
    }

    fn type_text(&mut self, text: &str) -> Result<(), ExecutionError> {
        self.enigo
            .text(text)
            .map_err(input_error("failed to type text"))?;
        debug!("typed {} chars", text.chars().count());
        Ok(())
    }

    fn key_down(&mut self, key: Key) -> Result<(), ExecutionError> {
        self.enigo
            .key(native_key(key), Direction::Press)
            .map_err(input_error("failed to press key"))
    }

    fn key_up(&mut self, key: Key) -> Result<(), ExecutionError> {
        self.enigo
            .key(native_key(key), Direction::Release)
            .map_err(input_error("failed to release key"))
    }
}

impl DisplayGeometry for Desktop {
    fn dimensions(&self) -> Result<(u32, u32), ExecutionError> {
        let (width, height) = self
            .enigo
            .main_display()
            .map_err(input_error("failed to query display size"))?;
        Ok((width.max(0) as u32, height.max(0) as u32))
    }
}

fn native_key(key: Key) -> enigo::Key {
    use enigo::Key as K;
    match key {
        Key::Enter => K::Return,
        Key::Tab => K::Tab,
        Key::Space => K::Space,
        Key::Backspace => K::Backspace,
        Key::Delete => K::Delete,
        Key::Escape => K::Escape,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Control => K::Control,
        Key::Shift => K::Shift,
        Key::Alt => K::Alt,
        Key::Meta => K::Meta,
        Key::CapsLock => K::CapsLock,
        Key::Function(n) => function_key(n),
        Key::Char(c) => K::Unicode(c),
    }
}

fn function_key(n: u8) -> enigo::Key {
    use enigo::Key as K;
    match n {
        1 => K::F1,
        2 => K::F2,
        3 => K::F3,
        4 => K::F4,
        5 => K::F5,
        6 => K::F6,
        7 => K::F7,
        8 => K::F8,
        9 => K::F9,
        10 => K::F10,
        11 => K::F11,
        12 => K::F12,
        13 => K::F13,
        14 => K::F14,
        15 => K::F15,
        16 => K::F16,
        17 => K::F17,
        18 => K::F18,
        19 => K::F19,
        // keys::Key only admits F1..=F20
        _ => K::F20,
    }
}
