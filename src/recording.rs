//! In-memory host for dry runs and tests: records input instead of sending it.

use std::cell::Cell;
use std::collections::HashSet;

use tracing::info;

use crate::error::ExecutionError;
use crate::executor::{DisplayGeometry, InputDevice};
use crate::keys::Key;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MoveTo { x: i32, y: i32 },
    Click,
    Text(String),
    KeyDown(Key),
    KeyUp(Key),
}

/// A fake display of fixed size that logs every event it receives.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    width: u32,
    height: u32,
    events: Vec<InputEvent>,
    rejected: HashSet<Key>,
    dimension_queries: Cell<usize>,
    echo: bool,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Also log each event at info level, for `--dry-run`.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Make key-down of `key` fail, to exercise error paths.
    pub fn reject_key(&mut self, key: Key) {
        self.rejected.insert(key);
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn dimension_queries(&self) -> usize {
        self.dimension_queries.get()
    }

    fn record(&mut self, event: InputEvent) {
        if self.echo {
            info!("dry-run: {event:?}");
        }
        self.events.push(event);
    }
}

impl InputDevice for RecordingDevice {
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ExecutionError> {
        self.record(InputEvent::MoveTo { x, y });
        Ok(())
    }

    fn click(&mut self) -> Result<(), ExecutionError> {
        self.record(InputEvent::Click);
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), ExecutionError> {
        self.record(InputEvent::Text(text.to_string()));
        Ok(())
    }

    fn key_down(&mut self, key: Key) -> Result<(), ExecutionError> {
        if self.rejected.contains(&key) {
            return Err(ExecutionError::Input(format!("key {key} rejected")));
        }
        self.record(InputEvent::KeyDown(key));
        Ok(())
    }

    fn key_up(&mut self, key: Key) -> Result<(), ExecutionError> {
        self.record(InputEvent::KeyUp(key));
        Ok(())
    }
}

impl DisplayGeometry for RecordingDevice {
    fn dimensions(&self) -> Result<(u32, u32), ExecutionError> {
        self.dimension_queries.set(self.dimension_queries.get() + 1);
        Ok((self.width, self.height))
    }
}
