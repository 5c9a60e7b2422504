//! Performs parsed actions on the host.
//!
//! One action at a time, strictly in batch order. Nothing waits for the UI
//! to react between actions, and host effects are never rolled back.

use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::keys::Key;
use crate::locate::{ElementLocator, Point, TextLocator, Unresolved};
use crate::types::{Action, ActionBatch, ClickTarget, Operation};

/// Host-level pointer and keyboard injection.
pub trait InputDevice {
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ExecutionError>;
    /// Single primary-button click at the current pointer position.
    fn click(&mut self) -> Result<(), ExecutionError>;
    /// Type `text` literally, whitespace and punctuation included.
    fn type_text(&mut self, text: &str) -> Result<(), ExecutionError>;
    fn key_down(&mut self, key: Key) -> Result<(), ExecutionError>;
    fn key_up(&mut self, key: Key) -> Result<(), ExecutionError>;
}

pub trait DisplayGeometry {
    /// Current pixel size of the primary display.
    fn dimensions(&self) -> Result<(u32, u32), ExecutionError>;
}

/// Anything that can both inject input and report the display size.
pub trait Host: InputDevice + DisplayGeometry {}

impl<T: InputDevice + DisplayGeometry> Host for T {}

/// What a successfully executed action means for the rest of the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Continue,
    /// The model said there was "nothing to click". No event was issued.
    NoTarget,
    Done { summary: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    /// Every action ran and none of them was `done`.
    Exhausted,
    NoTarget { index: usize },
    Done { summary: String },
    Failed { index: usize, error: ExecutionError },
}

/// Result of replaying one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Actions that completed, including a final `done` or no-op click.
    pub executed: usize,
    pub status: StepStatus,
}

impl StepReport {
    pub fn is_done(&self) -> bool {
        matches!(self.status, StepStatus::Done { .. })
    }
}

static UNRESOLVED: Unresolved = Unresolved;

pub struct Executor<'a> {
    host: &'a mut dyn Host,
    elements: &'a dyn ElementLocator,
    text: &'a dyn TextLocator,
}

impl<'a> Executor<'a> {
    pub fn new(host: &'a mut dyn Host) -> Self {
        Self {
            host,
            elements: &UNRESOLVED,
            text: &UNRESOLVED,
        }
    }

    pub fn with_elements(mut self, locator: &'a dyn ElementLocator) -> Self {
        self.elements = locator;
        self
    }

    pub fn with_text(mut self, locator: &'a dyn TextLocator) -> Self {
        self.text = locator;
        self
    }

    /// Replay `batch` in order. Stops at `done`, at a "nothing to click", or
    /// at the first failure. Later actions are never attempted.
    pub fn execute_batch(&mut self, batch: &ActionBatch) -> StepReport {
        let total = batch.len();
        for (index, action) in batch.iter().enumerate() {
            info!("action {}/{}: {}", index + 1, total, action);
            if !action.thought.is_empty() {
                debug!("thought: {}", action.thought);
            }

            let status = match self.execute(action) {
                Ok(Outcome::Continue) => continue,
                Ok(Outcome::NoTarget) => StepStatus::NoTarget { index },
                Ok(Outcome::Done { summary }) => StepStatus::Done { summary },
                Err(error) => {
                    warn!("action {} failed: {}", index + 1, error);
                    return StepReport {
                        executed: index,
                        status: StepStatus::Failed { index, error },
                    };
                }
            };

            let skipped = total - index - 1;
            if skipped > 0 {
                debug!("skipping {skipped} action(s) after {}", action.kind());
            }
            return StepReport {
                executed: index + 1,
                status,
            };
        }

        StepReport {
            executed: total,
            status: StepStatus::Exhausted,
        }
    }

    pub fn execute(&mut self, action: &Action) -> Result<Outcome, ExecutionError> {
        match &action.operation {
            Operation::Click(target) => self.click(target),
            Operation::Write { content } => {
                self.host.type_text(content)?;
                Ok(Outcome::Continue)
            }
            Operation::Press { keys } => {
                self.press(keys)?;
                Ok(Outcome::Continue)
            }
            Operation::Done { summary } => Ok(Outcome::Done {
                summary: summary.clone(),
            }),
        }
    }

    fn click(&mut self, target: &ClickTarget) -> Result<Outcome, ExecutionError> {
        let point = match target {
            ClickTarget::Position { x, y } => self.to_pixels(*x, *y)?,
            ClickTarget::Label(label) => self
                .elements
                .locate_label(label)
                .ok_or_else(|| ExecutionError::TargetNotFound(label.clone()))?,
            ClickTarget::Text(_) if target.is_nothing_to_click() => {
                info!("model found nothing to click");
                return Ok(Outcome::NoTarget);
            }
            ClickTarget::Text(text) => self
                .text
                .locate_text(text)
                .ok_or_else(|| ExecutionError::TargetNotFound(text.clone()))?,
        };

        debug!("click at ({}, {})", point.x, point.y);
        self.host.move_to(point.x, point.y)?;
        self.host.click()?;
        Ok(Outcome::Continue)
    }

    /// Display size is queried on every click; it may change between steps.
    fn to_pixels(&self, x: f64, y: f64) -> Result<Point, ExecutionError> {
        for (name, value) in [("x", x), ("y", y)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ExecutionError::InvalidAction(format!(
                    "click: {name}={value} is outside [0, 1]"
                )));
            }
        }

        let (width, height) = self.host.dimensions()?;
        if width == 0 || height == 0 {
            return Err(ExecutionError::Input(format!(
                "display reports an empty size ({width}x{height})"
            )));
        }
        Ok(Point::new(scale(x, width), scale(y, height)))
    }

    /// Key-down for every key in order, then key-up in reverse. All names
    /// are resolved first so an unknown key never leaves a modifier held.
    fn press(&mut self, names: &[String]) -> Result<(), ExecutionError> {
        let keys = names
            .iter()
            .map(|name| Key::from_name(name).ok_or_else(|| ExecutionError::UnknownKey(name.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        if keys.is_empty() {
            return Err(ExecutionError::InvalidAction("press: no keys given".into()));
        }

        for (held, key) in keys.iter().enumerate() {
            if let Err(e) = self.host.key_down(*key) {
                if let Err(release_err) = self.release(&keys[..held]) {
                    warn!("releasing held keys after failed key-down: {release_err}");
                }
                return Err(e);
            }
        }
        self.release(&keys)
    }

    /// Release in reverse order. Keeps going past failures and reports the first.
    fn release(&mut self, keys: &[Key]) -> Result<(), ExecutionError> {
        let mut result = Ok(());
        for key in keys.iter().rev() {
            if let Err(e) = self.host.key_up(*key) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

/// Round to the nearest pixel and stay on screen (`1.0` maps to the last pixel).
fn scale(fraction: f64, extent: u32) -> i32 {
    let max = i64::from(extent) - 1;
    let pixel = (fraction * f64::from(extent)).round() as i64;
    pixel.clamp(0, max) as i32
}
