//! Desktop operator core: parse the action list a vision model returns and
//! replay it on the host with pointer and keyboard events.
//!
//! ```no_run
//! use screen_operator::{Executor, hands::Desktop, parse};
//!
//! let batch = parse(r#"[{"operation": "press", "keys": ["pagedown"]}]"#)?;
//! let mut desktop = Desktop::new()?;
//! let report = Executor::new(&mut desktop).execute_batch(&batch);
//! println!("{report:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod hands;
pub mod keys;
pub mod locate;
pub mod parse;
pub mod prompts;
pub mod recording;
pub mod types;

pub use config::{ApiKey, Config};
pub use error::{ConfigError, ExecutionError, ParseError};
pub use executor::{DisplayGeometry, Executor, Host, InputDevice, Outcome, StepReport, StepStatus};
pub use keys::Key;
pub use locate::{ElementLocator, LabelMap, Point, TextLocator, Unresolved};
pub use parse::parse;
pub use recording::{InputEvent, RecordingDevice};
pub use types::{Action, ActionBatch, ActionKind, ClickTarget, Operation};
