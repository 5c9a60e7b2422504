use thiserror::Error;

/// Why a model response could not be turned into an action batch.
///
/// Parsing is all-or-nothing: either variant means no action from the
/// response is executed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// No JSON array or object could be recovered from the text.
    #[error("malformed model response: no action list found in {} chars of output", raw.len())]
    MalformedResponse { raw: String },

    /// The JSON decoded, but one action does not match its declared operation.
    #[error("invalid action at index {index}: {reason}")]
    InvalidAction { index: usize, reason: String },
}

/// A single action failed on the host. The rest of the batch is abandoned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("click target not found: {0:?}")]
    TargetNotFound(String),

    #[error("unknown key name: {0:?}")]
    UnknownKey(String),

    /// The host input subsystem rejected an event.
    #[error("input backend error: {0}")]
    Input(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set in environment")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}
