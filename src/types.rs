use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// OCR click text meaning "no match on screen, try another strategy".
pub const NOTHING_TO_CLICK: &str = "nothing to click";

/// Every kind-specific field the model may emit. Used to reject fields that
/// belong to a different operation than the one declared.
const PAYLOAD_FIELDS: [&str; 7] = ["x", "y", "label", "text", "content", "keys", "summary"];

/// The closed set of operations a model may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Write,
    Press,
    Done,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Write => "write",
            ActionKind::Press => "press",
            ActionKind::Done => "done",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "click" => Some(ActionKind::Click),
            "write" => Some(ActionKind::Write),
            "press" => Some(ActionKind::Press),
            "done" => Some(ActionKind::Done),
            _ => None,
        }
    }

    fn payload_fields(self) -> &'static [&'static str] {
        match self {
            ActionKind::Click => &["x", "y", "label", "text"],
            ActionKind::Write => &["content"],
            ActionKind::Press => &["keys"],
            ActionKind::Done => &["summary"],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a click lands. Exactly one addressing strategy per click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    /// Fractions of the primary display's width and height, each in `[0, 1]`.
    Position { x: f64, y: f64 },
    /// Identifier of a labeled screen region, e.g. `~34`.
    Label(String),
    /// Visible text to find on screen.
    Text(String),
}

impl ClickTarget {
    pub fn is_nothing_to_click(&self) -> bool {
        matches!(self, ClickTarget::Text(text) if text.trim().eq_ignore_ascii_case(NOTHING_TO_CLICK))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Click(ClickTarget),
    Write { content: String },
    /// One key, or a chord when more than one key is listed.
    Press { keys: Vec<String> },
    Done { summary: String },
}

impl Operation {
    pub fn kind(&self) -> ActionKind {
        match self {
            Operation::Click(_) => ActionKind::Click,
            Operation::Write { .. } => ActionKind::Write,
            Operation::Press { .. } => ActionKind::Press,
            Operation::Done { .. } => ActionKind::Done,
        }
    }
}

/// A single instruction from the model. `thought` never affects execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub thought: String,
    pub operation: Operation,
}

impl Action {
    pub fn new(operation: Operation) -> Self {
        Self {
            thought: String::new(),
            operation,
        }
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = thought.into();
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.operation.kind()
    }

    /// Validate one decoded JSON object against the schema of its declared
    /// operation. The error string says which rule was broken.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", json_type(value)))?;

        let name = obj
            .get("operation")
            .ok_or("missing required field 'operation'")?
            .as_str()
            .ok_or("field 'operation' must be a string")?;
        let kind = ActionKind::from_name(name).ok_or_else(|| {
            format!("unrecognized operation {name:?} (expected: click, write, press, done)")
        })?;

        if let Some(field) = PAYLOAD_FIELDS
            .iter()
            .find(|f| obj.contains_key(**f) && !kind.payload_fields().contains(*f))
        {
            return Err(format!("{kind}: field '{field}' belongs to a different operation"));
        }

        let thought = match obj.get("thought") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err("field 'thought' must be a string".into()),
        };

        let operation = match kind {
            ActionKind::Click => Operation::Click(click_target(obj)?),
            ActionKind::Write => Operation::Write {
                content: required_str(obj, kind, "content")?,
            },
            ActionKind::Press => Operation::Press {
                keys: key_list(obj)?,
            },
            ActionKind::Done => Operation::Done {
                summary: required_str(obj, kind, "summary")?,
            },
        };

        Ok(Self { thought, operation })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn required_str(obj: &Map<String, Value>, kind: ActionKind, field: &str) -> Result<String, String> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!(
            "{kind}: field '{field}' must be a string, got {}",
            json_type(other)
        )),
        None => Err(format!("{kind}: missing required field '{field}'")),
    }
}

fn click_target(obj: &Map<String, Value>) -> Result<ClickTarget, String> {
    let has = |field: &str| obj.contains_key(field);
    let strategies = [has("x") || has("y"), has("label"), has("text")]
        .into_iter()
        .filter(|present| *present)
        .count();

    match strategies {
        0 => return Err("click: expected either 'x'/'y', 'label' or 'text'".into()),
        1 => {}
        _ => return Err("click: 'x'/'y', 'label' and 'text' are mutually exclusive".into()),
    }

    if has("label") {
        let label = required_str(obj, ActionKind::Click, "label")?;
        if label.trim().is_empty() {
            return Err("click: 'label' is empty".into());
        }
        return Ok(ClickTarget::Label(label));
    }

    if has("text") {
        let text = required_str(obj, ActionKind::Click, "text")?;
        if text.trim().is_empty() {
            return Err("click: 'text' is empty".into());
        }
        return Ok(ClickTarget::Text(text));
    }

    Ok(ClickTarget::Position {
        x: coordinate(obj, "x")?,
        y: coordinate(obj, "y")?,
    })
}

/// Coordinates arrive as numbers or numeric strings (`"0.10"`).
/// Out-of-range values are rejected, never clamped.
fn coordinate(obj: &Map<String, Value>, field: &str) -> Result<f64, String> {
    let value = obj
        .get(field)
        .ok_or_else(|| format!("click: missing required field '{field}'"))?;

    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("click: field '{field}' must be a number, got {value}"))?;

    if !n.is_finite() || !(0.0..=1.0).contains(&n) {
        return Err(format!("click: {field}={n} is outside [0, 1]"));
    }
    Ok(n)
}

fn key_list(obj: &Map<String, Value>) -> Result<Vec<String>, String> {
    let keys = match obj.get("keys") {
        None => return Err("press: missing required field 'keys'".into()),
        Some(Value::String(key)) => vec![key.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| format!("press: key names must be strings, got {item}"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(format!(
                "press: field 'keys' must be an array of strings, got {}",
                json_type(other)
            ));
        }
    };

    if keys.is_empty() {
        return Err("press: 'keys' must name at least one key".into());
    }
    if keys.iter().any(String::is_empty) {
        return Err("press: 'keys' contains an empty key name".into());
    }
    Ok(keys)
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("thought", &self.thought)?;
        map.serialize_entry("operation", &self.kind())?;
        match &self.operation {
            Operation::Click(ClickTarget::Position { x, y }) => {
                map.serialize_entry("x", x)?;
                map.serialize_entry("y", y)?;
            }
            Operation::Click(ClickTarget::Label(label)) => map.serialize_entry("label", label)?,
            Operation::Click(ClickTarget::Text(text)) => map.serialize_entry("text", text)?,
            Operation::Write { content } => map.serialize_entry("content", content)?,
            Operation::Press { keys } => map.serialize_entry("keys", keys)?,
            Operation::Done { summary } => map.serialize_entry("summary", summary)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Action::from_value(&value).map_err(de::Error::custom)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Operation::Click(ClickTarget::Position { x, y }) => write!(f, "click({x:.2}, {y:.2})"),
            Operation::Click(ClickTarget::Label(label)) => write!(f, "click(label {label})"),
            Operation::Click(ClickTarget::Text(text)) => write!(f, "click(text {text:?})"),
            Operation::Write { content } => write!(f, "write({content:?})"),
            Operation::Press { keys } => write!(f, "press({})", keys.join("+")),
            Operation::Done { summary } => write!(f, "done({summary:?})"),
        }
    }
}

/// The ordered actions from one model response. Order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionBatch {
    actions: Vec<Action>,
}

impl ActionBatch {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }

    pub fn contains_done(&self) -> bool {
        self.actions.iter().any(|a| a.kind() == ActionKind::Done)
    }
}

impl From<Vec<Action>> for ActionBatch {
    fn from(actions: Vec<Action>) -> Self {
        Self::new(actions)
    }
}

impl IntoIterator for ActionBatch {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl<'a> IntoIterator for &'a ActionBatch {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn click_accepts_string_coordinates() {
        let action = Action::from_value(&json!({
            "thought": "submit", "operation": "click", "x": "0.50", "y": "0.85"
        }))
        .unwrap();
        assert_eq!(action.thought, "submit");
        assert_eq!(
            action.operation,
            Operation::Click(ClickTarget::Position { x: 0.5, y: 0.85 })
        );
    }

    #[test]
    fn click_out_of_range_is_rejected_not_clamped() {
        let err = Action::from_value(&json!({"operation": "click", "x": 1.5, "y": 0.2})).unwrap_err();
        assert!(err.contains("outside [0, 1]"), "{err}");

        let err = Action::from_value(&json!({"operation": "click", "x": 0.5, "y": -0.01})).unwrap_err();
        assert!(err.contains("y=-0.01"), "{err}");
    }

    #[test]
    fn click_requires_both_coordinates() {
        let err = Action::from_value(&json!({"operation": "click", "x": 0.5})).unwrap_err();
        assert!(err.contains("'y'"), "{err}");
    }

    #[test]
    fn click_strategies_are_exclusive() {
        let err = Action::from_value(&json!({"operation": "click", "label": "~3", "text": "OK"}))
            .unwrap_err();
        assert!(err.contains("mutually exclusive"), "{err}");
    }

    #[test]
    fn click_by_label_and_text() {
        let label = Action::from_value(&json!({"operation": "click", "label": "~34"})).unwrap();
        assert_eq!(label.operation, Operation::Click(ClickTarget::Label("~34".into())));

        let text = Action::from_value(&json!({"operation": "click", "text": "Nothing To Click"})).unwrap();
        match text.operation {
            Operation::Click(target) => assert!(target.is_nothing_to_click()),
            other => panic!("expected click, got {other:?}"),
        }
    }

    #[test]
    fn cross_kind_fields_are_rejected() {
        let err = Action::from_value(&json!({"operation": "write", "content": "hi", "keys": ["enter"]}))
            .unwrap_err();
        assert!(err.contains("'keys'"), "{err}");

        let err = Action::from_value(&json!({"operation": "done", "summary": "ok", "x": 0.1}))
            .unwrap_err();
        assert!(err.contains("'x'"), "{err}");
    }

    #[test]
    fn unrelated_extra_fields_are_ignored() {
        let action = Action::from_value(&json!({"operation": "done", "summary": "ok", "confidence": 0.9}))
            .unwrap();
        assert_eq!(action.kind(), ActionKind::Done);
    }

    #[test]
    fn unknown_operation_is_an_error() {
        let err = Action::from_value(&json!({"operation": "scroll", "amount": 3})).unwrap_err();
        assert!(err.contains("unrecognized operation"), "{err}");
    }

    #[test]
    fn operation_name_is_case_insensitive() {
        let action = Action::from_value(&json!({"operation": "Press", "keys": ["enter"]})).unwrap();
        assert_eq!(action.kind(), ActionKind::Press);
    }

    #[test]
    fn press_keys_validation() {
        let single = Action::from_value(&json!({"operation": "press", "keys": "enter"})).unwrap();
        assert_eq!(single.operation, Operation::Press { keys: vec!["enter".into()] });

        let err = Action::from_value(&json!({"operation": "press", "keys": []})).unwrap_err();
        assert!(err.contains("at least one key"), "{err}");

        let err = Action::from_value(&json!({"operation": "press", "keys": ["ctrl", 5]})).unwrap_err();
        assert!(err.contains("must be strings"), "{err}");
    }

    #[test]
    fn missing_payload_field() {
        let err = Action::from_value(&json!({"operation": "write"})).unwrap_err();
        assert_eq!(err, "write: missing required field 'content'");
    }

    #[test]
    fn thought_must_be_a_string_when_present() {
        let err = Action::from_value(&json!({"operation": "done", "summary": "ok", "thought": 3}))
            .unwrap_err();
        assert!(err.contains("thought"), "{err}");
    }

    #[test]
    fn serialize_uses_operation_tag() {
        let action = Action::new(Operation::Press {
            keys: vec!["ctrl".into(), "l".into()],
        })
        .with_thought("focus address bar");
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({"thought": "focus address bar", "operation": "press", "keys": ["ctrl", "l"]})
        );
    }

    #[test]
    fn display_is_compact() {
        let action = Action::new(Operation::Click(ClickTarget::Position { x: 0.5, y: 0.85 }));
        assert_eq!(action.to_string(), "click(0.50, 0.85)");
        let action = Action::new(Operation::Press {
            keys: vec!["ctrl".into(), "end".into()],
        });
        assert_eq!(action.to_string(), "press(ctrl+end)");
    }
}
