//! Turns a model's raw reply into an `ActionBatch`.
//!
//! Stages, in order:
//! 1. strip a markdown code fence wrapped around the whole reply
//! 2. decode the cleaned text as JSON
//! 3. if it starts with `{`, wrap it in `[...]` and decode again
//! 4. find the outermost bracketed spans in the text; exactly one of them
//!    may hold objects, and that one must decode
//!
//! Every stage tolerates stray trailing commas. If nothing decodes the
//! result is `MalformedResponse`. Each decoded object is then validated, and
//! the first invalid action fails the whole batch.

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::types::{Action, ActionBatch};

const FENCE: &str = "```";

pub fn parse(raw: &str) -> Result<ActionBatch, ParseError> {
    let items = extract_items(raw).ok_or_else(|| ParseError::MalformedResponse {
        raw: raw.to_string(),
    })?;

    let actions = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Action::from_value(item).map_err(|reason| ParseError::InvalidAction { index, reason })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("parsed {} action(s)", actions.len());
    Ok(ActionBatch::new(actions))
}

fn extract_items(raw: &str) -> Option<Vec<Value>> {
    let cleaned = strip_code_fences(raw);

    if let Some(items) = decode(cleaned) {
        return Some(items);
    }

    if cleaned.starts_with('{') {
        if let Some(items) = decode(&format!("[{cleaned}]")) {
            debug!("decoded after wrapping bare object(s) in an array");
            return Some(items);
        }
    }

    let items = payload_in_prose(cleaned);
    if items.is_some() {
        debug!("decoded from bracketed substring of noisy reply");
    }
    items
}

/// Remove an opening fence (with its language tag) at the very start and a
/// closing fence at the very end. Fences anywhere else are left alone, so
/// string values that contain them survive untouched.
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

/// Stage 4. Bracketed spans without an object (`[think]`, `[1]`) are prose.
/// Of the rest there must be exactly one, and it must decode: a broken span
/// is never mined for the objects nested inside it.
fn payload_in_prose(text: &str) -> Option<Vec<Value>> {
    let mut candidates = top_level_spans(text)
        .into_iter()
        .filter(|span| span.contains('{'));

    let payload = candidates.next()?;
    if candidates.next().is_some() {
        debug!("reply holds more than one JSON payload");
        return None;
    }
    decode(payload)
}

/// Decode `text` to a list of action candidates. An array yields its items,
/// an object yields itself, anything else is not a batch.
fn decode(text: &str) -> Option<Vec<Value>> {
    let text = text.trim().trim_matches(',').trim();
    if text.is_empty() {
        return None;
    }

    let value = serde_json::from_str::<Value>(text)
        .or_else(|_| serde_json::from_str::<Value>(&strip_trailing_commas(text)))
        .ok()?;

    match value {
        Value::Array(items) => Some(items),
        Value::Object(_) => Some(vec![value]),
        _ => None,
    }
}

/// Drop commas that directly precede `]` or `}` outside of string literals.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_comma: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if let Some(at) = pending_comma {
            if c.is_whitespace() {
                out.push(c);
                continue;
            }
            if c != ']' && c != '}' {
                out.insert(at, ',');
            }
            pending_comma = None;
        }

        match c {
            ',' => pending_comma = Some(out.len()),
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Outermost balanced `[...]` / `{...}` spans, in order, found in one pass.
/// Brackets inside string literals are ignored. A closer that does not match
/// its opener ends the scan, since nothing after it can be trusted.
fn top_level_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (pos, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if !stack.is_empty() => in_string = true,
            '[' | '{' => {
                if stack.is_empty() {
                    start = pos;
                }
                stack.push(if c == '[' { ']' } else { '}' });
            }
            ']' | '}' if !stack.is_empty() => {
                if stack.pop() != Some(c) {
                    break;
                }
                if stack.is_empty() {
                    spans.push(&text[start..pos + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionKind, ClickTarget, Operation};

    const DONE: &str = r#"[{"thought": "finished", "operation": "done", "summary": "ok"}]"#;

    #[test]
    fn plain_array() {
        let batch = parse(DONE).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.as_slice()[0].kind(), ActionKind::Done);
    }

    #[test]
    fn empty_array_is_an_empty_batch() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn fenced_with_and_without_language_tag() {
        let plain = parse(DONE).unwrap();
        assert_eq!(parse(&format!("```json\n{DONE}\n```")).unwrap(), plain);
        assert_eq!(parse(&format!("```\n{DONE}\n```")).unwrap(), plain);
        assert_eq!(parse(&format!("```JSON {DONE}```")).unwrap(), plain);
    }

    #[test]
    fn bare_object_becomes_one_element_batch() {
        let batch = parse(r#"{"operation":"press","keys":["pagedown"]}"#).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.as_slice()[0].operation,
            Operation::Press {
                keys: vec!["pagedown".into()]
            }
        );
    }

    #[test]
    fn comma_separated_objects_without_array() {
        let batch = parse(
            r#"{"operation":"write","content":"hi"}, {"operation":"press","keys":["enter"]}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn preamble_and_trailing_prose() {
        let batch =
            parse(r#"some preamble text [{"operation":"done","summary":"ok"}] trailing"#).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.contains_done());
    }

    #[test]
    fn skips_bracketed_prose_before_the_payload() {
        let raw = r#"I [think] this works: [{"operation":"click","label":"~12"}]"#;
        let batch = parse(raw).unwrap();
        assert_eq!(
            batch.as_slice()[0].operation,
            Operation::Click(ClickTarget::Label("~12".into()))
        );
    }

    #[test]
    fn brackets_inside_strings_do_not_confuse_matching() {
        let raw = r#"Here: [{"operation":"write","content":"a ] tricky [ \"string\" }"}] done"#;
        let batch = parse(raw).unwrap();
        assert_eq!(
            batch.as_slice()[0].operation,
            Operation::Write {
                content: r#"a ] tricky [ "string" }"#.into()
            }
        );
    }

    #[test]
    fn trailing_comma_inside_array() {
        let raw = "[\n  {\"operation\": \"write\", \"content\": \"Hello, World\"},\n]";
        let batch = parse(raw).unwrap();
        assert_eq!(
            batch.as_slice()[0].operation,
            Operation::Write {
                content: "Hello, World".into()
            }
        );
    }

    #[test]
    fn leading_and_trailing_commas_around_payload() {
        let batch = parse(&format!(",{DONE},")).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn no_json_is_malformed_and_keeps_raw_text() {
        let raw = "I'm sorry, I can't see the screen.";
        match parse(raw) {
            Err(ParseError::MalformedResponse { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn scalar_json_is_malformed() {
        assert!(matches!(parse("42"), Err(ParseError::MalformedResponse { .. })));
        assert!(matches!(parse("\"done\""), Err(ParseError::MalformedResponse { .. })));
    }

    #[test]
    fn first_invalid_action_fails_the_batch() {
        let raw = r#"[
            {"operation": "write", "content": "ok"},
            {"operation": "click", "x": 1.5, "y": 0.5},
            {"operation": "done", "summary": "never"}
        ]"#;
        match parse(raw) {
            Err(ParseError::InvalidAction { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("outside [0, 1]"), "{reason}");
            }
            other => panic!("expected InvalidAction, got {other:?}"),
        }
    }

    #[test]
    fn non_object_item_is_invalid() {
        assert!(matches!(
            parse(r#"["click"]"#),
            Err(ParseError::InvalidAction { index: 0, .. })
        ));
    }

    #[test]
    fn scroll_operations_parse_as_press() {
        for key in ["pagedown", "pageup", "end", "home"] {
            let raw = format!(r#"[{{"thought": "scrolling", "operation": "press", "keys": ["{key}"]}}]"#);
            let batch = parse(&raw).unwrap();
            assert_eq!(
                batch.as_slice()[0].operation,
                Operation::Press {
                    keys: vec![key.to_string()]
                }
            );
        }
    }

    #[test]
    fn missing_comma_between_items_is_malformed() {
        let raw = r#"[{"operation":"write","content":"rm -rf ~/tmp"} {"operation":"press","keys":["enter"]}]"#;
        assert!(matches!(parse(raw), Err(ParseError::MalformedResponse { .. })));

        let noisy = format!("Plan:\n{raw}\nGood luck");
        assert!(matches!(parse(&noisy), Err(ParseError::MalformedResponse { .. })));
    }

    #[test]
    fn inner_object_of_broken_array_is_not_used() {
        let raw = r#"Doing this: [{"operation":"write","content":"a"}, {"operation":"done","summary":"x"]"#;
        assert!(matches!(parse(raw), Err(ParseError::MalformedResponse { .. })));
    }

    #[test]
    fn two_payloads_in_prose_are_ambiguous() {
        let raw = r#"First [{"operation":"done","summary":"a"}] or maybe [{"operation":"done","summary":"b"}]"#;
        assert!(matches!(parse(raw), Err(ParseError::MalformedResponse { .. })));
    }

    #[test]
    fn fence_inside_content_is_kept() {
        let content = "```python\nprint(1)\n```";
        let raw = format!(
            r#"[{{"operation":"write","content":{}}}]"#,
            serde_json::to_string(content).unwrap()
        );
        let expected = Operation::Write {
            content: content.into(),
        };
        assert_eq!(parse(&raw).unwrap().as_slice()[0].operation, expected);
        assert_eq!(
            parse(&format!("```json\n{raw}\n```")).unwrap().as_slice()[0].operation,
            expected
        );
    }

    #[test]
    fn fenced_payload_after_prose() {
        let raw = format!("Here is my plan:\n```json\n{DONE}\n```\nThanks!");
        assert!(parse(&raw).unwrap().contains_done());
    }

    #[test]
    fn deeply_unbalanced_input_is_malformed() {
        let raw = "[".repeat(60_000);
        assert!(matches!(parse(&raw), Err(ParseError::MalformedResponse { .. })));
        let raw = "{\"a\": ".repeat(20_000);
        assert!(matches!(parse(&raw), Err(ParseError::MalformedResponse { .. })));
    }

    #[test]
    fn top_level_spans_skip_nested_brackets() {
        let text = r#"x [1, [2]] y {"a": {"b": "]"}} z ]"#;
        assert_eq!(top_level_spans(text), vec!["[1, [2]]", r#"{"a": {"b": "]"}}"#]);
        assert_eq!(top_level_spans("[a} [b]"), Vec::<&str>::new());
    }

    #[test]
    fn strip_trailing_commas_leaves_separators_and_strings() {
        assert_eq!(strip_trailing_commas(r#"[1, 2,]"#), "[1, 2]");
        assert_eq!(strip_trailing_commas(r#"{"a": ",]"}"#), r#"{"a": ",]"}"#);
        assert_eq!(strip_trailing_commas("[1 ,\n 2]"), "[1 ,\n 2]");
        assert_eq!(strip_trailing_commas("{\"a\": [1,\n],\n}"), "{\"a\": [1\n]\n}");
    }
}
