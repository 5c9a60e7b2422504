//! Model reply in, recorded input events out.

use screen_operator::{
    Action, ActionBatch, ClickTarget, ExecutionError, Executor, InputEvent, Key, LabelMap,
    Operation, ParseError, Point, RecordingDevice, StepStatus, parse,
};

fn replay(raw: &str) -> (screen_operator::StepReport, Vec<InputEvent>) {
    let batch = parse(raw).expect("reply should parse");
    let mut device = RecordingDevice::new(1920, 1080);
    let report = Executor::new(&mut device).execute_batch(&batch);
    (report, device.take_events())
}

#[test]
fn serialized_batch_parses_back_unchanged() {
    let batch = ActionBatch::new(vec![
        Action::new(Operation::Click(ClickTarget::Position { x: 0.5, y: 0.25 }))
            .with_thought("open the menu"),
        Action::new(Operation::Write {
            content: "hello, \"world\"\n".into(),
        }),
        Action::new(Operation::Press {
            keys: vec!["ctrl".into(), "end".into()],
        }),
        Action::new(Operation::Click(ClickTarget::Label("~12".into()))),
        Action::new(Operation::Done {
            summary: "finished".into(),
        })
        .with_thought("all set"),
    ]);

    let json = serde_json::to_string(&batch).unwrap();
    assert_eq!(parse(&json).unwrap(), batch);
}

#[test]
fn write_with_code_fence_survives_round_trip() {
    let batch = ActionBatch::new(vec![Action::new(Operation::Write {
        content: "```python\nprint(1)\n```".into(),
    })]);
    let json = serde_json::to_string(&batch).unwrap();
    assert_eq!(parse(&json).unwrap(), batch);
    assert_eq!(parse(&format!("```json\n{json}\n```")).unwrap(), batch);
}

#[test]
fn missing_comma_runs_nothing() {
    let raw = r#"[{"operation":"write","content":"rm -rf ~/tmp"} {"operation":"press","keys":["enter"]}]"#;
    assert!(matches!(
        parse(raw),
        Err(ParseError::MalformedResponse { .. })
    ));
}

#[test]
fn fenced_reply_matches_plain_reply() {
    let plain = r#"[{"thought": "scroll", "operation": "press", "keys": ["pagedown"]}]"#;
    let fenced = format!("```json\n{plain}\n```");
    assert_eq!(parse(&fenced).unwrap(), parse(plain).unwrap());
}

#[test]
fn bare_object_becomes_one_action() {
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
fn array_is_found_inside_prose() {
    let batch =
        parse(r#"some preamble text [{"operation":"done","summary":"ok"}] trailing"#).unwrap();
    assert!(batch.contains_done());
    assert_eq!(batch.len(), 1);
}

#[test]
fn bare_object_and_chatter_are_tolerated() {
    let raw = "Sure! Here is what I'll do:\n{\"operation\": \"write\", \"content\": \"cats\"}\nLet me know.";
    let (report, events) = replay(raw);
    assert_eq!(report.status, StepStatus::Exhausted);
    assert_eq!(events, vec![InputEvent::Text("cats".into())]);
}

#[test]
fn out_of_range_click_rejects_the_whole_reply() {
    let raw = r#"[
        {"operation": "write", "content": "never typed"},
        {"operation": "click", "x": "1.5", "y": "0.5"}
    ]"#;
    match parse(raw) {
        Err(ParseError::InvalidAction { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected InvalidAction, got {other:?}"),
    }
}

#[test]
fn ctrl_end_chord_scrolls_to_bottom() {
    let (report, events) =
        replay(r#"[{"thought": "jump to the end", "operation": "press", "keys": ["ctrl", "end"]}]"#);
    assert_eq!(report.executed, 1);
    assert_eq!(
        events,
        vec![
            InputEvent::KeyDown(Key::Control),
            InputEvent::KeyDown(Key::End),
            InputEvent::KeyUp(Key::End),
            InputEvent::KeyUp(Key::Control),
        ]
    );
}

#[test]
fn typical_search_step() {
    let raw = r#"```json
[
    {"thought": "Focus the search bar", "operation": "click", "x": "0.50", "y": "0.85"},
    {"thought": "Type the query", "operation": "write", "content": "rust enigo"},
    {"thought": "Submit", "operation": "press", "keys": ["enter"]},
]
```"#;
    let (report, events) = replay(raw);
    assert_eq!(report.executed, 3);
    assert_eq!(report.status, StepStatus::Exhausted);
    assert_eq!(
        events,
        vec![
            InputEvent::MoveTo { x: 960, y: 918 },
            InputEvent::Click,
            InputEvent::Text("rust enigo".into()),
            InputEvent::KeyDown(Key::Enter),
            InputEvent::KeyUp(Key::Enter),
        ]
    );
}

#[test]
fn missing_label_stops_before_later_actions() {
    let batch = parse(
        r#"[
            {"operation": "click", "label": "~3"},
            {"operation": "click", "label": "~999"},
            {"operation": "write", "content": "should not appear"}
        ]"#,
    )
    .unwrap();
    let labels: LabelMap = [("~3", Point::new(100, 200))].into_iter().collect();

    let mut device = RecordingDevice::new(1280, 800);
    let report = Executor::new(&mut device)
        .with_elements(&labels)
        .execute_batch(&batch);

    assert_eq!(report.executed, 1);
    assert_eq!(
        report.status,
        StepStatus::Failed {
            index: 1,
            error: ExecutionError::TargetNotFound("~999".into()),
        }
    );
    assert_eq!(
        device.events(),
        &[InputEvent::MoveTo { x: 100, y: 200 }, InputEvent::Click]
    );
}

#[test]
fn nothing_runs_after_done() {
    let (report, events) = replay(
        r#"[
            {"operation": "press", "keys": "escape"},
            {"operation": "done", "summary": "closed the dialog"},
            {"operation": "write", "content": "late"}
        ]"#,
    );
    assert!(report.is_done());
    assert_eq!(report.executed, 2);
    assert_eq!(
        events,
        vec![InputEvent::KeyDown(Key::Escape), InputEvent::KeyUp(Key::Escape)]
    );
}

#[test]
fn nothing_to_click_ends_the_step_quietly() {
    let (report, events) = replay(
        r#"[
            {"operation": "click", "text": "Nothing to click"},
            {"operation": "write", "content": "skipped"}
        ]"#,
    );
    assert_eq!(report.status, StepStatus::NoTarget { index: 0 });
    assert!(events.is_empty());
}

#[test]
fn unknown_key_sends_no_events() {
    let (report, events) = replay(r#"[{"operation": "press", "keys": ["ctrl", "hyperdrive"]}]"#);
    assert_eq!(
        report.status,
        StepStatus::Failed {
            index: 0,
            error: ExecutionError::UnknownKey("hyperdrive".into()),
        }
    );
    assert!(events.is_empty());
}

#[test]
fn garbage_reply_is_malformed() {
    assert!(matches!(
        parse("I cannot help with that."),
        Err(ParseError::MalformedResponse { .. })
    ));
}
