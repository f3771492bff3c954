use rp_protocol::*;
use serde_json::json;

#[test]
fn test_step_status_serialization() {
    let json = serde_json::to_value(StepStatus::Success).expect("Failed to serialize StepStatus");
    assert_eq!(json, "success");

    let deserialized: StepStatus =
        serde_json::from_value(json!("error")).expect("Failed to deserialize StepStatus");
    assert_eq!(deserialized, StepStatus::Error);
}

#[test]
fn test_step_status_terminal() {
    assert!(!StepStatus::Idle.is_terminal());
    assert!(!StepStatus::Running.is_terminal());
    assert!(StepStatus::Success.is_terminal());
    assert!(StepStatus::Error.is_terminal());
}

#[test]
fn test_step_serialization() {
    let step = Step::new(2, "Video assembly");

    let json = serde_json::to_value(&step).expect("Failed to serialize Step");
    assert_eq!(json, json!({ "id": 2, "name": "Video assembly", "status": "idle" }));
}

#[test]
fn test_event_wire_shape() {
    let event = Event {
        ts: 42,
        kind: EventKind::Success,
        text: "Story generation finished (3s)".to_string(),
        step_id: Some(0),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["kind"], "success");
    assert_eq!(json["stepId"], 0);
    assert_eq!(json["ts"], 42);

    // Events without a step omit the key entirely
    let done = Event {
        ts: 43,
        kind: EventKind::Done,
        text: "Pipeline finished".to_string(),
        step_id: None,
    };
    let json = serde_json::to_value(&done).expect("Failed to serialize Event");
    assert!(json.get("stepId").is_none());
}

#[test]
fn test_event_deserialization_defaults() {
    let event: Event = serde_json::from_value(json!({ "ts": 1, "kind": "info", "text": "hello" }))
        .expect("Failed to deserialize Event");
    assert_eq!(event.step_id, None);
    assert_eq!(event.kind, EventKind::Info);
}

#[test]
fn test_state_snapshot_serialization() {
    let snapshot = StateSnapshot {
        running: true,
        paused: false,
        steps: vec![Step::new(0, "Story generation")],
        outputs: Outputs {
            audio: vec!["/media/audio/story.wav".to_string()],
            video: vec![],
        },
        run_id: None,
    };

    let json = serde_json::to_value(&snapshot).expect("Failed to serialize StateSnapshot");
    assert_eq!(json["running"], true);
    assert_eq!(json["paused"], false);
    assert_eq!(json["steps"][0]["status"], "idle");
    assert_eq!(json["outputs"]["audio"][0], "/media/audio/story.wav");
    assert!(json["runId"].is_null());
}

#[test]
fn test_ack_serialization() {
    let json = serde_json::to_value(Ack::rejected()).expect("Failed to serialize Ack");
    assert_eq!(json, json!({ "ok": false }));

    let run_id = uuid::Uuid::new_v4();
    let json = serde_json::to_value(Ack::accepted(run_id)).expect("Failed to serialize Ack");
    assert_eq!(json["ok"], true);
    assert_eq!(json["runId"], run_id.to_string());
}

#[test]
fn test_since_query_defaults_to_zero() {
    let query: SinceQuery = serde_json::from_value(json!({})).expect("Failed to deserialize SinceQuery");
    assert_eq!(query.since, 0);
}
