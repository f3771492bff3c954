//! Assertion helpers over run state, events and logs.

use rp_protocol::{Event, EventKind, LogLine, Step, StepStatus};

/// Kind and step of every event, in order.
#[allow(dead_code)]
pub fn event_trace(events: &[Event]) -> Vec<(EventKind, Option<usize>)> {
    events.iter().map(|e| (e.kind, e.step_id)).collect()
}

/// Text of every log line, in order.
#[allow(dead_code)]
pub fn log_texts(lines: &[LogLine]) -> Vec<String> {
    lines.iter().map(|l| l.line.clone()).collect()
}

/// Assert the status of every step, in id order.
#[allow(dead_code)]
pub fn assert_statuses(steps: &[Step], expected: &[StepStatus]) {
    let actual: Vec<StepStatus> = steps.iter().map(|s| s.status).collect();
    assert_eq!(actual, expected, "unexpected step statuses");
}

/// Assert that timestamps never decrease.
#[allow(dead_code)]
pub fn assert_non_decreasing(stamps: impl IntoIterator<Item = i64>) {
    let stamps: Vec<i64> = stamps.into_iter().collect();
    assert!(
        stamps.windows(2).all(|w| w[0] <= w[1]),
        "timestamps went backwards: {stamps:?}"
    );
}
