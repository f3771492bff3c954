//! Log line and lifecycle event models.
//!
//! Both kinds of records carry a wall-clock timestamp in milliseconds. The
//! timestamp doubles as the pagination cursor clients send back as `since`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One captured line of output from the active step process.
///
/// The text has already been stripped of ANSI escape sequences.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LogLine {
    /// Milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub ts: i64,

    /// Plain-text content of the line.
    pub line: String,
}

/// Category of a lifecycle event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A pipeline run has started.
    Start,
    /// A step has started.
    Step,
    /// A step finished successfully.
    Success,
    /// A step failed; the run stops.
    Error,
    /// The active child process was suspended.
    Pause,
    /// The active child process was continued.
    Resume,
    /// The active child process was asked to terminate.
    Abort,
    /// A run has concluded, whatever the outcome.
    Done,
    /// Anything else worth showing.
    #[default]
    Info,
}

/// A high-level lifecycle notification.
///
/// Serialized with camelCase keys, for example:
/// ```json
/// { "ts": 1718000000000, "kind": "success", "text": "Speech synthesis finished (12s)", "stepId": 1 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub ts: i64,

    /// Event category.
    pub kind: EventKind,

    /// Free-text message.
    pub text: String,

    /// Identifier of the step this event concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<usize>,
}
