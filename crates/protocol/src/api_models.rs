//! Request and response bodies of the HTTP API.
//!
//! The shapes mirror what the browser control panel polls for, so field names
//! are camelCase on the wire.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::event_models::{Event, LogLine};
use crate::step_models::Step;

/// Media URLs of the files produced by the pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct Outputs {
    /// `/media/audio/<file>` URLs, sorted by file name.
    pub audio: Vec<String>,
    /// `/media/video/<file>` URLs, sorted by file name.
    pub video: Vec<String>,
}

/// Full state snapshot returned by `GET /api/state`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Whether a pipeline run or single-step run is in progress.
    pub running: bool,

    /// Whether the active child process is suspended.
    pub paused: bool,

    /// All steps in ascending id order.
    pub steps: Vec<Step>,

    /// Files currently present in the output directory.
    pub outputs: Outputs,

    /// Identifier of the current or most recent run.
    #[ts(type = "string | null")]
    pub run_id: Option<Uuid>,
}

/// Initial payload of the push channel (`event: state`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StatePush {
    pub steps: Vec<Step>,
    pub running: bool,
}

/// Response of `GET /api/logs`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LogsPage {
    pub lines: Vec<LogLine>,
    /// Server time in milliseconds; the next cursor.
    #[ts(type = "number")]
    pub now: i64,
}

/// Response of `GET /api/events`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct EventsPage {
    pub events: Vec<Event>,
    /// Server time in milliseconds; the next cursor.
    #[ts(type = "number")]
    pub now: i64,
}

/// Query string of the incremental endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, TS)]
pub struct SinceQuery {
    #[serde(default)]
    #[ts(type = "number")]
    pub since: i64,
}

/// Acknowledgement of a control-plane request.
///
/// `ok: false` is a negative acknowledgement (nothing to act on), not an error.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub ok: bool,

    /// Set when a run was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub run_id: Option<Uuid>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            ok: true,
            run_id: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            ok: false,
            run_id: None,
        }
    }

    pub fn accepted(run_id: Uuid) -> Self {
        Self {
            ok: true,
            run_id: Some(run_id),
        }
    }
}

/// JSON error body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ErrorBody {
    pub error: String,
}
