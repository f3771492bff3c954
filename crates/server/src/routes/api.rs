//! JSON API handlers.

use super::AppState;
use crate::error::{ApiError, ApiResult};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use rp_protocol::{Ack, EventsPage, LogsPage, SinceQuery, StateSnapshot};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;

pub async fn get_state(State(state): State<AppState>) -> Json<StateSnapshot> {
    Json(state.manager.snapshot().await)
}

/// Start a full pipeline run; the run continues in the background.
pub async fn run_pipeline(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    let handle = state.manager.start_pipeline().await?;
    info!(run_id = %handle.run_id, "pipeline run requested");
    Ok(Json(Ack::accepted(handle.run_id)))
}

/// Run one step in isolation.
pub async fn run_step(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Ack>> {
    let id: usize = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid step id '{id}'")))?;
    let handle = state.manager.start_step(id).await?;
    info!(run_id = %handle.run_id, step = id, "single step run requested");
    Ok(Json(Ack::accepted(handle.run_id)))
}

pub async fn pause(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    Ok(Json(control_ack(state.manager.pause().await?)))
}

pub async fn resume(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    Ok(Json(control_ack(state.manager.resume().await?)))
}

pub async fn abort(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    Ok(Json(control_ack(state.manager.abort().await?)))
}

fn control_ack(applied: bool) -> Ack {
    if applied {
        Ack::ok()
    } else {
        Ack::rejected()
    }
}

pub async fn get_logs(
    State(state): State<AppState>,
    query: Result<Query<SinceQuery>, QueryRejection>,
) -> ApiResult<Json<LogsPage>> {
    let Query(query) = query.map_err(bad_query)?;
    let (lines, now) = state.manager.logs_since(query.since).await;
    Ok(Json(LogsPage { lines, now }))
}

pub async fn get_events(
    State(state): State<AppState>,
    query: Result<Query<SinceQuery>, QueryRejection>,
) -> ApiResult<Json<EventsPage>> {
    let Query(query) = query.map_err(bad_query)?;
    let (events, now) = state.manager.events_since(query.since).await;
    Ok(Json(EventsPage { events, now }))
}

fn bad_query(rejection: QueryRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// Allow-listed credential keys with masked values.
pub async fn get_env(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(state.manager.credentials().masked().await)
}

/// Persist allow-listed credential values.
///
/// A request without a JSON content type counts as an empty object.
pub async fn update_env(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Ack>> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Object(Map::new()),
        Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
    };
    let empty = Map::new();
    let entries = body.as_object().unwrap_or(&empty);
    state.manager.credentials().update(entries).await?;
    Ok(Json(Ack::ok()))
}
