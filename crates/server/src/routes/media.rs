//! Serving of generated output files.

use super::AppState;
use crate::error::ApiResult;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use rp_core::media::{content_type, resolve_media};
use tokio_util::io::ReaderStream;

/// Stream `<output_dir>/<path>` to the client.
pub async fn serve_media(State(state): State<AppState>, Path(path): Path<String>) -> ApiResult<Response> {
    let file_path = resolve_media(state.manager.output_dir(), &path).await?;
    let file = tokio::fs::File::open(&file_path).await?;
    let length = file.metadata().await?.len();

    let headers = [
        (header::CONTENT_TYPE, content_type(&file_path).to_string()),
        (header::CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}
