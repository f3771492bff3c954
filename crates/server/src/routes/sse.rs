//! The push channel.
//!
//! On connect the client receives one `state` event carrying the step list
//! and the running flag; afterwards the stream only carries keep-alive
//! comments. Clients poll `/api/logs` and `/api/events` for progress.

use super::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::Stream;
use tracing::debug;

pub async fn state_stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let push = state.manager.state_push().await;
    let initial = match Event::default().event("state").json_data(&push) {
        Ok(event) => event,
        Err(e) => {
            debug!("failed to encode state push: {e}");
            Event::default().event("state").data("{}")
        }
    };

    let shutdown = state.shutdown.clone();
    let stream = async_stream::stream! {
        yield Ok(initial);
        // Heartbeats only from here on; end with the server
        shutdown.cancelled().await;
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.heartbeat).text("heartbeat"))
}
