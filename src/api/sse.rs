//! Server-Sent Events for real-time session updates

use super::AppState;
use crate::session::SessionEvent;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Heartbeat payload
#[derive(Debug, Clone, serde::Serialize)]
struct Heartbeat {
    timestamp: String,
}

fn to_sse(event: &SessionEvent) -> Event {
    Event::default()
        .event(event.event_type())
        .data(serde_json::to_string(event).unwrap_or_default())
}

/// SSE events handler
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let event_rx = state.event_tx.subscribe();

    let session_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(to_sse(&event))),
        Err(e) => {
            tracing::debug!("SSE subscriber lagged: {}", e);
            None
        }
    });

    let heartbeat_stream =
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
            .map(|_| {
                let heartbeat = Heartbeat {
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                Ok(Event::default()
                    .event("heartbeat")
                    .data(serde_json::to_string(&heartbeat).unwrap_or_default()))
            });

    let merged_stream = futures::stream::select(session_stream, heartbeat_stream);

    Sse::new(merged_stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
