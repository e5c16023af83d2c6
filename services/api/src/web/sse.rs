//! services/api/src/web/sse.rs
//!
//! The server-sent-events channel for a cooking session. Each connection gets
//! its own broadcaster subscription; the stream ends when the session is
//! removed, and dropping the stream unsubscribes the listener.

use crate::{
    error::{ApiError, ErrorBody},
    web::{cook::parse_session_id, state::AppState},
};
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::{convert::Infallible, sync::Arc};
use tracing::debug;

/// Subscribe to a session's live events as `text/event-stream`.
///
/// The first two events are always `connected` and `state_sync`.
#[utoipa::path(
    get,
    path = "/cook/{session_id}/events",
    params(
        ("session_id" = String, Path, description = "The cooking session id.")
    ),
    responses(
        (status = 200, description = "Event stream", body = String, content_type = "text/event-stream"),
        (status = 404, description = "Session not found", body = ErrorBody)
    ),
    tag = "Cooking"
)]
pub async fn session_events_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session_id = parse_session_id(Some(&session_id))?;
    let mut subscription = app_state.cook.subscribe(session_id).await?;
    debug!(%session_id, listener_id = %subscription.listener_id(), "SSE listener attached.");

    let stream = async_stream::stream! {
        while let Some(event) = subscription.recv().await {
            let frame = Event::default()
                .event(event.name())
                .data(event.payload().to_string());
            yield Ok::<_, Infallible>(frame);
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(app_state.config.cook.keepalive)
            .text("keepalive"),
    ))
}
