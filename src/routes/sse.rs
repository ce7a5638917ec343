use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures_util::StreamExt;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;

use crate::AppState;

/// Tells open dashboards that a new snapshot is available.
pub async fn handle_events(State(state): State<AppState>) -> Response {
    let updates = WatchStream::from_changes(state.store.subscribe()).map(|revision| {
        Ok::<_, Infallible>(
            Event::default()
                .event("summaries-updated")
                .data(revision.to_string()),
        )
    });

    Sse::new(updates)
        .keep_alive(KeepAlive::default().interval(Duration::from_secs(15)))
        .into_response()
}
