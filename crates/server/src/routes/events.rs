use std::{convert::Infallible, time::Duration};

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::{debug, warn};

use crate::AppState;

/// GET /api/events
/// Every store change as a server-sent event named after its table.
pub async fn stream_changes(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("change stream opened");
    let changes = BroadcastStream::new(state.db().changes.subscribe_all());
    let events = changes.filter_map(|change| match change {
        Ok(change) => match Event::default()
            .event(change.table().to_string())
            .json_data(&change)
        {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!(error = %e, "could not serialize change event");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            warn!(missed, "change stream client lagged, events dropped");
            None
        }
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(stream_changes))
}
