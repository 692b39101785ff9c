use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, future};
use serde::Deserialize;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::debug;
use utoipa::ToSchema;

use crate::events::EventStream;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventFeedParams {
    /// Comma-separated stream names. Omit for all streams.
    pub streams: Option<String>,
}

fn parse_streams(raw: Option<&str>) -> Result<Option<Vec<EventStream>>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut wanted = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let stream = name.parse::<EventStream>().map_err(|_| {
            AppError::bad_request(anyhow::anyhow!(
                "Unknown stream '{}' (valid: study_halls, discussions)",
                name
            ))
        })?;
        if !wanted.contains(&stream) {
            wanted.push(stream);
        }
    }

    Ok(if wanted.is_empty() { None } else { Some(wanted) })
}

/// Change feed for push-then-refetch clients. Each SSE event names the
/// stream and carries the school and entity of the change; the client
/// refetches whatever it shows for that entity. Subscribers that lag
/// simply miss events.
#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("streams" = Option<String>, Query, description = "Comma-separated stream names (study_halls, discussions)")
    ),
    responses(
        (status = 200, description = "SSE change feed scoped to the caller's school", content_type = "text/event-stream"),
        (status = 400, description = "Unknown stream name"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Events",
    security(("bearer_auth" = []))
)]
pub async fn events_feed(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<EventFeedParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let wanted = parse_streams(params.streams.as_deref())?;
    let school_id = auth_user.school_id();

    let rx = state.events.subscribe();

    let events = BroadcastStream::new(rx).filter_map(move |result| {
        let out = match result {
            Ok(event) => {
                let school_ok = school_id.is_none_or(|s| event.school_id == s);
                let stream_ok = wanted
                    .as_ref()
                    .is_none_or(|wanted| wanted.contains(&event.stream));

                if school_ok && stream_ok {
                    Event::default()
                        .event(event.stream.as_str())
                        .json_data(&event)
                        .ok()
                        .map(Ok)
                } else {
                    None
                }
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                debug!(skipped, "Event feed subscriber lagged");
                None
            }
        };
        future::ready(out)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
