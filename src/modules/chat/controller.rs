use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::ChatRequestDto;
use super::service::ChatService;

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequestDto,
    responses(
        (status = 200, description = "SSE stream of completion deltas, ending with [DONE]", content_type = "text/event-stream"),
        (status = 400, description = "Invalid message list"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Upstream error"),
        (status = 503, description = "Chat not configured")
    ),
    tag = "Chat",
    security(("bearer_auth" = []))
)]
pub async fn chat(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChatRequestDto>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let deltas = ChatService::stream_completion(&state.http, &state.chat_config, dto).await?;

    let events = deltas.map(|payload| Ok(Event::default().data(payload)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
