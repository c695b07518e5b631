//! Chat and generate endpoint handlers
//!
//! `POST /api/chat` and `POST /api/generate` differ only in how the body
//! normalizes and in the frame shape; both run the same relay pipeline:
//!
//! 1. Plan the route (spam guard, length guard, payload)
//! 2. Call the upstream once
//! 3. Classify blocking and rate limiting
//! 4. Decode the route's reply format
//! 5. Emit frames, streamed or single-shot

use crate::emitter::Emitter;
use crate::error::{Advisory, AppError, AppResult};
use crate::handlers::AppState;
use crate::handlers::extractor::RequestJson;
use crate::middleware::RequestId;
use crate::protocol::{ChatRequest, ConversationRequest, GenerateRequest, Shape};
use crate::router::Plan;
use crate::upstream::{UpstreamReply, classify};
use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    RequestJson(body): RequestJson<ChatRequest>,
) -> AppResult<Response> {
    relay(&state, request_id, Shape::Chat, body.into_conversation()).await
}

/// `POST /api/generate`
pub async fn generate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    RequestJson(body): RequestJson<GenerateRequest>,
) -> AppResult<Response> {
    relay(&state, request_id, Shape::Generate, body.into_conversation()).await
}

async fn relay(
    state: &AppState,
    request_id: RequestId,
    shape: Shape,
    request: ConversationRequest,
) -> AppResult<Response> {
    let toggles = state.toggles();
    let requested_stream = request.stream();
    // Frames echo the model string exactly as the client sent it
    let emitter = Emitter::new(shape, request.model(), state.config().streaming);

    tracing::info!(
        request_id = %request_id,
        shape = shape.as_str(),
        model = %request.model(),
        messages = request.messages().len(),
        total_chars = request.total_length(),
        "Relaying request"
    );

    let decision = match state.router().plan(request, toggles.trim)? {
        Plan::Forward(decision) => decision,
        Plan::Reject(advisory) => return Ok(advise(state, request_id, &emitter, &advisory)),
    };
    let route = decision.route();
    state.metrics().record_request(route);

    let raw = state.upstream().send(&decision).await.map_err(|e| {
        state.metrics().record_upstream_error(&e);
        e
    })?;

    let elapsed_ms = raw.elapsed.as_secs_f64() * 1000.0;
    if let Err(e) = state.metrics().record_upstream_duration(route, elapsed_ms) {
        tracing::warn!(request_id = %request_id, error = %e, "Failed to record upstream duration");
    }
    tracing::info!(
        request_id = %request_id,
        route = route.as_str(),
        status = raw.status.as_u16(),
        elapsed_ms,
        "Upstream replied"
    );

    if let Some(advisory) = classify(raw.status, &raw.text()) {
        return Ok(advise(state, request_id, &emitter, &advisory));
    }

    let reply = UpstreamReply::decode(route, &raw.body).map_err(|e| {
        let error = AppError::UpstreamSchemaViolation {
            endpoint: decision.endpoint().to_string(),
            reason: e.to_string(),
        };
        tracing::error!(
            request_id = %request_id,
            route = route.as_str(),
            status = raw.status.as_u16(),
            error = %error,
            "Upstream reply did not match the expected format"
        );
        state.metrics().record_upstream_error(&error);
        error
    })?;

    let stream = toggles.stream.decide(requested_stream);
    let emission = emitter.reply(reply, stream);
    state.metrics().record_frames(emission.frames().len());

    tracing::debug!(
        request_id = %request_id,
        streamed = emission.is_streamed(),
        frames = emission.frames().len(),
        "Emitting reply"
    );

    Ok(emission.into_response())
}

fn advise(
    state: &AppState,
    request_id: RequestId,
    emitter: &Emitter,
    advisory: &Advisory,
) -> Response {
    tracing::info!(
        request_id = %request_id,
        kind = advisory.kind(),
        "Answering with advisory"
    );
    state.metrics().record_advisory(advisory);
    let emission = emitter.advisory(advisory);
    state.metrics().record_frames(emission.frames().len());
    emission.into_response()
}
