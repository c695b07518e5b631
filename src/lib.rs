//! ollama-relay - local ollama-compatible endpoint for a hosted model service
//!
//! Accepts ollama `/api/chat` and `/api/generate` requests, routes each one
//! to the matching upstream endpoint by model name, and translates the reply
//! (or any rejection) back into ollama NDJSON frames.

pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod protocol;
pub mod router;
pub mod session;
pub mod telemetry;
pub mod upstream;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::AppState;
use tower_http::trace::TraceLayer;

/// Build the HTTP application with every route and middleware attached
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::handler))
        .route("/api/tags", get(handlers::tags::handler))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/generate", post(handlers::chat::generate))
        .route("/metrics", get(handlers::metrics::handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
        .layer(TraceLayer::new_for_http())
}
