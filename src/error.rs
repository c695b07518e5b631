//! Error types for ollama-relay
//!
//! Two families live here:
//!
//! - [`AppError`]: failures that surface as HTTP error statuses. They implement
//!   `IntoResponse` for Axum handlers and render `{"error": "..."}`.
//! - [`Advisory`]: recoverable outcomes (guard rejections, upstream blocking,
//!   rate limiting). These are never HTTP errors; the emitter renders them as
//!   a single terminal frame with status 200 and the `Display` text as content.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("invalid json: {0}")]
    MalformedRequest(String),

    #[error("error forwarding request to {endpoint}: {reason}")]
    UpstreamUnavailable { endpoint: String, reason: String },

    #[error("unexpected reply from {endpoint}: {reason}")]
    UpstreamSchemaViolation { endpoint: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => "config",
            Self::MalformedRequest(_) => "malformed_request",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamSchemaViolation { .. } => "upstream_schema_violation",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MalformedRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Upstream details (hosts, decoder output) stay in the logs
            Self::UpstreamUnavailable { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error forwarding request".to_string(),
            ),
            Self::UpstreamSchemaViolation { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error parsing upstream response".to_string(),
            ),
            Self::Config(msg) | Self::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

/// What a length guard measured when it rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthSubject {
    /// Sum of every message in a chat conversation
    Conversation,
    /// Last message, used as an image prompt
    ImagePrompt,
    /// Last message, used as speech input
    SpeechText,
}

/// Recoverable outcome rendered as a normal `done: true` frame
///
/// The `Display` output is the exact text placed in the frame's content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    #[error(
        "Request blocked due to unnecessary api spam (trying to predict next messages/chatname)"
    )]
    BlockedBySpamGuard,

    #[error("{}", too_long_text(*limit, *subject))]
    TooLong {
        limit: usize,
        subject: LengthSubject,
    },

    #[error("Response was blocked please try again in a minute...")]
    UpstreamBlocked,

    #[error("Too many requests please wait a min...")]
    RateLimited,
}

fn too_long_text(limit: usize, subject: LengthSubject) -> String {
    match subject {
        LengthSubject::Conversation => format!(
            "prompt too long please keep it under {} characters (or start the relay with trimming enabled)",
            limit
        ),
        LengthSubject::ImagePrompt => format!(
            "please keep the text under {} characters (image generation works best with a single short prompt)",
            limit
        ),
        LengthSubject::SpeechText => format!(
            "please keep the text under {} characters (speech generation takes a single short text)",
            limit
        ),
    }
}

impl Advisory {
    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlockedBySpamGuard => "spam_guard",
            Self::TooLong { .. } => "too_long",
            Self::UpstreamBlocked => "upstream_blocked",
            Self::RateLimited => "rate_limited",
        }
    }
}
