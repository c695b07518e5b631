//! Liveness endpoint
//!
//! ollama clients probe `GET /` and expect this exact text.

pub const LIVENESS_TEXT: &str = "Ollama is running";

pub async fn handler() -> &'static str {
    LIVENESS_TEXT
}
