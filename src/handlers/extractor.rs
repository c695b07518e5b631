//! JSON body extractor for ollama-style endpoints
//!
//! ollama clients frequently omit `Content-Type`, so the body is decoded
//! regardless of headers. Any failure becomes [`AppError::MalformedRequest`],
//! rendered as `400 {"error": "invalid json: ..."}`.

use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

pub struct RequestJson<T>(pub T);

impl<S, T> FromRequest<S> for RequestJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedRequest(rejection.body_text()))?;

        serde_json::from_slice(&bytes)
            .map(RequestJson)
            .map_err(|e| AppError::MalformedRequest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ChatRequest;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request(body: &'static str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/api/chat")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_body_without_content_type() {
        let RequestJson(parsed) = RequestJson::<ChatRequest>::from_request(
            request(r#"{"model":"gpt-4.1","messages":[{"role":"user","content":"hi"}]}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(parsed.into_conversation().model(), "gpt-4.1");
    }

    #[tokio::test]
    async fn test_syntax_error_is_malformed() {
        let err = RequestJson::<ChatRequest>::from_request(request("{not json"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::MalformedRequest(_)));
        assert!(err.to_string().starts_with("invalid json: "));
    }

    #[tokio::test]
    async fn test_wrong_types_are_malformed() {
        let err = RequestJson::<ChatRequest>::from_request(
            request(r#"{"model":"gpt-4.1","messages":"hello"}"#),
            &(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::MalformedRequest(_)));
    }
}
