//! Pooled HTTP client for the upstream service

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::router::{Route, RouteDecision};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};

/// How long an idle pooled connection is kept
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Raw upstream answer, before classification and decoding
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub elapsed: Duration,
}

impl RawReply {
    /// Body as text for marker checks (invalid UTF-8 replaced)
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Shared upstream client
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build the client from configuration
    ///
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_seconds());
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            timeout,
        })
    }

    /// POST the decision's payload to its endpoint and read the full body
    ///
    /// Any status is returned as-is; only transport failures and timeouts are
    /// errors. Never retries.
    pub async fn send(&self, decision: &RouteDecision) -> AppResult<RawReply> {
        let started = Instant::now();
        let endpoint = decision.endpoint();

        tracing::debug!(
            endpoint = %endpoint,
            payload = %String::from_utf8_lossy(decision.payload()),
            "Sending upstream request"
        );

        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(decision.payload().to_vec())
            .send()
            .await
            .map_err(|e| self.unavailable(endpoint, &e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.unavailable(endpoint, &e))?
            .to_vec();
        let elapsed = started.elapsed();

        tracing::debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            body = %String::from_utf8_lossy(&body),
            "Upstream replied"
        );

        Ok(RawReply {
            status,
            body,
            elapsed,
        })
    }

    /// Open a pooled connection ahead of the first real request
    ///
    /// Failures are expected (e.g. offline at startup) and only logged.
    pub async fn prewarm(&self) {
        let url = format!("{}{}", self.base_url, Route::LegacyChat.path());
        tracing::debug!(url = %url, "Pre-warming upstream connection");

        match self
            .http
            .post(&url)
            .json(&serde_json::json!({ "messages": ["hello world"] }))
            .send()
            .await
        {
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Upstream connection ready")
            }
            Err(e) => tracing::debug!(error = %e, "Pre-warm failed, continuing"),
        }
    }

    fn unavailable(&self, endpoint: &str, error: &reqwest::Error) -> AppError {
        let reason = if error.is_timeout() {
            format!("timed out after {} seconds", self.timeout.as_secs())
        } else {
            error.to_string()
        };
        tracing::error!(endpoint = %endpoint, reason = %reason, "Upstream request failed");
        AppError::UpstreamUnavailable {
            endpoint: endpoint.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::protocol::message::{ConversationRequest, GenerationOptions, Message};
    use crate::router::{ModelRouter, Plan};
    use crate::session::TrimOverride;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn decision(base_url: &str, model: &str) -> RouteDecision {
        let request = ConversationRequest::new(
            model,
            vec![Message::user("hi")],
            None,
            GenerationOptions::default(),
        );
        match ModelRouter::new(base_url, LimitsConfig::default())
            .plan(request, TrimOverride::Unset)
            .unwrap()
        {
            Plan::Forward(d) => d,
            Plan::Reject(a) => panic!("unexpected rejection: {:?}", a),
        }
    }

    #[tokio::test]
    async fn test_send_posts_payload_and_returns_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/chat/completions"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4.1",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(&UpstreamConfig::new(server.uri(), 5)).unwrap();
        let reply = client.send(&decision(&server.uri(), "gpt-4.1")).await.unwrap();

        assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(reply.text(), "slow down");
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"reply":"late"}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = UpstreamClient::new(&UpstreamConfig::new(server.uri(), 1)).unwrap();
        let err = client
            .send(&decision(&server.uri(), "gpt-3.5"))
            .await
            .unwrap_err();

        match err {
            AppError::UpstreamUnavailable { reason, .. } => {
                assert!(reason.contains("timed out"), "reason: {}", reason)
            }
            other => panic!("expected UpstreamUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prewarm_hits_legacy_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"reply":"hi"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(&UpstreamConfig::new(server.uri(), 5)).unwrap();
        client.prewarm().await;
    }
}
