//! Model-name routing
//!
//! Maps a requested model name to one of five upstream formats, runs the
//! route's guards, and builds the upstream payload. No network I/O happens
//! here; the result is handed to [`crate::upstream::UpstreamClient`].

pub mod guard;
pub mod payload;
pub mod truncate;

use crate::config::LimitsConfig;
use crate::error::{Advisory, AppError, AppResult, LengthSubject};
use crate::protocol::catalog::LATEST_TAG;
use crate::protocol::message::ConversationRequest;
use crate::session::TrimOverride;
use guard::LengthPolicy;

/// Upstream format selected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Role-tagged multi-message chat (`/v2/chat/completions`)
    Chat,
    /// Image generation returning URLs (`/v3/images/generations`)
    Image,
    /// Image generation returning base64 data (`/v4/images/generations`)
    Base64Image,
    /// Text to speech returning a URL (`/v5/audio/generations`)
    Speech,
    /// Flat list of contents, no roles (`/v1/chat/completions`); the fallback
    LegacyChat,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Chat,
        Route::Image,
        Route::Base64Image,
        Route::Speech,
        Route::LegacyChat,
    ];

    /// Select a route by exact base identifier; unknown names fall back to
    /// [`Route::LegacyChat`]
    pub fn for_model(base: &str) -> Self {
        match base {
            "gpt-4o" | "gpt-4o-mini" | "gpt-4.1-nano" | "gpt-4.1-mini" | "gpt-4.1" => Self::Chat,
            "dall-e-3" => Self::Image,
            "base64" => Self::Base64Image,
            "tts" => Self::Speech,
            _ => Self::LegacyChat,
        }
    }

    /// Upstream path, appended to the configured base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Chat => "/v2/chat/completions",
            Self::Image => "/v3/images/generations",
            Self::Base64Image => "/v4/images/generations",
            Self::Speech => "/v5/audio/generations",
            Self::LegacyChat => "/v1/chat/completions",
        }
    }

    /// Whether the reply is free text (and so may be streamed)
    pub fn is_chat_like(&self) -> bool {
        matches!(self, Self::Chat | Self::LegacyChat)
    }

    /// Whether the reply text lives in the legacy `reply` field
    pub fn uses_legacy_reply_field(&self) -> bool {
        matches!(self, Self::LegacyChat)
    }

    pub fn length_policy(&self, limits: &LimitsConfig) -> LengthPolicy {
        match self {
            Self::Chat => LengthPolicy::Aggregate {
                limit: limits.chat_max_chars,
            },
            Self::LegacyChat => LengthPolicy::Aggregate {
                limit: limits.legacy_chat_max_chars,
            },
            Self::Image | Self::Base64Image => LengthPolicy::LastMessage {
                limit: limits.image_max_chars,
                subject: LengthSubject::ImagePrompt,
            },
            Self::Speech => LengthPolicy::LastMessage {
                limit: limits.speech_max_chars,
                subject: LengthSubject::SpeechText,
            },
        }
    }

    /// Label used for metrics and structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Image => "image",
            Self::Base64Image => "base64_image",
            Self::Speech => "speech",
            Self::LegacyChat => "legacy_chat",
        }
    }
}

/// Strip a trailing `:latest` qualifier
pub fn base_identifier(model: &str) -> &str {
    model.strip_suffix(LATEST_TAG).unwrap_or(model)
}

/// Everything needed to make the upstream call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    route: Route,
    base_model: String,
    endpoint: String,
    payload: Vec<u8>,
}

impl RouteDecision {
    pub fn route(&self) -> Route {
        self.route
    }

    pub fn base_model(&self) -> &str {
        &self.base_model
    }

    /// Full upstream URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encoded JSON body
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn content_is_chat_like(&self) -> bool {
        self.route.is_chat_like()
    }

    pub fn uses_legacy_reply_field(&self) -> bool {
        self.route.uses_legacy_reply_field()
    }
}

/// Outcome of planning a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Forward to the upstream
    Forward(RouteDecision),
    /// Answer locally, without any upstream call
    Reject(Advisory),
}

/// Stateless router over a fixed route table
#[derive(Debug, Clone)]
pub struct ModelRouter {
    base_url: String,
    limits: LimitsConfig,
}

impl ModelRouter {
    pub fn new(base_url: impl Into<String>, limits: LimitsConfig) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limits,
        }
    }

    /// Route `request`, apply guards, and build the upstream payload
    ///
    /// Guard order: spam guard, then the route's length guard (which may trim
    /// the conversation when `trim` allows it).
    ///
    /// # Errors
    /// Returns an error only if payload encoding fails.
    pub fn plan(&self, mut request: ConversationRequest, trim: TrimOverride) -> AppResult<Plan> {
        let base = base_identifier(request.model()).to_string();
        let route = Route::for_model(&base);

        tracing::debug!(
            model = %request.model(),
            base_model = %base,
            route = route.as_str(),
            "Route selected"
        );

        if let Err(advisory) = guard::spam_guard(request.messages()) {
            tracing::info!(route = route.as_str(), "Background task request blocked");
            return Ok(Plan::Reject(advisory));
        }

        if let Err(advisory) =
            guard::length_guard(route.length_policy(&self.limits), &mut request, trim)
        {
            return Ok(Plan::Reject(advisory));
        }

        let payload = payload::encode(route, &base, &request).map_err(|e| {
            AppError::Internal(format!("failed to encode upstream payload: {}", e))
        })?;

        Ok(Plan::Forward(RouteDecision {
            route,
            endpoint: format!("{}{}", self.base_url, route.path()),
            base_model: base,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{GenerationOptions, Message};

    fn router() -> ModelRouter {
        ModelRouter::new("https://upstream.test/", LimitsConfig::default())
    }

    fn request(model: &str, messages: Vec<Message>) -> ConversationRequest {
        ConversationRequest::new(model, messages, None, GenerationOptions::default())
    }

    fn forward(plan: Plan) -> RouteDecision {
        match plan {
            Plan::Forward(decision) => decision,
            Plan::Reject(advisory) => panic!("expected forward, got {:?}", advisory),
        }
    }

    #[test]
    fn test_base_identifier_strips_latest_only() {
        assert_eq!(base_identifier("gpt-4o:latest"), "gpt-4o");
        assert_eq!(base_identifier("gpt-4o"), "gpt-4o");
        assert_eq!(base_identifier("llama3:8b"), "llama3:8b");
        assert_eq!(base_identifier("unknown-model:latest"), "unknown-model");
    }

    #[test]
    fn test_route_table() {
        for chat in ["gpt-4o", "gpt-4o-mini", "gpt-4.1-nano", "gpt-4.1-mini", "gpt-4.1"] {
            assert_eq!(Route::for_model(chat), Route::Chat);
        }
        assert_eq!(Route::for_model("dall-e-3"), Route::Image);
        assert_eq!(Route::for_model("base64"), Route::Base64Image);
        assert_eq!(Route::for_model("tts"), Route::Speech);
        assert_eq!(Route::for_model("gpt-3.5"), Route::LegacyChat);
        assert_eq!(Route::for_model("GPT-4O"), Route::LegacyChat);
        assert_eq!(Route::for_model(""), Route::LegacyChat);
    }

    #[test]
    fn test_route_flags() {
        assert!(Route::Chat.is_chat_like());
        assert!(Route::LegacyChat.is_chat_like());
        assert!(!Route::Image.is_chat_like());
        assert!(Route::LegacyChat.uses_legacy_reply_field());
        assert!(!Route::Chat.uses_legacy_reply_field());
    }

    #[test]
    fn test_chat_scenario_forwards() {
        let decision = forward(
            router()
                .plan(request("gpt-4.1", vec![Message::user("hi")]), TrimOverride::Unset)
                .unwrap(),
        );
        assert_eq!(decision.route(), Route::Chat);
        assert_eq!(decision.endpoint(), "https://upstream.test/v2/chat/completions");
        assert_eq!(decision.base_model(), "gpt-4.1");
        assert!(decision.content_is_chat_like());
    }

    #[test]
    fn test_unknown_model_falls_back_to_legacy() {
        let decision = forward(
            router()
                .plan(
                    request("unknown-model:latest", vec![Message::user("hi")]),
                    TrimOverride::Unset,
                )
                .unwrap(),
        );
        assert_eq!(decision.route(), Route::LegacyChat);
        assert_eq!(decision.base_model(), "unknown-model");
        assert_eq!(decision.endpoint(), "https://upstream.test/v1/chat/completions");
    }

    #[test]
    fn test_image_prompt_over_limit_rejected() {
        let plan = router()
            .plan(
                request("dall-e-3", vec![Message::user("x".repeat(1500))]),
                TrimOverride::Always,
            )
            .unwrap();
        assert_eq!(
            plan,
            Plan::Reject(Advisory::TooLong {
                limit: 1000,
                subject: LengthSubject::ImagePrompt
            })
        );
    }

    #[test]
    fn test_spam_guard_runs_before_length_guard() {
        let plan = router()
            .plan(
                request("tts", vec![Message::user(format!("### Task: {}", "x".repeat(900)))]),
                TrimOverride::Unset,
            )
            .unwrap();
        assert_eq!(plan, Plan::Reject(Advisory::BlockedBySpamGuard));
    }

    #[test]
    fn test_chat_and_legacy_budgets_differ() {
        let text = "x".repeat(3000);
        let chat = router()
            .plan(request("gpt-4o", vec![Message::user(&text)]), TrimOverride::Unset)
            .unwrap();
        assert!(matches!(chat, Plan::Forward(_)));

        let legacy = router()
            .plan(request("gpt-3.5", vec![Message::user(&text)]), TrimOverride::Unset)
            .unwrap();
        assert_eq!(
            legacy,
            Plan::Reject(Advisory::TooLong {
                limit: 2000,
                subject: LengthSubject::Conversation
            })
        );
    }

    #[test]
    fn test_trimmed_payload_excludes_old_messages() {
        let messages = vec![
            Message::system("rules"),
            Message::user("a".repeat(1990)),
            Message::user("latest"),
        ];
        let decision = forward(
            router()
                .plan(request("gpt-3.5", messages), TrimOverride::Always)
                .unwrap(),
        );
        let body: serde_json::Value = serde_json::from_slice(decision.payload()).unwrap();
        assert_eq!(body, serde_json::json!({"messages": ["rules", "latest"]}));
    }

    #[test]
    fn test_planning_is_deterministic() {
        let make = || request("gpt-4o-mini:latest", vec![Message::user("same")]);
        let a = router().plan(make(), TrimOverride::Unset).unwrap();
        let b = router().plan(make(), TrimOverride::Unset).unwrap();
        assert_eq!(a, b);
    }
}
