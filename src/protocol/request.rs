//! Inbound request shapes and their normalization
//!
//! `POST /api/chat` carries a message list plus an optional out-of-band
//! `system` string. `POST /api/generate` carries a single prompt plus an
//! optional system string. Both collapse into one [`ConversationRequest`].

use super::message::{ConversationRequest, GenerationOptions, Message};
use serde::{Deserialize, Deserializer};

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    model: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default, deserialize_with = "string_or_ignore")]
    system: Option<String>,
    #[serde(default)]
    stream: Option<bool>,
    #[serde(default)]
    options: GenerationOptions,
}

impl ChatRequest {
    /// Normalize into the canonical conversation
    ///
    /// A non-empty side-channel `system` string becomes a new leading system
    /// message, ahead of any system messages already in the list.
    pub fn into_conversation(self) -> ConversationRequest {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = self.system.filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.extend(self.messages);

        ConversationRequest::new(self.model, messages, self.stream, self.options)
    }
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    model: String,
    #[serde(default)]
    prompt: String,
    #[serde(default, deserialize_with = "string_or_ignore")]
    system: Option<String>,
    #[serde(default)]
    stream: Option<bool>,
    #[serde(default)]
    options: GenerationOptions,
}

impl GenerateRequest {
    /// Normalize into the canonical conversation: optional system message,
    /// then one user message wrapping the prompt
    pub fn into_conversation(self) -> ConversationRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system.filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(self.prompt));

        ConversationRequest::new(self.model, messages, self.stream, self.options)
    }
}

/// Accept a string; treat any other JSON type as absent
fn string_or_ignore<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{DEFAULT_TEMPERATURE, Role};

    fn chat(json: &str) -> ConversationRequest {
        serde_json::from_str::<ChatRequest>(json)
            .expect("valid chat request")
            .into_conversation()
    }

    fn generate(json: &str) -> ConversationRequest {
        serde_json::from_str::<GenerateRequest>(json)
            .expect("valid generate request")
            .into_conversation()
    }

    #[test]
    fn test_chat_keeps_order() {
        let conv = chat(
            r#"{"model":"gpt-4.1","messages":[
                {"role":"user","content":"a"},
                {"role":"assistant","content":"b"},
                {"role":"user","content":"c"}]}"#,
        );
        let contents: Vec<_> = conv.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, ["a", "b", "c"]);
        assert_eq!(conv.model(), "gpt-4.1");
        assert_eq!(conv.stream(), None);
    }

    #[test]
    fn test_chat_side_channel_system_is_prepended() {
        let conv = chat(
            r#"{"model":"m","system":"outer","messages":[
                {"role":"system","content":"inner"},
                {"role":"user","content":"hi"}]}"#,
        );
        let roles: Vec<_> = conv.messages().iter().map(|m| m.role()).collect();
        assert_eq!(roles, [Role::System, Role::System, Role::User]);
        assert_eq!(conv.messages()[0].content(), "outer");
        assert_eq!(conv.messages()[1].content(), "inner");
    }

    #[test]
    fn test_chat_empty_or_non_string_system_ignored() {
        let conv = chat(r#"{"model":"m","system":"","messages":[{"role":"user","content":"hi"}]}"#);
        assert_eq!(conv.messages().len(), 1);

        let conv = chat(r#"{"model":"m","system":42,"messages":[{"role":"user","content":"hi"}]}"#);
        assert_eq!(conv.messages().len(), 1);
    }

    #[test]
    fn test_chat_stream_and_options() {
        let conv = chat(
            r#"{"model":"m","messages":[],"stream":false,"options":{"temperature":1.3}}"#,
        );
        assert_eq!(conv.stream(), Some(false));
        assert_eq!(conv.options().temperature(), 1.3);
    }

    #[test]
    fn test_generate_without_system() {
        let conv = generate(r#"{"model":"tts","prompt":"read this"}"#);
        assert_eq!(conv.messages(), &[Message::user("read this")]);
        assert_eq!(conv.options().temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_generate_with_system() {
        let conv = generate(r#"{"model":"m","prompt":"p","system":"be brief","stream":true}"#);
        assert_eq!(
            conv.messages(),
            &[Message::system("be brief"), Message::user("p")]
        );
        assert_eq!(conv.stream(), Some(true));
    }

    #[test]
    fn test_malformed_bodies_fail() {
        assert!(serde_json::from_str::<ChatRequest>("{not json").is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"{"messages": "nope"}"#).is_err());
        assert!(serde_json::from_str::<GenerateRequest>(r#"{"prompt": 5}"#).is_err());
    }
}
