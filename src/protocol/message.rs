//! Canonical message model shared by both inbound endpoints

use serde::{Deserialize, Deserializer, Serialize};

/// Default sampling temperature forwarded to the chat upstream
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message
///
/// System messages are pinned: truncation never removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    #[serde(default)]
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_pinned(&self) -> bool {
        self.role == Role::System
    }

    /// Content length in characters (Unicode-aware)
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}

/// Total character count of a message sequence
pub fn total_length(messages: &[Message]) -> usize {
    messages.iter().map(Message::content_length).sum()
}

/// Recognized generation options
///
/// The inbound `options` object is open-ended; only `temperature` is
/// forwarded. A missing or non-numeric temperature falls back to
/// [`DEFAULT_TEMPERATURE`]. Other keys are accepted and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    temperature: f64,
}

impl GenerationOptions {
    pub fn with_temperature(temperature: f64) -> Self {
        Self { temperature }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl<'de> Deserialize<'de> for GenerationOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        let Some(serde_json::Value::Object(map)) = raw else {
            return Ok(Self::default());
        };

        let mut options = Self::default();
        for (key, value) in &map {
            match key.as_str() {
                "temperature" => match value.as_f64() {
                    Some(t) if t.is_finite() => options.temperature = t,
                    _ => {
                        tracing::debug!(value = %value, "Non-numeric temperature, using default")
                    }
                },
                other => tracing::trace!(option = other, "Ignoring unrecognized option"),
            }
        }
        Ok(options)
    }
}

/// One inbound call after normalization
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRequest {
    model: String,
    messages: Vec<Message>,
    stream: Option<bool>,
    options: GenerationOptions,
}

impl ConversationRequest {
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        stream: Option<bool>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            stream,
            options,
        }
    }

    /// Model name exactly as the client sent it
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Explicit `stream` flag, `None` when the client left it out
    pub fn stream(&self) -> Option<bool> {
        self.stream
    }

    pub fn options(&self) -> GenerationOptions {
        self.options
    }

    /// Content of the most recent message, empty when there is none
    pub fn last_content(&self) -> &str {
        self.messages.last().map(Message::content).unwrap_or("")
    }

    pub fn total_length(&self) -> usize {
        total_length(&self.messages)
    }

    pub(crate) fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }
}
