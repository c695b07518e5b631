//! Outbound frames
//!
//! A frame is one JSON object followed by a newline. The payload key depends
//! on which endpoint was called: `/api/chat` replies carry
//! `"message": {"role": "assistant", "content": ...}`, `/api/generate` replies
//! carry `"response": ...`.

use super::message::Role;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Only reason ever reported on a terminal frame
pub const DONE_REASON_STOP: &str = "stop";

/// Which inbound endpoint the client called, and so which frame shape it expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `POST /api/chat`
    Chat,
    /// `POST /api/generate`
    Generate,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Generate => "generate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameMessage {
    role: Role,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FrameBody {
    #[serde(rename = "message")]
    Message(FrameMessage),
    #[serde(rename = "response")]
    Response(String),
}

impl FrameBody {
    fn new(shape: Shape, content: String) -> Self {
        match shape {
            Shape::Chat => Self::Message(FrameMessage {
                role: Role::Assistant,
                content,
            }),
            Shape::Generate => Self::Response(content),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Message(m) => &m.content,
            Self::Response(r) => r,
        }
    }
}

/// Placeholder statistics attached to the last frame of a stream
///
/// Clients of the emulated server expect these fields on the final record;
/// the values are fixed and not measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timings {
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_count: u32,
    pub prompt_eval_duration: u64,
    pub eval_count: u32,
    pub eval_duration: u64,
}

impl Timings {
    pub const SYNTHETIC: Self = Self {
        total_duration: 4_768_114_600,
        load_duration: 2_497_832_600,
        prompt_eval_count: 84,
        prompt_eval_duration: 491_959_200,
        eval_count: 37,
        eval_duration: 1_746_310_500,
    };
}

/// One newline-delimited record of a reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    model: String,
    created_at: String,
    #[serde(flatten)]
    body: FrameBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    done_reason: Option<&'static str>,
    done: bool,
    #[serde(flatten)]
    timings: Option<Timings>,
}

impl Frame {
    /// Intermediate streamed frame carrying one content slice
    pub fn chunk(shape: Shape, model: &str, created_at: &str, content: String) -> Self {
        Self {
            model: model.to_string(),
            created_at: created_at.to_string(),
            body: FrameBody::new(shape, content),
            done_reason: None,
            done: false,
            timings: None,
        }
    }

    /// Complete reply in one terminal frame
    ///
    /// Used for non-streamed replies, media results, and every advisory
    /// (spam block, too long, upstream blocked, rate limited).
    pub fn terminal(shape: Shape, model: &str, created_at: &str, content: String) -> Self {
        Self {
            model: model.to_string(),
            created_at: created_at.to_string(),
            body: FrameBody::new(shape, content),
            done_reason: Some(DONE_REASON_STOP),
            done: true,
            timings: None,
        }
    }

    /// Empty closing frame of a stream, with synthetic timings
    pub fn stream_end(shape: Shape, model: &str, created_at: &str) -> Self {
        Self {
            timings: Some(Timings::SYNTHETIC),
            ..Self::terminal(shape, model, created_at, String::new())
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn content(&self) -> &str {
        self.body.content()
    }

    pub fn is_final(&self) -> bool {
        self.done
    }

    pub fn done_reason(&self) -> Option<&'static str> {
        self.done_reason
    }

    pub fn timings(&self) -> Option<&Timings> {
        self.timings.as_ref()
    }

    /// Serialize as one NDJSON line, newline included
    pub fn to_line(&self) -> String {
        // Every field is a plain string, bool, or integer, so encoding cannot fail
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Frame serialization failed");
            String::from("{}")
        });
        line.push('\n');
        line
    }
}

/// Format a timestamp as RFC 3339 UTC with seven fractional digits
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format!(
        "{}.{:07}Z",
        at.format("%Y-%m-%dT%H:%M:%S"),
        at.timestamp_subsec_nanos() / 100
    )
}

/// Current time in the frame timestamp format
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
