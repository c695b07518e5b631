//! Response emitter
//!
//! Turns one decoded upstream reply (or an advisory) into the frames the
//! client receives, then into an HTTP response. Streamed replies are sent as
//! chunked NDJSON with a short pause between frames; everything else is a
//! single terminal frame.
//!
//! # Frame sequences
//!
//! - Streamed text: one frame per `chunk_chars` slice of the scrubbed reply
//!   (`done: false`), then an empty terminal frame with synthetic timings.
//! - Single-shot text: one terminal frame with the unscrubbed reply.
//! - Media and advisories: one terminal frame.

pub mod scrub;

use crate::config::StreamingConfig;
use crate::error::Advisory;
use crate::protocol::frame::{self, Frame, Shape};
use crate::upstream::UpstreamReply;
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use std::time::Duration;

/// Content type of every frame response
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson; charset=utf-8";

/// Renders frames for one request
///
/// All frames of a response share the timestamp taken at construction.
#[derive(Debug, Clone)]
pub struct Emitter {
    shape: Shape,
    model: String,
    created_at: String,
    streaming: StreamingConfig,
}

impl Emitter {
    pub fn new(shape: Shape, model: impl Into<String>, streaming: StreamingConfig) -> Self {
        Self::with_timestamp(shape, model, frame::now_timestamp(), streaming)
    }

    pub fn with_timestamp(
        shape: Shape,
        model: impl Into<String>,
        created_at: impl Into<String>,
        streaming: StreamingConfig,
    ) -> Self {
        Self {
            shape,
            model: model.into(),
            created_at: created_at.into(),
            streaming,
        }
    }

    /// Single terminal frame carrying advisory text
    pub fn advisory(&self, advisory: &Advisory) -> Emission {
        self.single(advisory.to_string())
    }

    /// Frames for a decoded upstream reply
    ///
    /// `stream` only matters for text replies; media replies are always a
    /// single frame.
    pub fn reply(&self, reply: UpstreamReply, stream: bool) -> Emission {
        if reply.is_text() && stream {
            self.streamed(&reply.into_content())
        } else {
            self.single(reply.into_content())
        }
    }

    fn single(&self, content: String) -> Emission {
        Emission {
            frames: vec![Frame::terminal(
                self.shape,
                &self.model,
                &self.created_at,
                content,
            )],
            streamed: false,
            pacing: Duration::ZERO,
        }
    }

    fn streamed(&self, text: &str) -> Emission {
        let cleaned = scrub::scrub(text);
        let mut frames: Vec<Frame> = scrub::chunk_chars(&cleaned, self.streaming.chunk_chars)
            .into_iter()
            .map(|chunk| Frame::chunk(self.shape, &self.model, &self.created_at, chunk))
            .collect();
        frames.push(Frame::stream_end(self.shape, &self.model, &self.created_at));

        Emission {
            frames,
            streamed: true,
            pacing: Duration::from_millis(self.streaming.frame_delay_ms),
        }
    }
}

/// Frames ready to be written for one request
#[derive(Debug, Clone)]
pub struct Emission {
    frames: Vec<Frame>,
    streamed: bool,
    pacing: Duration,
}

impl Emission {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_streamed(&self) -> bool {
        self.streamed
    }

    /// Concatenated content of the non-final frames
    pub fn streamed_content(&self) -> String {
        self.frames
            .iter()
            .filter(|f| !f.is_final())
            .map(Frame::content)
            .collect()
    }
}

impl IntoResponse for Emission {
    fn into_response(self) -> Response {
        if !self.streamed {
            let body: String = self.frames.iter().map(Frame::to_line).collect();
            return (
                StatusCode::OK,
                [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
                body,
            )
                .into_response();
        }

        let pacing = self.pacing;
        // Dropping the body (client gone) stops the stream at the next frame
        let lines = stream::iter(self.frames.into_iter().enumerate()).then(
            move |(idx, frame)| async move {
                if idx > 0 && !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
                Ok::<_, Infallible>(frame.to_line())
            },
        );

        let mut response = Response::new(Body::from_stream(lines));
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(NDJSON_CONTENT_TYPE),
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
        headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        response
    }
}
