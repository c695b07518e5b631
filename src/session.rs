//! Session-wide toggles
//!
//! Two switches are fixed once before the server starts and never change
//! afterwards: whether replies stream, and whether oversized conversations
//! are trimmed. They are carried in [`SessionToggles`] and passed by value
//! into the request pipeline.
//!
//! Values come from the command line, then the config file, then an
//! interactive prompt with a timeout.

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// How long to wait for the streaming answer before defaulting to `ask`
pub const STREAM_PROMPT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long to wait for the trimming answer before leaving it disabled
pub const TRIM_PROMPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Session-wide streaming override
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum StreamOverride {
    /// Every chat reply streams
    #[serde(rename = "on")]
    #[value(name = "on")]
    AlwaysOn,
    /// Every chat reply is a single frame
    #[serde(rename = "off")]
    #[value(name = "off")]
    AlwaysOff,
    /// The request's `stream` flag decides; absent means stream
    #[default]
    #[serde(rename = "ask")]
    #[value(name = "ask")]
    PerRequest,
}

impl StreamOverride {
    /// Resolve the streaming mode for one request
    pub fn decide(self, requested: Option<bool>) -> bool {
        match self {
            Self::AlwaysOn => true,
            Self::AlwaysOff => false,
            Self::PerRequest => requested.unwrap_or(true),
        }
    }

    /// Parse a console answer; anything unrecognized means per-request
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "on" => Self::AlwaysOn,
            "off" => Self::AlwaysOff,
            _ => Self::PerRequest,
        }
    }
}

/// Session-wide truncation override
///
/// Only [`TrimOverride::Always`] enables trimming. Both other states reject
/// oversized conversations with a "too long" reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimOverride {
    Always,
    Never,
    #[default]
    Unset,
}

impl TrimOverride {
    pub fn trims(self) -> bool {
        matches!(self, Self::Always)
    }

    /// Parse a console answer: `p` enables trimming, anything else declines
    pub fn from_answer(answer: &str) -> Self {
        if answer.trim().eq_ignore_ascii_case("p") {
            Self::Always
        } else {
            Self::Never
        }
    }
}

impl From<bool> for TrimOverride {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Always } else { Self::Never }
    }
}

/// Immutable toggles shared by every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionToggles {
    pub stream: StreamOverride,
    pub trim: TrimOverride,
}

impl SessionToggles {
    pub fn new(stream: StreamOverride, trim: TrimOverride) -> Self {
        Self { stream, trim }
    }

    /// Fill in the toggles at startup
    ///
    /// `stream` and `trim` are the already-merged CLI/config values. Missing
    /// values are asked on the console when stdin is a terminal; otherwise
    /// the defaults apply.
    pub async fn resolve(stream: Option<StreamOverride>, trim: Option<bool>) -> Self {
        let interactive = std::io::stdin().is_terminal();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let stream = match stream {
            Some(mode) => mode,
            None if interactive => {
                match ask(
                    &mut lines,
                    "Force streaming? (on/off/ask): ",
                    STREAM_PROMPT_TIMEOUT,
                )
                .await
                {
                    Some(answer) => StreamOverride::from_answer(&answer),
                    None => {
                        tracing::info!(
                            timeout_seconds = STREAM_PROMPT_TIMEOUT.as_secs(),
                            "No streaming answer, streaming decided per request"
                        );
                        StreamOverride::PerRequest
                    }
                }
            }
            None => StreamOverride::PerRequest,
        };

        let trim = match trim {
            Some(enabled) => TrimOverride::from(enabled),
            None if interactive => {
                match ask(
                    &mut lines,
                    "Press 'p' to trim long conversations instead of rejecting them: ",
                    TRIM_PROMPT_TIMEOUT,
                )
                .await
                {
                    Some(answer) => TrimOverride::from_answer(&answer),
                    None => {
                        tracing::info!(
                            timeout_seconds = TRIM_PROMPT_TIMEOUT.as_secs(),
                            "No trimming answer, trimming disabled"
                        );
                        TrimOverride::Never
                    }
                }
            }
            None => TrimOverride::Unset,
        };

        let toggles = Self::new(stream, trim);
        tracing::info!(
            stream = ?toggles.stream,
            trim = ?toggles.trim,
            "Session toggles fixed for this run"
        );
        toggles
    }
}

async fn ask<R>(
    lines: &mut tokio::io::Lines<R>,
    prompt: &str,
    timeout: Duration,
) -> Option<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    // Prompt output is best effort; the answer still counts if it fails
    let _ = stdout.write_all(prompt.as_bytes()).await;
    let _ = stdout.flush().await;

    match tokio::time::timeout(timeout, lines.next_line()).await {
        Ok(Ok(Some(line))) => Some(line),
        Ok(Ok(None)) => None,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to read console answer");
            None
        }
        Err(_) => {
            let _ = stdout.write_all(b"\n").await;
            None
        }
    }
}
