//! Typed upstream replies
//!
//! Each route answers with its own JSON shape. Decoding is chosen by the
//! route, so the emitter can match exhaustively on [`UpstreamReply`].

use crate::router::Route;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChatV1Body {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct ChatV2Body {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ImageBody {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct Base64Body {
    #[serde(default)]
    output: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AudioBody {
    url: String,
}

/// Decoded reply, one variant per upstream format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamReply {
    /// Legacy chat: `{"reply": ...}`
    ChatV1(String),
    /// Role-aware chat: `{"content": ...}`
    ChatV2(String),
    /// URL image: first `data[].url`
    Image(String),
    /// Base64 image: `output[0][0]`
    Base64(String),
    /// Speech: `{"url": ...}`
    Audio(String),
}

impl UpstreamReply {
    /// Decode `body` according to the route that produced it
    pub fn decode(route: Route, body: &[u8]) -> serde_json::Result<Self> {
        Ok(match route {
            Route::LegacyChat => Self::ChatV1(serde_json::from_slice::<ChatV1Body>(body)?.reply),
            Route::Chat => Self::ChatV2(serde_json::from_slice::<ChatV2Body>(body)?.content),
            Route::Image => {
                let parsed: ImageBody = serde_json::from_slice(body)?;
                Self::Image(
                    parsed
                        .data
                        .into_iter()
                        .next()
                        .map(|d| d.url)
                        .unwrap_or_default(),
                )
            }
            Route::Base64Image => {
                let parsed: Base64Body = serde_json::from_slice(body)?;
                Self::Base64(
                    parsed
                        .output
                        .into_iter()
                        .next()
                        .and_then(|row| row.into_iter().next())
                        .unwrap_or_default(),
                )
            }
            Route::Speech => Self::Audio(serde_json::from_slice::<AudioBody>(body)?.url),
        })
    }

    /// Whether this reply is free text that may be streamed
    pub fn is_text(&self) -> bool {
        matches!(self, Self::ChatV1(_) | Self::ChatV2(_))
    }

    /// Content that ends up in the outbound frame(s)
    pub fn into_content(self) -> String {
        match self {
            Self::ChatV1(s)
            | Self::ChatV2(s)
            | Self::Image(s)
            | Self::Base64(s)
            | Self::Audio(s) => s,
        }
    }
}
