//! Upstream request bodies, one per route

use super::Route;
use crate::protocol::message::{ConversationRequest, Role};
use serde::Serialize;

/// Fixed image size requested from the image route
pub const IMAGE_SIZE: &str = "1024x1024";
/// Images requested per call
pub const IMAGE_COUNT: u32 = 1;

#[derive(Debug, Serialize)]
struct ChatMessagePayload<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: Vec<ChatMessagePayload<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ImagePayload<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'static str,
    n: u32,
}

#[derive(Debug, Serialize)]
struct PromptPayload<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct SpeechPayload<'a> {
    text: &'a str,
}

/// Legacy chat takes bare contents, no roles
#[derive(Debug, Serialize)]
struct LegacyChatPayload<'a> {
    messages: Vec<&'a str>,
}

/// Encode the upstream body for `route`
pub fn encode(
    route: Route,
    base_model: &str,
    request: &ConversationRequest,
) -> serde_json::Result<Vec<u8>> {
    match route {
        Route::Chat => serde_json::to_vec(&ChatPayload {
            model: base_model,
            messages: request
                .messages()
                .iter()
                .map(|m| ChatMessagePayload {
                    role: m.role(),
                    content: m.content(),
                })
                .collect(),
            temperature: request.options().temperature(),
        }),
        Route::Image => serde_json::to_vec(&ImagePayload {
            model: base_model,
            prompt: request.last_content(),
            size: IMAGE_SIZE,
            n: IMAGE_COUNT,
        }),
        Route::Base64Image => serde_json::to_vec(&PromptPayload {
            prompt: request.last_content(),
        }),
        Route::Speech => serde_json::to_vec(&SpeechPayload {
            text: request.last_content(),
        }),
        Route::LegacyChat => serde_json::to_vec(&LegacyChatPayload {
            messages: request.messages().iter().map(|m| m.content()).collect(),
        }),
    }
}
