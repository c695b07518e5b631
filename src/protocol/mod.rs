//! Ollama wire protocol types
//!
//! Inbound request shapes, the canonical message model they normalize into,
//! the outbound frame format, and the static model catalog.

pub mod catalog;
pub mod frame;
pub mod message;
pub mod request;

pub use frame::{Frame, Shape};
pub use message::{ConversationRequest, GenerationOptions, Message, Role};
pub use request::{ChatRequest, GenerateRequest};
