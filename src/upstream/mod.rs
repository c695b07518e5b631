//! Upstream service: HTTP transport, failure classification, reply decoding

pub mod classify;
pub mod client;
pub mod reply;

pub use classify::classify;
pub use client::{RawReply, UpstreamClient};
pub use reply::UpstreamReply;
