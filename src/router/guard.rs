//! Pre-forwarding guards
//!
//! Guards run in a fixed order before any upstream payload is built: the
//! spam guard first, then the route's length guard. A guard either lets the
//! request through (possibly trimmed) or answers it with an [`Advisory`].

use super::truncate::fit_to_budget;
use crate::error::{Advisory, LengthSubject};
use crate::protocol::message::{ConversationRequest, Message};
use crate::session::TrimOverride;

/// Marker carried by clients' automated background prompts (chat titles,
/// follow-up suggestions, tag generation)
pub const SPAM_MARKER: &str = "### Task:";

/// Reject conversations containing the background-task marker anywhere
pub fn spam_guard(messages: &[Message]) -> Result<(), Advisory> {
    if messages.iter().any(|m| m.content().contains(SPAM_MARKER)) {
        return Err(Advisory::BlockedBySpamGuard);
    }
    Ok(())
}

/// How a route measures request size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Sum of all messages; may be trimmed when the session allows it
    Aggregate { limit: usize },
    /// Length of the most recent message only; never trimmed
    LastMessage { limit: usize, subject: LengthSubject },
}

/// Enforce the route's length ceiling
///
/// Aggregate overflows are trimmed when `trim` is [`TrimOverride::Always`]
/// and rejected otherwise. Last-message overflows are always rejected.
pub fn length_guard(
    policy: LengthPolicy,
    request: &mut ConversationRequest,
    trim: TrimOverride,
) -> Result<(), Advisory> {
    match policy {
        LengthPolicy::Aggregate { limit } => {
            let total = request.total_length();
            if total <= limit {
                return Ok(());
            }
            if trim.trims() {
                tracing::info!(
                    total_chars = total,
                    limit,
                    "Conversation over budget, trimming"
                );
                let messages = request.messages().to_vec();
                request.replace_messages(fit_to_budget(messages, limit));
                Ok(())
            } else {
                tracing::info!(
                    total_chars = total,
                    limit,
                    "Conversation over budget and trimming is off, rejecting"
                );
                Err(Advisory::TooLong {
                    limit,
                    subject: LengthSubject::Conversation,
                })
            }
        }
        LengthPolicy::LastMessage { limit, subject } => {
            let length = request.last_content().chars().count();
            if length > limit {
                tracing::info!(
                    prompt_chars = length,
                    limit,
                    subject = ?subject,
                    "Prompt over limit, rejecting"
                );
                return Err(Advisory::TooLong { limit, subject });
            }
            Ok(())
        }
    }
}
