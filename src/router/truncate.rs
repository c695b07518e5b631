//! Context budget: trims a conversation to a character budget
//!
//! System messages are pinned and always survive. The remaining budget is
//! filled with the most recent non-pinned messages, walking backwards and
//! stopping at the first message that does not fit whole. Survivors keep
//! their original relative order, pinned messages first.

use crate::protocol::message::{Message, total_length};

/// Reduce `messages` to fit within `budget` characters
///
/// Returns the input unchanged when it already fits. Pinned messages count
/// against the budget first; when they alone exceed it, only they remain.
pub fn fit_to_budget(messages: Vec<Message>, budget: usize) -> Vec<Message> {
    let total = total_length(&messages);
    if total <= budget {
        return messages;
    }

    let (pinned, recent): (Vec<Message>, Vec<Message>) =
        messages.into_iter().partition(Message::is_pinned);

    let mut used = total_length(&pinned);
    let mut keep_from = recent.len();
    for (idx, message) in recent.iter().enumerate().rev() {
        let next = used + message.content_length();
        if next > budget {
            break;
        }
        used = next;
        keep_from = idx;
    }

    let dropped = keep_from;
    let mut kept = pinned;
    kept.extend(recent.into_iter().skip(keep_from));

    tracing::debug!(
        before_chars = total,
        after_chars = used,
        budget,
        dropped_messages = dropped,
        "Conversation trimmed to budget"
    );

    kept
}
