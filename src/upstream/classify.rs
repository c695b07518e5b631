//! Upstream failure classification
//!
//! Inspects the raw status and body before any decoding. HTML challenge pages
//! and rate-limit replies are turned into advisories instead of reaching the
//! client as errors.

use crate::error::Advisory;
use reqwest::StatusCode;

/// Phrase the upstream puts in its JSON body when throttling
pub const RATE_LIMIT_MARKER: &str = "\"Too many requests (\"";

/// Legacy chat reply wrapping an HTML page in its `reply` field
const ESCAPED_HTML_REPLY_PREFIX: &str = "{\"reply\":\"<!DOCTYPE html>";

/// Classify an upstream reply
///
/// Precedence: HTML (blocked) first, then 429 or the rate-limit marker.
/// Returns `None` when the body should be decoded normally.
pub fn classify(status: StatusCode, body: &str) -> Option<Advisory> {
    if looks_like_html(body) {
        return Some(Advisory::UpstreamBlocked);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains(RATE_LIMIT_MARKER) {
        return Some(Advisory::RateLimited);
    }
    None
}

fn looks_like_html(body: &str) -> bool {
    if body.starts_with(ESCAPED_HTML_REPLY_PREFIX) {
        return true;
    }
    let head = body.trim_start();
    starts_with_ignore_case(head, "<html") || starts_with_ignore_case(head, "<!doctype html")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_document_is_blocked() {
        assert_eq!(
            classify(StatusCode::OK, "<html><body>challenge</body></html>"),
            Some(Advisory::UpstreamBlocked)
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, "\n  <!DOCTYPE html><html></html>"),
            Some(Advisory::UpstreamBlocked)
        );
    }

    #[test]
    fn test_escaped_html_in_reply_is_blocked() {
        let body = r#"{"reply":"<!DOCTYPE html>\n<html lang=\"en\">...","ms":3}"#;
        assert_eq!(classify(StatusCode::OK, body), Some(Advisory::UpstreamBlocked));
    }

    #[test]
    fn test_html_takes_precedence_over_429() {
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, "<html>slow down</html>"),
            Some(Advisory::UpstreamBlocked)
        );
    }

    #[test]
    fn test_429_is_rate_limited() {
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, r#"{"reply":"hello"}"#),
            Some(Advisory::RateLimited)
        );
    }

    #[test]
    fn test_marker_phrase_is_rate_limited() {
        let body = r#"{"error":"Too many requests (","retry":30}"#;
        assert_eq!(classify(StatusCode::OK, body), Some(Advisory::RateLimited));
    }

    #[test]
    fn test_normal_body_passes() {
        assert_eq!(classify(StatusCode::OK, r#"{"content":"hello there"}"#), None);
        assert_eq!(
            classify(StatusCode::OK, r#"{"reply":"I said <html> once"}"#),
            None
        );
        assert_eq!(classify(StatusCode::OK, ""), None);
    }

    #[test]
    fn test_multibyte_body_does_not_panic() {
        assert_eq!(classify(StatusCode::OK, "é"), None);
        assert_eq!(classify(StatusCode::OK, "<ht€"), None);
    }
}
