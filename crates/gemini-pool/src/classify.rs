//! Failure classification for Gemini API responses
//!
//! The only place that knows what a Gemini quota rejection looks like. Gemini
//! answers quota exhaustion with HTTP 429 and a `RESOURCE_EXHAUSTED` status in
//! the JSON body, but transport layers and SDK wrappers sometimes reduce that to
//! a message string, so the message is searched as well.

use provider::{FailureClass, FailureDetail};

/// Message fragments (lowercase) that mark a rate-limit or quota rejection.
const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit",
    "resource_exhausted",
    "quota",
    "too many requests",
];

/// Classify a failed call as a rate-limit rejection or a generic error.
///
/// - HTTP 429 is always a rate limit
/// - Any other HTTP status is a rate limit only when the body carries one of
///   `RATE_LIMIT_PATTERNS`; digits in the body are never read as a status
/// - Without a status (transport errors), a standalone `429` in the message
///   also counts, since wrappers sometimes fold the status into the text
pub fn classify_failure(detail: &FailureDetail) -> FailureClass {
    if detail.status == Some(429) {
        return FailureClass::RateLimit;
    }
    let lower = detail.message.to_lowercase();
    let signalled = RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p))
        || (detail.status.is_none() && contains_status_429(&lower));
    if signalled {
        FailureClass::RateLimit
    } else {
        FailureClass::Generic
    }
}

/// `429` as a whole number, not part of a longer run of digits.
fn contains_status_429(message: &str) -> bool {
    let bytes = message.as_bytes();
    message.match_indices("429").any(|(i, _)| {
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + 3).copied();
        let digit = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_digit());
        !digit(before) && !digit(after)
    })
}
