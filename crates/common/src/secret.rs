//! Redacting wrapper for API keys and other credentials

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value. Debug/Display print `[REDACTED]`, memory is zeroed on drop.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the raw value. Only call this at the point the value leaves the
    /// process (e.g. when writing a request header).
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Wrap a string, returning `None` when it is empty or whitespace.
    pub fn non_empty(value: impl Into<String>) -> Option<Self> {
        let mut value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            value.zeroize();
            return None;
        }
        let secret = Self(trimmed.to_owned());
        value.zeroize();
        Some(secret)
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let key = Secret::new(String::from("AIzaSy-test-key"));
        assert_eq!(format!("{key:?}"), "[REDACTED]");
        assert_eq!(format!("{key}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner_value() {
        let key = Secret::new(String::from("AIzaSy-test-key"));
        assert_eq!(key.expose(), "AIzaSy-test-key");
    }

    #[test]
    fn non_empty_trims_surrounding_whitespace() {
        let key = Secret::non_empty("  AIzaSy-padded\n").unwrap();
        assert_eq!(key.expose(), "AIzaSy-padded");
    }

    #[test]
    fn non_empty_rejects_blank_values() {
        assert!(Secret::non_empty("").is_none());
        assert!(Secret::non_empty(" \t\n").is_none());
    }
}
