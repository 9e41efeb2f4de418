//! Gemini API constants

/// Default `generateContent` endpoint for the text model.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest Pinterest description the prompt asks for, in characters.
pub const PINTEREST_DESCRIPTION_MAX_CHARS: usize = 500;
