//! Gemini `generateContent` client for recipe content
//!
//! Builds prompts for blog posts and Pinterest pin descriptions, sends one
//! request per call with a caller-supplied API key, and parses the model text.
//! This crate does not choose keys or retry; the caller pairs each call with a
//! rotation report.
//!
//! Call flow:
//! 1. Caller builds a `GenerateRequest` via `prompt::blog_post` or `prompt::pinterest_description`
//! 2. `GeminiClient::generate()` POSTs it with the `x-goog-api-key` header
//! 3. On failure, `Error::failure_detail()` describes it for the rotation manager
//! 4. On success, `content::parse_blog_post()` turns blog text into a `BlogPost`

pub mod client;
pub mod constants;
pub mod content;
pub mod error;
pub mod prompt;

pub use client::{GeminiClient, GenerateRequest, GenerationConfig};
pub use constants::*;
pub use content::{BlogPost, parse_blog_post};
pub use error::{Error, Result};
