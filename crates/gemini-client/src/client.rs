//! HTTP client for the `generateContent` endpoint
//!
//! One `generate()` call is one outbound request. The client never retries and
//! never picks a key; both belong to the caller so that every attempt can be
//! reported against the key that made it.

use std::time::Duration;

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::constants::API_KEY_HEADER;
use crate::error::{Error, Result};

/// Sampling settings sent as `generationConfig`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

/// A single-turn text prompt with its sampling settings.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> RequestBody<'a> {
    fn new(request: &'a GenerateRequest) -> Self {
        Self {
            contents: [RequestContent {
                parts: [RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: &request.config,
        }
    }
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl ResponseBody {
    /// Text of the first part of the first candidate.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Send one prompt and return the generated text.
    ///
    /// Non-2xx responses become `Error::Upstream` with the raw body so the
    /// rotation manager can classify them. Timeouts and connect errors become
    /// `Error::Http`.
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn generate(
        &self,
        api_key: &Secret<String>,
        request: &GenerateRequest,
    ) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key.expose().as_str())
            .timeout(self.timeout)
            .json(&RequestBody::new(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            warn!(status = status.as_u16(), "Gemini returned an error response");
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .json::<ResponseBody>()
            .await
            .map_err(|e| Error::Parse(format!("invalid generateContent response: {e}")))?;

        let text = body.into_text().ok_or(Error::EmptyResponse)?;
        debug!(chars = text.len(), "Gemini generated content");
        Ok(text)
    }
}
