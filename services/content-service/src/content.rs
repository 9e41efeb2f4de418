//! Content generation request handling
//!
//! Bodies are parsed by hand rather than through axum's `Json` extractor so
//! that malformed input gets the same JSON error shape as every other failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gemini_client::{BlogPost, PINTEREST_DESCRIPTION_MAX_CHARS};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::generator::ContentGenerator;
use crate::metrics;

/// Shortest accepted recipe title, in characters after trimming.
pub const MIN_TITLE_CHARS: usize = 5;

/// State shared by the generation handlers.
#[derive(Clone)]
pub struct ContentState {
    pub generator: Arc<ContentGenerator>,
    pub requests_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
struct BlogPostRequest {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct PinterestRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
}

#[derive(Serialize)]
struct BlogPostResponse {
    success: bool,
    post: BlogPost,
}

#[derive(Serialize)]
struct PinterestResponse {
    success: bool,
    description: String,
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidRequest(format!("malformed JSON body: {e}")))
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(Error::InvalidRequest(format!(
            "title must be at least {MIN_TITLE_CHARS} characters"
        )));
    }
    Ok(title)
}

/// Cap a description at the pin limit without splitting a character.
fn truncate_description(description: String) -> String {
    match description.char_indices().nth(PINTEREST_DESCRIPTION_MAX_CHARS) {
        Some((cut, _)) => description[..cut].trim_end().to_string(),
        None => description,
    }
}

/// POST /content/blog-post
pub async fn blog_post(state: &ContentState, body: &[u8], request_id: String) -> Response {
    let start = Instant::now();
    let result = async {
        let request: BlogPostRequest = parse_body(body)?;
        let title = validate_title(&request.title)?;
        info!(request_id, title, "generating blog post");
        state.generator.blog_post(title).await
    }
    .await;

    let body = result.map(|post| {
        serde_json::to_value(BlogPostResponse {
            success: true,
            post,
        })
    });
    finish(state, "blog_post", start, &request_id, body)
}

/// POST /content/pinterest-description
pub async fn pinterest_description(
    state: &ContentState,
    body: &[u8],
    request_id: String,
) -> Response {
    let start = Instant::now();
    let result = async {
        let request: PinterestRequest = parse_body(body)?;
        let title = request.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidRequest("title is required".into()));
        }
        info!(request_id, title, "generating Pinterest description");
        state
            .generator
            .pinterest_description(title, request.excerpt.trim())
            .await
    }
    .await;

    let body = result.map(|description| {
        serde_json::to_value(PinterestResponse {
            success: true,
            description: truncate_description(description),
        })
    });
    finish(state, "pinterest_description", start, &request_id, body)
}

/// Count, time and render the outcome of one generation request.
fn finish(
    state: &ContentState,
    kind: &'static str,
    start: Instant,
    request_id: &str,
    result: Result<serde_json::Result<serde_json::Value>>,
) -> Response {
    state.requests_total.fetch_add(1, Ordering::Relaxed);

    let response = match result {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response(),
        Ok(Err(e)) => Error::InvalidContent(e.to_string()).into_response(request_id),
        Err(e) => {
            warn!(request_id, kind, error = %e, "content request failed");
            e.into_response(request_id)
        }
    };

    if !response.status().is_success() {
        state.errors_total.fetch_add(1, Ordering::Relaxed);
    }
    metrics::record_request(kind, response.status().as_u16(), start.elapsed().as_secs_f64());
    response
}
