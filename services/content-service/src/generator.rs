//! Content generation driven through the key rotation pool
//!
//! Each attempt is exactly one `current_credential()` → one Gemini call → one
//! report. The pool decides which key the next attempt uses; this module only
//! decides how many attempts a request gets.

use std::sync::Arc;
use std::time::Duration;

use gemini_client::{BlogPost, GeminiClient, GenerateRequest, parse_blog_post, prompt};
use gemini_pool::{RotationManager, classify_failure};
use tracing::{error, info, instrument, warn};

use crate::error::{Error, Result};
use crate::metrics;

/// Pause between attempts so a burst of failures does not walk the whole
/// pool within a few milliseconds.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Generates recipe content, reporting every attempt to the rotation pool.
pub struct ContentGenerator {
    manager: Arc<RotationManager>,
    client: GeminiClient,
    max_attempts: u32,
}

impl ContentGenerator {
    pub fn new(manager: Arc<RotationManager>, client: GeminiClient, max_attempts: u32) -> Self {
        Self {
            manager,
            client,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn manager(&self) -> &Arc<RotationManager> {
        &self.manager
    }

    /// Run one prompt, retrying across rotations.
    ///
    /// - Missing key for the active slot → `Error::Configuration` at once, no report
    /// - Call failure → `report_failure`, then retry with whatever slot is active
    /// - 2xx without usable text → `report_success` (the key worked), `Error::InvalidContent`
    #[instrument(skip_all, fields(max_attempts = self.max_attempts))]
    pub async fn generate_text(&self, request: &GenerateRequest) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let credential = self.manager.current_credential()?;

            match self.client.generate(&credential.key, request).await {
                Ok(text) => {
                    self.manager.report_success();
                    metrics::record_attempt("success");
                    info!(attempt, slot = credential.slot, "content generated");
                    return Ok(text);
                }
                Err(e) => match e.failure_detail() {
                    Some(detail) => {
                        let class = classify_failure(&detail);
                        warn!(
                            attempt,
                            slot = credential.slot,
                            class = class.label(),
                            error = %e,
                            "generation attempt failed"
                        );
                        self.manager.report_failure(&detail);
                        metrics::record_attempt(class.label());
                        last_error = e.to_string();
                    }
                    None => {
                        self.manager.report_success();
                        metrics::record_attempt("unusable");
                        warn!(
                            attempt,
                            slot = credential.slot,
                            error = %e,
                            "Gemini returned unusable content"
                        );
                        return Err(Error::InvalidContent(e.to_string()));
                    }
                },
            }
        }

        error!(attempts = self.max_attempts, "all generation attempts failed");
        Err(Error::GenerationUnavailable {
            attempts: self.max_attempts,
            last_error,
        })
    }

    /// Generate and parse a full blog post for `title`.
    pub async fn blog_post(&self, title: &str) -> Result<BlogPost> {
        let text = self.generate_text(&prompt::blog_post(title)).await?;
        parse_blog_post(&text).map_err(|e| Error::InvalidContent(e.to_string()))
    }

    /// Generate a Pinterest pin description.
    pub async fn pinterest_description(&self, title: &str, excerpt: &str) -> Result<String> {
        let text = self
            .generate_text(&prompt::pinterest_description(title, excerpt))
            .await?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::StatusCode;
    use provider::StaticCredentialSource;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// Scripted upstream reply: status, body.
    pub(crate) type Reply = (StatusCode, serde_json::Value);

    pub(crate) fn ok_text(text: &str) -> Reply {
        (
            StatusCode::OK,
            serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}),
        )
    }

    pub(crate) fn rate_limited() -> Reply {
        (
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}),
        )
    }

    pub(crate) fn server_error() -> Reply {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": {"code": 500, "status": "INTERNAL"}}),
        )
    }

    /// Mock Gemini that answers with the scripted replies in order (the last
    /// one repeats) and records which API key each request carried.
    pub(crate) async fn scripted_gemini(
        replies: Vec<Reply>,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let keys = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(VecDeque::from(replies)));
        let seen = keys.clone();

        tokio::spawn(async move {
            let app = axum::Router::new().fallback(move |headers: axum::http::HeaderMap| {
                let seen = seen.clone();
                let queue = queue.clone();
                async move {
                    let key = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    seen.lock().unwrap().push(key);
                    let (status, body) = {
                        let mut q = queue.lock().unwrap();
                        if q.len() > 1 {
                            q.pop_front().unwrap()
                        } else {
                            q.front().cloned().unwrap()
                        }
                    };
                    (status, axum::Json(body))
                }
            });
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/generate"), keys)
    }

    pub(crate) fn generator(endpoint: &str, slots: usize, max_attempts: u32) -> ContentGenerator {
        let manager = Arc::new(
            RotationManager::new(slots, 5, Arc::new(StaticCredentialSource::numbered(slots)))
                .unwrap(),
        );
        let client = GeminiClient::new(reqwest::Client::new(), endpoint, Duration::from_secs(5));
        ContentGenerator::new(manager, client, max_attempts)
    }

    #[tokio::test]
    async fn success_reports_to_active_slot() {
        let (endpoint, keys) = scripted_gemini(vec![ok_text("a lovely pie")]).await;
        let generator = generator(&endpoint, 3, 3);

        let text = generator
            .generate_text(&prompt::pinterest_description("Pie", "Flaky"))
            .await
            .unwrap();
        assert_eq!(text, "a lovely pie");
        assert_eq!(*keys.lock().unwrap(), vec!["key-1"]);

        let status = generator.manager().status();
        assert_eq!(status.slots[0].request_count, 1);
        assert_eq!(status.current_slot, 1);
    }

    #[tokio::test]
    async fn rate_limit_rotates_and_retries_on_next_key() {
        let (endpoint, keys) = scripted_gemini(vec![rate_limited(), ok_text("done")]).await;
        let generator = generator(&endpoint, 3, 3);

        let text = generator
            .generate_text(&prompt::blog_post("Stew"))
            .await
            .unwrap();
        assert_eq!(text, "done");
        assert_eq!(*keys.lock().unwrap(), vec!["key-1", "key-2"]);

        let status = generator.manager().status();
        assert!(status.slots[0].rate_limit_reached);
        assert_eq!(status.slots[1].request_count, 1);
        assert_eq!(status.current_slot, 2);
    }

    #[tokio::test]
    async fn generic_failure_retries_same_key() {
        let (endpoint, keys) = scripted_gemini(vec![server_error(), ok_text("done")]).await;
        let generator = generator(&endpoint, 3, 3);

        generator
            .generate_text(&prompt::blog_post("Stew"))
            .await
            .unwrap();
        assert_eq!(*keys.lock().unwrap(), vec!["key-1", "key-1"]);

        let status = generator.manager().status();
        assert_eq!(status.slots[0].error_count, 1);
        assert_eq!(status.slots[0].request_count, 1);
        assert!(!status.slots[0].rate_limit_reached);
    }

    #[tokio::test]
    async fn exhausting_attempts_is_generation_unavailable() {
        let (endpoint, keys) = scripted_gemini(vec![server_error()]).await;
        let generator = generator(&endpoint, 3, 2);

        let err = generator
            .generate_text(&prompt::blog_post("Stew"))
            .await
            .unwrap_err();
        match err {
            Error::GenerationUnavailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("500"), "got: {last_error}");
            }
            other => panic!("expected GenerationUnavailable, got {other:?}"),
        }
        assert_eq!(keys.lock().unwrap().len(), 2);
        assert_eq!(generator.manager().status().slots[0].error_count, 2);
    }

    #[tokio::test]
    async fn missing_key_aborts_without_calling_upstream() {
        let (endpoint, keys) = scripted_gemini(vec![ok_text("unused")]).await;
        let manager = Arc::new(
            RotationManager::new(2, 5, Arc::new(StaticCredentialSource::new().with_key(2, "k2")))
                .unwrap(),
        );
        let client = GeminiClient::new(reqwest::Client::new(), &endpoint, Duration::from_secs(5));
        let generator = ContentGenerator::new(manager, client, 3);

        let err = generator
            .generate_text(&prompt::blog_post("Stew"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
        assert!(keys.lock().unwrap().is_empty());

        let status = generator.manager().status();
        assert_eq!(status.current_slot, 1);
        assert_eq!(status.slots[0].error_count, 0);
    }

    #[tokio::test]
    async fn empty_candidate_counts_as_key_success() {
        let (endpoint, _) = scripted_gemini(vec![(
            StatusCode::OK,
            serde_json::json!({"candidates": []}),
        )])
        .await;
        let generator = generator(&endpoint, 2, 3);

        let err = generator
            .generate_text(&prompt::blog_post("Stew"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
        let status = generator.manager().status();
        assert_eq!(status.slots[0].request_count, 1);
        assert_eq!(status.slots[0].error_count, 0);
    }

    #[tokio::test]
    async fn blog_post_parses_generated_json() {
        let text = r#"Sure! {"content":"Grandma's stew","excerpt":"Warm.","ingredients":["beef"],"instructions":["simmer"]}"#;
        let (endpoint, _) = scripted_gemini(vec![ok_text(text)]).await;
        let generator = generator(&endpoint, 2, 3);

        let post = generator.blog_post("Beef Stew").await.unwrap();
        assert_eq!(post.content, "Grandma's stew");
        assert_eq!(post.ingredients, vec!["beef"]);
    }

    #[tokio::test]
    async fn blog_post_without_json_is_invalid_content() {
        let (endpoint, _) = scripted_gemini(vec![ok_text("I cannot do that.")]).await;
        let generator = generator(&endpoint, 2, 3);

        let err = generator.blog_post("Beef Stew").await.unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
    }

    #[tokio::test]
    async fn pinterest_description_is_trimmed() {
        let (endpoint, _) = scripted_gemini(vec![ok_text("  Cozy stew! #dinner \n")]).await;
        let generator = generator(&endpoint, 2, 3);

        let description = generator
            .pinterest_description("Beef Stew", "Warm.")
            .await
            .unwrap();
        assert_eq!(description, "Cozy stew! #dinner");
    }

    #[test]
    fn zero_max_attempts_is_clamped_to_one() {
        let g = generator("http://127.0.0.1:1", 1, 0);
        assert_eq!(g.max_attempts, 1);
    }
}
