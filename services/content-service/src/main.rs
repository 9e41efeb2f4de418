//! Recipe content service
//!
//! Single-binary Rust service that:
//! 1. Loads a numbered pool of Gemini API keys from the environment
//! 2. Generates recipe blog posts and Pinterest descriptions on request
//! 3. Rotates keys on rate limits and repeated failures
//! 4. Exposes health, Prometheus metrics and an optional admin listener

mod admin;
mod config;
mod content;
mod error;
mod generator;
mod metrics;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use gemini_client::GeminiClient;
use gemini_pool::RotationManager;
use metrics_exporter_prometheus::PrometheusHandle;
use provider::{CredentialSource, EnvCredentialSource};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::{AdminState, build_admin_router};
use crate::config::Config;
use crate::content::ContentState;
use crate::generator::ContentGenerator;
use crate::metrics::ServiceMetrics;

/// Time allowed for in-flight generations to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    content: ContentState,
    metrics: ServiceMetrics,
    prometheus: PrometheusHandle,
}

impl AppState {
    fn new(generator: ContentGenerator, prometheus: PrometheusHandle) -> Self {
        let metrics = ServiceMetrics::new();
        Self {
            content: ContentState {
                generator: Arc::new(generator),
                requests_total: metrics.requests_total.clone(),
                errors_total: metrics.errors_total.clone(),
            },
            metrics,
            prometheus,
        }
    }
}

/// Build the public router. `max_connections` bounds concurrent requests.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/content/blog-post", post(blog_post_handler))
        .route(
            "/content/pinterest-description",
            post(pinterest_description_handler),
        )
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting recipe-content-service");

    let prometheus_handle = metrics::install_recorder();

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        endpoint = %config.gemini.endpoint,
        key_env_prefix = %config.gemini.key_env_prefix,
        "configuration loaded"
    );

    let source: Arc<dyn CredentialSource> =
        Arc::new(EnvCredentialSource::new(&config.gemini.key_env_prefix));
    let manager = Arc::new(
        RotationManager::new(
            config.rotation.pool_size,
            config.rotation.error_threshold,
            source.clone(),
        )
        .context("failed to build key rotation pool")?,
    );

    let missing: Vec<usize> = (1..=manager.pool_size())
        .filter(|&slot| source.resolve(slot).is_none())
        .collect();
    if !missing.is_empty() {
        warn!(
            ?missing,
            prefix = %config.gemini.key_env_prefix,
            "some key slots have no API key; requests fail while such a slot is active"
        );
    }
    info!(
        pool_size = manager.pool_size(),
        error_threshold = manager.error_threshold(),
        keys_configured = manager.pool_size() - missing.len(),
        "key rotation pool ready"
    );

    let client = GeminiClient::new(
        reqwest::Client::new(),
        config.gemini.endpoint.clone(),
        Duration::from_secs(config.gemini.timeout_secs),
    );
    let generator = ContentGenerator::new(manager.clone(), client, config.gemini.max_attempts);

    let app_state = AppState::new(generator, prometheus_handle);
    let app = build_router(app_state, config.server.max_connections);

    if let Some(admin_addr) = config.server.admin_listen_addr {
        let admin_app = build_admin_router(AdminState::new(manager.clone()));
        let admin_listener = TcpListener::bind(admin_addr)
            .await
            .with_context(|| format!("failed to bind admin listener to {admin_addr}"))?;
        info!(addr = %admin_addr, "admin API listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, admin_app).await {
                error!(error = %e, "admin server error");
            }
        });
    }

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timer starts at signal receipt, not at server start.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!(final_slot = manager.current_slot(), "shutdown complete");
    Ok(())
}

/// Health endpoint: uptime, request counters and key pool health.
///
/// Always 200; a degraded pool still serves because rotation heals it.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.metrics.started_at.elapsed().as_secs();
    let requests = state.metrics.requests_total.load(Ordering::Relaxed);
    let errors = state.metrics.errors_total.load(Ordering::Relaxed);
    let pool = state.content.generator.manager().health();
    let status = pool["status"].clone();

    let body = serde_json::json!({
        "status": status,
        "uptime_seconds": uptime,
        "requests_served": requests,
        "errors_total": errors,
        "key_pool": pool,
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

async fn blog_post_handler(State(state): State<AppState>, body: Bytes) -> Response {
    content::blog_post(&state.content, &body, new_request_id()).await
}

async fn pinterest_description_handler(State(state): State<AppState>, body: Bytes) -> Response {
    content::pinterest_description(&state.content, &body, new_request_id()).await
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
