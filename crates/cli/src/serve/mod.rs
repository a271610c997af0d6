//! `lodgeflow serve` -- HTTP JSON API for the approval workflow engine.
//!
//! Exposes creation, approval and listing endpoints over the in-memory
//! backend using `axum` + `tokio`. Identity is a collaborator: the caller
//! presents `x-user-id` and the directory file supplies role and department.
//!
//! Security features:
//! - CORS headers on all responses (permissive for local dev)
//! - Per-IP rate limiting (default: 60 req/min, configurable)
//! - Optional API key authentication via LODGEFLOW_API_KEY env var
//!
//! Endpoints:
//! - GET  /health                       - Server status (exempt from auth)
//! - POST /{collection}                 - Create (requests, attendance,
//!                                        procurements, schedules)
//! - GET  /{collection}/pending         - The actor's approval queue
//! - GET  /{collection}/history         - Entities the actor acted on
//! - GET  /{collection}/mine            - The actor's own submissions
//! - PUT  /{collection}/{id}/approval   - Approve or reject
//! - PUT  /attendance/{id}/status       - Same, legacy route shape
//! - GET  /notifications                - The actor's inbox
//! - PUT  /notifications/{id}/read      - Mark one read
//! - PUT  /notifications/read-all       - Mark all read
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod middleware;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Json, Router};
use lodgeflow_engine::{LogMailer, NotificationHub, WorkflowEngine};
use lodgeflow_storage::{MemoryStore, WorkflowStore};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{
    handle_approval, handle_attendance_status, handle_create, handle_health, handle_history,
    handle_mine, handle_not_found, handle_notification_read, handle_notifications,
    handle_notifications_read_all, handle_pending,
};
use self::middleware::{actor_middleware, auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter};

/// Maximum request body size: 2 MB (the schedule grid is the largest body).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Default rate limit: 60 requests per minute per IP.
const DEFAULT_RATE_LIMIT: u64 = 60;

/// Rate limit window duration in seconds (1 minute).
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Start the HTTP server on the given port, loading the user directory
/// from `users_path`.
///
/// When TLS cert/key paths are provided, the server listens over HTTPS
/// using `axum-server` with rustls. Otherwise it uses plain HTTP.
pub async fn start_server(
    port: u16,
    users_path: PathBuf,
    rate_limit_flag: Option<u64>,
    _tls_cert: Option<PathBuf>,
    _tls_key: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = crate::seed::load_users(&users_path)?;
    tracing::info!(count = users.len(), path = %users_path.display(), "user directory loaded");

    let memory = Arc::new(MemoryStore::new());
    memory.load_users(users).await;
    let store: Arc<dyn WorkflowStore> = memory;

    let hub = NotificationHub::spawn(store.clone(), Arc::new(LogMailer));
    let engine = WorkflowEngine::new(store.clone(), hub);

    // Rate limit precedence: flag, then LODGEFLOW_RATE_LIMIT, then default.
    let rate_limit = rate_limit_flag
        .or_else(|| {
            std::env::var("LODGEFLOW_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
        })
        .unwrap_or(DEFAULT_RATE_LIMIT);

    let api_key = std::env::var("LODGEFLOW_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    tracing::info!(rate_limit, "rate limit (requests per minute per IP)");

    let state = Arc::new(AppState {
        engine: engine.clone(),
        store,
        rate_limiter: RateLimiter::new(rate_limit),
        api_key,
    });

    // Permissive CORS for local dev.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/notifications", get(handle_notifications))
        .route("/notifications/read-all", put(handle_notifications_read_all))
        .route("/notifications/{id}/read", put(handle_notification_read))
        .route("/attendance/{id}/status", put(handle_attendance_status))
        .route("/{collection}", post(handle_create))
        .route("/{collection}/pending", get(handle_pending))
        .route("/{collection}/history", get(handle_history))
        .route("/{collection}/mine", get(handle_mine))
        .route("/{collection}/{id}/approval", put(handle_approval))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            actor_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");

    // TLS support via axum-server + rustls (requires `tls` feature)
    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&_tls_cert, &_tls_key) {
        let config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        let socket_addr: std::net::SocketAddr = addr.parse()?;
        eprintln!("lodgeflow listening on https://0.0.0.0:{port}");
        axum_server::bind_rustls(socket_addr, config)
            .serve(app.into_make_service_with_connect_info::<std::net::SocketAddr>())
            .await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("lodgeflow listening on http://0.0.0.0:{port}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Drain anything still queued for delivery before exiting.
    engine.flush_notifications().await;
    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    eprintln!("\nReceived shutdown signal...");
}
