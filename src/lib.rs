use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, info};

pub mod auth;
pub mod config;
pub mod telemetry;

use auth::{GatewayError, LOGIN_HEADER_NAME, LoginGate};

/// Liveness and readiness probe; answers without a session.
async fn health() -> &'static str {
    "OK"
}

/// Landing page behind the gate.
async fn home(headers: HeaderMap) -> String {
    let user = headers
        .get(&*LOGIN_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    debug!("Serving home page for {}", user);
    format!("login success: {}", user)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

/// Assemble the gateway router around an existing gate.
///
/// Health probes stay outside the gate; every other path, unknown ones
/// included, passes through it.
pub fn app(gate: Arc<LoginGate>, request_timeout: Duration) -> Router {
    let protected = gate.protect(Router::new().route("/", get(home)).fallback(not_found));

    Router::new()
        .route("/healthz", get(health))
        .route("/readiness", get(health))
        .merge(protected)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Build the router from configuration, talking to Google.
pub fn build_router(config: &config::Config) -> Result<Router, GatewayError> {
    let gate = LoginGate::from_config(&config.auth)?;
    info!("Login callback path is {}", gate.callback_path());

    Ok(app(
        Arc::new(gate),
        Duration::from_secs(config.server.request_timeout_secs),
    ))
}

/// Starts the web server and runs until `shutdown_rx` fires.
pub async fn start_server_with_config(
    config: config::Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let app = build_router(&config)?;

    let addr = config.server.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Login gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Shutdown requested, draining connections");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
