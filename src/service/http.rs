//! HTTP server for the gatekeeper webhook, health checks and Prometheus metrics
//!
//! This module serves the Studio webhook that answers inbound calls with TwiML,
//! along with the operational endpoints, using Axum.

use crate::error::GatekeeperError;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::twiml::EMPTY_RESPONSE;
use crate::types::InboundEvent;
use crate::utils::current_timestamp;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Path Studio posts inbound call events to
pub const WEBHOOK_PATH: &str = "/features/callback-and-voicemail/studio/gatekeeper";

const TWIML_CONTENT_TYPE: &str = "text/xml";

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl From<&crate::config::ServiceSettings> for HttpServerConfig {
    fn from(settings: &crate::config::ServiceSettings) -> Self {
        Self {
            port: settings.http_port,
            host: settings.http_host.clone(),
        }
    }
}

/// HTTP server exposing the webhook and monitoring endpoints
pub struct HttpServer {
    config: HttpServerConfig,
    app_state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpServerConfig, app_state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            app_state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`stop`](Self::stop) is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = self.create_router();
        if let Ok(addr) = listener.local_addr() {
            info!("HTTP server listening on http://{}", addr);
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Create the Axum router with the webhook and monitoring endpoints
    pub fn create_router(&self) -> Router {
        Router::new()
            .route(WEBHOOK_PATH, get(gatekeeper_handler).post(gatekeeper_handler))
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .with_state(self.app_state.clone())
    }

    /// Stop the HTTP server
    pub fn stop(&self) {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}

/// Webhook handler; always answers 200 with a TwiML document
async fn gatekeeper_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let mut params = query;
    match form {
        Ok(Form(body)) => params.extend(body),
        Err(rejection) => debug!("Ignoring request body: {}", rejection),
    }

    let event = InboundEvent::from_params(&params);

    // A panic while deciding still answers with the fail-safe redirect
    let state = app_state.clone();
    let response = match tokio::spawn(async move { state.handle_event(&event).await }).await {
        Ok(response) => response,
        Err(e) => app_state.fallback_response(
            &GatekeeperError::InternalError {
                message: format!("webhook task failed: {}", e),
            }
            .into(),
        ),
    };

    let body = response.to_xml().unwrap_or_else(|e| {
        error!("Failed to render TwiML: {:#}", e);
        EMPTY_RESPONSE.to_string()
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Root endpoint handler - shows service information
async fn root_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let info = json!({
        "service": app_state.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            WEBHOOK_PATH,
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats"
        ]
    });

    Json(info)
}

/// Lightweight health check endpoint handler
async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    let service = app_state.config().service.name.clone();
    let (code, status) = match HealthCheck::liveness_check(app_state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "degraded"),
        Ok(HealthStatus::Unhealthy) | Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": service,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint handler
async fn ready_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(app_state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Liveness check requested");

    match HealthCheck::liveness_check(app_state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(app_state): State<Arc<AppState>>) -> Response {
    debug!("Metrics endpoint requested");

    let metrics = app_state.metrics();
    metrics.update_uptime(app_state.uptime());

    let metric_families = metrics.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, encoder.format_type().to_string())],
                metrics_output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Detailed service statistics endpoint handler (for debugging/human consumption)
async fn stats_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    let cache = app_state.cache().status().await;
    match HealthCheck::check(app_state).await {
        Ok(health) => {
            let stats = json!({
                "service": {
                    "name": health.service,
                    "version": health.version,
                    "status": health.status,
                    "uptime": health.stats.uptime_info
                },
                "requests": {
                    "handled": health.stats.requests_handled,
                    "fallbacks": health.stats.fallbacks
                },
                "cache": cache,
                "components": health.checks,
                "timestamp": current_timestamp()
            });

            (StatusCode::OK, Json(stats))
        }
        Err(e) => {
            error!("Failed to get stats: {}", e);

            let error_response = json!({
                "service": {
                    "version": env!("CARGO_PKG_VERSION"),
                    "status": "error"
                },
                "error": "Failed to get service stats",
                "timestamp": current_timestamp()
            });

            (StatusCode::SERVICE_UNAVAILABLE, Json(error_response))
        }
    }
}
