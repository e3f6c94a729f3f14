//! Service layer for the gatekeeper webhook
//!
//! This module contains the main application state, the HTTP server with the
//! webhook and operational endpoints, and health reporting.

pub mod app;
pub mod health;
pub mod http;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use http::{HttpServer, HttpServerConfig, WEBHOOK_PATH};
