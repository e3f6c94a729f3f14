//! Error types for the gatekeeper service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific gatekeeper scenarios
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Upstream request to {upstream} failed: {message}")]
    UpstreamRequestFailed { upstream: String, message: String },

    #[error("Wait time unavailable for task queue: {task_queue}")]
    WaitTimeUnavailable { task_queue: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
