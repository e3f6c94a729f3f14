//! Main application configuration
//!
//! This module defines the primary configuration structures for the gatekeeper
//! webhook, including environment variable loading, TOML files and validation.

use crate::error::GatekeeperError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub twilio: TwilioSettings,
    pub gatekeeper: GatekeeperSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Host the HTTP server binds to
    pub http_host: String,
    /// Port for the webhook, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Credentials and endpoints for the TaskRouter and Sync APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    /// TaskRouter workspace holding the task queues
    pub workspace_sid: String,
    /// Sync service holding the per-queue configuration documents
    pub sync_service_sid: String,
    pub taskrouter_base_url: String,
    pub sync_base_url: String,
    /// Prefix prepended to the task queue SID to form the Sync document name
    pub queue_config_document_prefix: String,
}

/// Gatekeeper decision settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperSettings {
    /// Callback is offered when the EWT (minutes) is above this value
    pub ewt_threshold_minutes: i64,
    /// How long fetched queue statistics are reused
    pub cache_ttl_seconds: u64,
    /// Direct-line callers queued for less than this hear the sample audio
    pub direct_line_queue_time_limit_seconds: f64,
    pub sample_audio_url: String,
    /// Default queue-hold flow
    pub default_redirect_url: String,
    /// Domain serving the callback and voicemail wait experience
    pub callback_domain: String,
    /// Voice used for the wait time announcement
    pub say_voice: String,
    pub busy_message: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "gatekeeper".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for TwilioSettings {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            workspace_sid: String::new(),
            sync_service_sid: String::new(),
            taskrouter_base_url: "https://taskrouter.twilio.com".to_string(),
            sync_base_url: "https://sync.twilio.com".to_string(),
            queue_config_document_prefix: String::new(),
        }
    }
}

impl Default for GatekeeperSettings {
    fn default() -> Self {
        Self {
            ewt_threshold_minutes: 5,
            cache_ttl_seconds: 60, // 1 minute
            direct_line_queue_time_limit_seconds: 30.0,
            sample_audio_url: "https://example.com/assets/sample-12s.mp3".to_string(),
            default_redirect_url: "https://example.com/twiml/default-queue".to_string(),
            callback_domain: "localhost:8080".to_string(),
            say_voice: "Polly.Joanna".to_string(),
            busy_message: "Our agents are busy right now. Please try after sometime".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = parse_env_value("HTTP_PORT", &port)?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds =
                parse_env_value("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Twilio settings
        if let Ok(sid) = env::var("TWILIO_ACCOUNT_SID").or_else(|_| env::var("ACCOUNT_SID")) {
            self.twilio.account_sid = sid;
        }
        if let Ok(token) = env::var("TWILIO_AUTH_TOKEN").or_else(|_| env::var("AUTH_TOKEN")) {
            self.twilio.auth_token = token;
        }
        if let Ok(workspace) = env::var("TWILIO_WORKSPACE_SID") {
            self.twilio.workspace_sid = workspace;
        }
        if let Ok(service) = env::var("TWILIO_SYNC_SERVICE_SID") {
            self.twilio.sync_service_sid = service;
        }
        if let Ok(url) = env::var("TASKROUTER_BASE_URL") {
            self.twilio.taskrouter_base_url = url;
        }
        if let Ok(url) = env::var("SYNC_BASE_URL") {
            self.twilio.sync_base_url = url;
        }
        if let Ok(prefix) = env::var("QUEUE_CONFIG_DOCUMENT_PREFIX") {
            self.twilio.queue_config_document_prefix = prefix;
        }

        // Gatekeeper settings
        if let Ok(threshold) = env::var("EWT_THRESHOLD_FOR_PRESENTING_CALLBACK") {
            self.gatekeeper.ewt_threshold_minutes =
                parse_env_value("EWT_THRESHOLD_FOR_PRESENTING_CALLBACK", &threshold)?;
        }
        if let Ok(ttl) = env::var("CACHE_TTL_SECONDS") {
            self.gatekeeper.cache_ttl_seconds = parse_env_value("CACHE_TTL_SECONDS", &ttl)?;
        }
        if let Ok(limit) = env::var("DIRECT_LINE_QUEUE_TIME_LIMIT_SECONDS") {
            self.gatekeeper.direct_line_queue_time_limit_seconds =
                parse_env_value("DIRECT_LINE_QUEUE_TIME_LIMIT_SECONDS", &limit)?;
        }
        if let Ok(url) = env::var("SAMPLE_AUDIO_URL") {
            self.gatekeeper.sample_audio_url = url;
        }
        if let Ok(url) = env::var("DEFAULT_REDIRECT_URL") {
            self.gatekeeper.default_redirect_url = url;
        }
        if let Ok(domain) = env::var("DOMAIN_NAME") {
            self.gatekeeper.callback_domain = domain;
        }
        if let Ok(voice) = env::var("SAY_VOICE") {
            self.gatekeeper.say_voice = voice;
        }
        if let Ok(message) = env::var("BUSY_MESSAGE") {
            self.gatekeeper.busy_message = message;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the queue statistics cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.gatekeeper.cache_ttl_seconds)
    }
}

fn parse_env_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        GatekeeperError::ConfigurationError {
            message: format!("Invalid {} value: {}", name, raw),
        }
        .into()
    })
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports and timeouts
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.gatekeeper.cache_ttl_seconds == 0 {
        return Err(anyhow!("Cache TTL must be greater than 0"));
    }
    if !config.gatekeeper.direct_line_queue_time_limit_seconds.is_finite() {
        return Err(anyhow!("Direct line queue time limit must be a finite number"));
    }

    // Validate endpoints
    for (name, url) in [
        ("TaskRouter base URL", &config.twilio.taskrouter_base_url),
        ("Sync base URL", &config.twilio.sync_base_url),
        ("Sample audio URL", &config.gatekeeper.sample_audio_url),
        ("Default redirect URL", &config.gatekeeper.default_redirect_url),
    ] {
        if url.is_empty() {
            return Err(anyhow!("{} cannot be empty", name));
        }
        reqwest::Url::parse(url).map_err(|e| anyhow!("Invalid {} '{}': {}", name, url, e))?;
    }
    if config.gatekeeper.callback_domain.is_empty() {
        return Err(anyhow!("Callback domain cannot be empty"));
    }
    reqwest::Url::parse(&format!("https://{}/", config.gatekeeper.callback_domain)).map_err(
        |e| {
            anyhow!(
                "Invalid callback domain '{}': {}",
                config.gatekeeper.callback_domain,
                e
            )
        },
    )?;

    Ok(())
}
