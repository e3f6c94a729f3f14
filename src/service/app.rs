//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the upstream
//! providers, the queue context cache, the decision engine and the response
//! emitter together, and answers webhook events.

use crate::cache::{Clock, QueueContextCache, SystemClock};
use crate::config::{validate_config, AppConfig};
use crate::decision::{Decision, DecisionConfig, DecisionEngine};
use crate::metrics::MetricsCollector;
use crate::providers::{
    QueueConfigProvider, QueueStatsProvider, SyncConfigProvider, TaskRouterStatsProvider,
};
use crate::twiml::{ResponseEmitter, ResponseSettings, VoiceResponse};
use crate::types::InboundEvent;
use crate::utils::generate_request_id;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, info_span, Instrument};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Production application state
pub struct AppState {
    config: AppConfig,
    engine: DecisionEngine,
    emitter: ResponseEmitter,
    metrics: Arc<MetricsCollector>,
    is_running: Arc<RwLock<bool>>,
    started_at: Instant,
    requests_handled: AtomicU64,
    fallbacks: AtomicU64,
}

impl AppState {
    /// Create the application state with the TaskRouter and Sync providers
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let stats_provider = Arc::new(TaskRouterStatsProvider::new(&config.twilio));
        let config_provider = Arc::new(SyncConfigProvider::new(&config.twilio));

        Self::with_providers(
            config,
            stats_provider,
            config_provider,
            Arc::new(SystemClock),
        )
    }

    /// Create the application state with explicit providers and clock
    pub fn with_providers(
        config: AppConfig,
        stats_provider: Arc<dyn QueueStatsProvider>,
        config_provider: Arc<dyn QueueConfigProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let cache = QueueContextCache::new(stats_provider, config_provider, clock, config.cache_ttl())
            .with_metrics(metrics.clone());
        let engine = DecisionEngine::new(
            Arc::new(cache),
            DecisionConfig::from(&config.gatekeeper),
        );
        let emitter = ResponseEmitter::new(ResponseSettings::from(&config.gatekeeper));

        info!(
            "Gatekeeper initialized: threshold {} min, cache TTL {}s",
            config.gatekeeper.ewt_threshold_minutes, config.gatekeeper.cache_ttl_seconds
        );

        Ok(Self {
            config,
            engine,
            emitter,
            metrics,
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
            requests_handled: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        })
    }

    /// Mark the service as accepting requests
    pub async fn start(&self) {
        *self.is_running.write().await = true;
        info!("✅ Gatekeeper service started");
    }

    /// Mark the service as shutting down
    pub async fn shutdown(&self) {
        *self.is_running.write().await = false;
        info!(
            "Final service statistics: {} requests handled, {} fallbacks",
            self.requests_handled(),
            self.fallbacks()
        );
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn cache(&self) -> Arc<QueueContextCache> {
        self.engine.cache()
    }

    pub fn requests_handled(&self) -> u64 {
        self.requests_handled.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Answer one webhook event; falls back to the default redirect on any error
    pub async fn handle_event(&self, event: &InboundEvent) -> VoiceResponse {
        let request_id = generate_request_id();
        let span = info_span!(
            "gatekeeper",
            %request_id,
            direct_line = event.direct_line,
            task_queue = event.task_queue_name.as_deref().unwrap_or(""),
        );

        async {
            let timer = self.metrics.start_timer();
            self.requests_handled.fetch_add(1, Ordering::Relaxed);

            let decision = match self.engine.decide(event).await {
                Ok(decision) => decision,
                Err(e) => {
                    self.record_fallback(&e);
                    Decision::fallback()
                }
            };

            let response = self.emitter.emit(&decision);
            info!("Responding with {}", decision.label());
            self.metrics.record_request(decision.label(), timer.stop());
            response
        }
        .instrument(span)
        .await
    }

    /// Fail-safe response for a failure outside the decision path
    pub fn fallback_response(&self, error: &anyhow::Error) -> VoiceResponse {
        self.record_fallback(error);
        self.emitter.fallback()
    }

    fn record_fallback(&self, error: &anyhow::Error) {
        error!("Gatekeeper failed, using default redirect: {:#}", error);
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_fallback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::providers::{StaticConfigProvider, StaticStatsProvider};
    use crate::twiml::Verb;
    use crate::types::{QueueConfig, QueueStats};

    fn app_state(stats: QueueStats, config: QueueConfig) -> AppState {
        AppState::with_providers(
            AppConfig::default(),
            Arc::new(StaticStatsProvider::new(stats)),
            Arc::new(StaticConfigProvider::new(config)),
            Arc::new(ManualClock::default()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let state = app_state(QueueStats::new("WQ1", 60.0), QueueConfig::new(true));
        assert!(!state.is_running().await);

        state.start().await;
        assert!(state.is_running().await);

        state.shutdown().await;
        assert!(!state.is_running().await);
    }

    #[tokio::test]
    async fn test_failed_statistics_fall_back() {
        let state = app_state(QueueStats::unsuccessful(), QueueConfig::unsuccessful());
        let event = InboundEvent {
            task_queue_name: Some("Sales".to_string()),
            ewt_enabled: true,
            present_callback: true,
            ..InboundEvent::default()
        };

        let response = state.handle_event(&event).await;

        assert_eq!(
            response.verbs(),
            &[Verb::Redirect {
                url: state.config().gatekeeper.default_redirect_url.clone()
            }]
        );
        assert_eq!(state.requests_handled(), 1);
        assert_eq!(state.fallbacks(), 1);
        assert_eq!(state.metrics().requests().fallbacks_total.get(), 1);
    }

    #[tokio::test]
    async fn test_direct_line_counts_request() {
        let state = app_state(QueueStats::unsuccessful(), QueueConfig::unsuccessful());
        let event = InboundEvent {
            direct_line: true,
            queue_time: Some(1.0),
            ..InboundEvent::default()
        };

        let response = state.handle_event(&event).await;

        assert!(matches!(response.verbs(), [Verb::Play { .. }]));
        assert_eq!(state.fallbacks(), 0);
        assert_eq!(
            state
                .metrics()
                .requests()
                .requests_total
                .with_label_values(&["play_sample"])
                .get(),
            1
        );
    }

    #[test]
    fn test_fallback_response_counts() {
        let state = app_state(QueueStats::unsuccessful(), QueueConfig::unsuccessful());
        let error = anyhow::anyhow!("boom");

        let response = state.fallback_response(&error);
        assert!(matches!(response.verbs(), [Verb::Redirect { .. }]));
        assert_eq!(state.fallbacks(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.service.http_port = 0;

        let result = AppState::with_providers(
            config,
            Arc::new(StaticStatsProvider::new(QueueStats::unsuccessful())),
            Arc::new(StaticConfigProvider::new(QueueConfig::unsuccessful())),
            Arc::new(ManualClock::default()),
        );
        assert!(matches!(result, Err(ServiceError::Configuration { .. })));
    }
}
