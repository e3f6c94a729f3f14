//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the gatekeeper webhook using
//! Prometheus metrics.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the gatekeeper service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Webhook request metrics
    request_metrics: RequestMetrics,

    /// Queue context cache and upstream metrics
    cache_metrics: CacheMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Webhook request metrics
#[derive(Clone)]
pub struct RequestMetrics {
    /// Responses produced, by decision
    pub requests_total: IntCounterVec,

    /// Requests that fell back to the default redirect after an error
    pub fallbacks_total: IntCounter,

    /// End-to-end handling time
    pub request_duration: Histogram,
}

/// Queue context cache metrics
#[derive(Clone)]
pub struct CacheMetrics {
    /// Cache lookups by outcome (hit or refresh reason)
    pub lookups_total: IntCounterVec,

    /// Unsuccessful upstream fetches by upstream
    pub upstream_failures_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let request_metrics = RequestMetrics::new(&registry)?;
        let cache_metrics = CacheMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            request_metrics,
            cache_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn requests(&self) -> &RequestMetrics {
        &self.request_metrics
    }

    pub fn cache(&self) -> &CacheMetrics {
        &self.cache_metrics
    }

    /// Record a handled webhook request
    pub fn record_request(&self, decision: &str, duration: Duration) {
        self.request_metrics
            .requests_total
            .with_label_values(&[decision])
            .inc();

        self.request_metrics
            .request_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a request that fell back to the default redirect
    pub fn record_fallback(&self) {
        self.request_metrics.fallbacks_total.inc();
    }

    /// Record a queue context cache lookup
    pub fn record_queue_context_lookup(&self, outcome: &str) {
        self.cache_metrics
            .lookups_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record an unsuccessful upstream fetch
    pub fn record_upstream_failure(&self, upstream: &str) {
        self.cache_metrics
            .upstream_failures_total
            .with_label_values(&[upstream])
            .inc();
    }

    /// Update service uptime
    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("gatekeeper_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "gatekeeper_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("gatekeeper_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl RequestMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "gatekeeper_requests_total",
                "Webhook responses produced, by decision",
            ),
            &["decision"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let fallbacks_total = IntCounter::new(
            "gatekeeper_fallbacks_total",
            "Requests answered with the fail-safe default redirect",
        )?;
        registry.register(Box::new(fallbacks_total.clone()))?;

        let request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "gatekeeper_request_duration_seconds",
                "Webhook handling duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            requests_total,
            fallbacks_total,
            request_duration,
        })
    }
}

impl CacheMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let lookups_total = IntCounterVec::new(
            Opts::new(
                "gatekeeper_queue_context_lookups_total",
                "Queue context cache lookups by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(lookups_total.clone()))?;

        let upstream_failures_total = IntCounterVec::new(
            Opts::new(
                "gatekeeper_upstream_failures_total",
                "Unsuccessful upstream fetches",
            ),
            &["upstream"],
        )?;
        registry.register(Box::new(upstream_failures_total.clone()))?;

        Ok(Self {
            lookups_total,
            upstream_failures_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _requests = collector.requests();
        let _cache = collector.cache();
    }

    #[test]
    fn test_request_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_request("play_sample", Duration::from_millis(3));
        collector.record_request("play_sample", Duration::from_millis(5));
        collector.record_fallback();

        assert_eq!(
            collector
                .requests()
                .requests_total
                .with_label_values(&["play_sample"])
                .get(),
            2
        );
        assert_eq!(collector.requests().fallbacks_total.get(), 1);
        assert_eq!(collector.requests().request_duration.get_sample_count(), 2);
    }

    #[test]
    fn test_cache_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_queue_context_lookup("hit");
        collector.record_upstream_failure("sync");

        assert_eq!(
            collector.cache().lookups_total.with_label_values(&["hit"]).get(),
            1
        );
        assert_eq!(
            collector
                .cache()
                .upstream_failures_total
                .with_label_values(&["sync"])
                .get(),
            1
        );
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2); // Healthy
        collector.update_component_health("queue_context_cache", true);
        collector.update_uptime(Duration::from_secs(42));

        assert_eq!(collector.service().health_status.get(), 2);
        assert_eq!(collector.service().uptime_seconds.get(), 42);
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
