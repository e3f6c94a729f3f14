//! Time-windowed cache of queue statistics and configuration
//!
//! Holds the statistics and configuration of the most recently requested task
//! queue. Both are always fetched and replaced together, so a reader never sees
//! fresh statistics next to stale configuration.

use crate::cache::clock::Clock;
use crate::metrics::MetricsCollector;
use crate::providers::{QueueConfigProvider, QueueStatsProvider};
use crate::types::{QueueConfig, QueueContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Why a lookup went to the upstream providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Empty,
    StatsUnsuccessful,
    ConfigUnsuccessful,
    QueueNameMissing,
    QueueChanged,
    Expired,
}

/// Result of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Refreshed(RefreshReason),
}

impl CacheOutcome {
    /// Metric label for this outcome
    pub fn label(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Refreshed(RefreshReason::Empty) => "refresh_empty",
            CacheOutcome::Refreshed(RefreshReason::StatsUnsuccessful) => "refresh_stats_failed",
            CacheOutcome::Refreshed(RefreshReason::ConfigUnsuccessful) => "refresh_config_failed",
            CacheOutcome::Refreshed(RefreshReason::QueueNameMissing) => "refresh_no_queue_name",
            CacheOutcome::Refreshed(RefreshReason::QueueChanged) => "refresh_queue_changed",
            CacheOutcome::Refreshed(RefreshReason::Expired) => "refresh_expired",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedQueueContext {
    task_queue_name: Option<String>,
    context: Arc<QueueContext>,
    cached_at: DateTime<Utc>,
}

/// Read-only view of the cache for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub task_queue_name: Option<String>,
    pub cached_at: DateTime<Utc>,
    pub age_seconds: i64,
    pub stats_success: bool,
    pub config_success: bool,
}

/// Cache of the last fetched [`QueueContext`]
pub struct QueueContextCache {
    stats_provider: Arc<dyn QueueStatsProvider>,
    config_provider: Arc<dyn QueueConfigProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: RwLock<Option<CachedQueueContext>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl QueueContextCache {
    /// Create an empty cache
    pub fn new(
        stats_provider: Arc<dyn QueueStatsProvider>,
        config_provider: Arc<dyn QueueConfigProvider>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            stats_provider,
            config_provider,
            clock,
            ttl,
            state: RwLock::new(None),
            metrics: None,
        }
    }

    /// Record lookups and upstream failures in the given collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Statistics and configuration for a queue, fetched if the cache is stale
    pub async fn get_queue_context(&self, task_queue_name: Option<&str>) -> Arc<QueueContext> {
        self.lookup(task_queue_name).await.0
    }

    /// Like [`get_queue_context`](Self::get_queue_context), also reporting whether it refreshed
    pub async fn lookup(&self, task_queue_name: Option<&str>) -> (Arc<QueueContext>, CacheOutcome) {
        let now = self.clock.now();

        // The lock is never held across the upstream fetches; concurrent stale
        // lookups may both refresh and the last write wins.
        let reason = {
            let state = self.state.read().await;
            match state.as_ref() {
                None => RefreshReason::Empty,
                Some(cached) => match self.staleness(cached, task_queue_name, now) {
                    Some(reason) => reason,
                    None => {
                        debug!("Queue context cache hit for {:?}", task_queue_name);
                        self.record_outcome(CacheOutcome::Hit);
                        return (Arc::clone(&cached.context), CacheOutcome::Hit);
                    }
                },
            }
        };

        debug!(
            "Refreshing queue context for {:?} ({:?})",
            task_queue_name, reason
        );

        let context = Arc::new(self.fetch(task_queue_name).await);
        let entry = CachedQueueContext {
            task_queue_name: task_queue_name.map(str::to_string),
            context: Arc::clone(&context),
            cached_at: self.clock.now(),
        };
        *self.state.write().await = Some(entry);

        let outcome = CacheOutcome::Refreshed(reason);
        self.record_outcome(outcome);
        (context, outcome)
    }

    /// Snapshot of the cached entry, if any
    pub async fn status(&self) -> Option<CacheStatus> {
        let now = self.clock.now();
        let state = self.state.read().await;
        state.as_ref().map(|cached| CacheStatus {
            task_queue_name: cached.task_queue_name.clone(),
            cached_at: cached.cached_at,
            age_seconds: now.signed_duration_since(cached.cached_at).num_seconds(),
            stats_success: cached.context.stats.success,
            config_success: cached.context.config.success,
        })
    }

    fn staleness(
        &self,
        cached: &CachedQueueContext,
        task_queue_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<RefreshReason> {
        if !cached.context.stats.success {
            return Some(RefreshReason::StatsUnsuccessful);
        }
        if !cached.context.config.success {
            return Some(RefreshReason::ConfigUnsuccessful);
        }
        let Some(cached_name) = cached.task_queue_name.as_deref() else {
            return Some(RefreshReason::QueueNameMissing);
        };
        if task_queue_name != Some(cached_name) {
            return Some(RefreshReason::QueueChanged);
        }

        // A clock that went backwards never expires the entry
        let expired = now
            .signed_duration_since(cached.cached_at)
            .to_std()
            .map(|elapsed| elapsed > self.ttl)
            .unwrap_or(false);
        expired.then_some(RefreshReason::Expired)
    }

    async fn fetch(&self, task_queue_name: Option<&str>) -> QueueContext {
        let stats = self
            .stats_provider
            .fetch_queue_stats(task_queue_name.unwrap_or_default())
            .await;

        if !stats.success {
            self.record_upstream_failure("taskrouter");
        }

        let config = match stats.task_queue_sid() {
            Some(task_queue_sid) => {
                let config = self.config_provider.fetch_queue_config(task_queue_sid).await;
                if !config.success {
                    self.record_upstream_failure("sync");
                }
                config
            }
            None => QueueConfig::unsuccessful(),
        };

        QueueContext { stats, config }
    }

    fn record_upstream_failure(&self, upstream: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_upstream_failure(upstream);
        }
    }

    fn record_outcome(&self, outcome: CacheOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_queue_context_lookup(outcome.label());
        }
    }
}
