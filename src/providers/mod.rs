//! Upstream providers for queue statistics and queue configuration
//!
//! Both providers signal failure through `success: false` in their result
//! instead of returning an error, so callers can always degrade gracefully.

pub mod sync;
pub mod taskrouter;

use crate::types::{QueueConfig, QueueStats};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

pub use sync::SyncConfigProvider;
pub use taskrouter::TaskRouterStatsProvider;

/// Source of cumulative task queue statistics
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueueStatsProvider: Send + Sync {
    /// Fetch statistics for the queue with the given friendly name
    async fn fetch_queue_stats(&self, task_queue_name: &str) -> QueueStats;
}

/// Source of per-queue configuration
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueueConfigProvider: Send + Sync {
    /// Fetch configuration for the queue with the given SID
    async fn fetch_queue_config(&self, task_queue_sid: &str) -> QueueConfig;
}

/// Stats provider returning a fixed result, for tests and local runs
#[derive(Debug)]
pub struct StaticStatsProvider {
    stats: Mutex<QueueStats>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StaticStatsProvider {
    pub fn new(stats: QueueStats) -> Self {
        Self {
            stats: Mutex::new(stats),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Replace the result returned by subsequent fetches
    pub fn set_stats(&self, stats: QueueStats) {
        if let Ok(mut current) = self.stats.lock() {
            *current = stats;
        }
    }

    /// Number of fetches performed so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queue names requested, in order
    pub fn requested_names(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueueStatsProvider for StaticStatsProvider {
    async fn fetch_queue_stats(&self, task_queue_name: &str) -> QueueStats {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut names) = self.requested.lock() {
            names.push(task_queue_name.to_string());
        }
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_else(|_| QueueStats::unsuccessful())
    }
}

/// Config provider returning a fixed result, for tests and local runs
#[derive(Debug)]
pub struct StaticConfigProvider {
    config: Mutex<QueueConfig>,
    calls: AtomicUsize,
}

impl StaticConfigProvider {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config: Mutex::new(config),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_config(&self, config: QueueConfig) {
        if let Ok(mut current) = self.config.lock() {
            *current = config;
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueConfigProvider for StaticConfigProvider {
    async fn fetch_queue_config(&self, _task_queue_sid: &str) -> QueueConfig {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.config
            .lock()
            .map(|config| config.clone())
            .unwrap_or_else(|_| QueueConfig::unsuccessful())
    }
}
