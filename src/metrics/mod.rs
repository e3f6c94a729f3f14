//! Metrics and monitoring for the gatekeeper service
//!
//! This module provides Prometheus metrics for webhook decisions, the queue
//! context cache and upstream failures.

pub mod collector;

pub use collector::{CacheMetrics, MetricsCollector, MetricsTimer, RequestMetrics, ServiceMetrics};
