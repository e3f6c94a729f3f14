//! Common types used throughout the gatekeeper service

use crate::utils::{json_flag, parse_queue_time};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a TaskRouter task queue (`WQ...`)
pub type TaskQueueSid = String;

/// Average wait duration reported by TaskRouter, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitDuration {
    pub avg: f64,
}

/// Cumulative statistics for one task queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeStats {
    pub task_queue_sid: TaskQueueSid,
    pub wait_duration_until_accepted: WaitDuration,
}

/// Result of the statistics fetch
///
/// Failures are signalled with `success: false` rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub success: bool,
    pub cumulative_stats: Option<CumulativeStats>,
}

impl QueueStats {
    /// Successful statistics for a queue
    pub fn new(task_queue_sid: impl Into<TaskQueueSid>, avg_wait_seconds: f64) -> Self {
        Self {
            success: true,
            cumulative_stats: Some(CumulativeStats {
                task_queue_sid: task_queue_sid.into(),
                wait_duration_until_accepted: WaitDuration {
                    avg: avg_wait_seconds,
                },
            }),
        }
    }

    /// Statistics fetch that did not succeed
    pub fn unsuccessful() -> Self {
        Self {
            success: false,
            cumulative_stats: None,
        }
    }

    pub fn task_queue_sid(&self) -> Option<&str> {
        self.cumulative_stats
            .as_ref()
            .map(|stats| stats.task_queue_sid.as_str())
    }

    pub fn average_wait_seconds(&self) -> Option<f64> {
        self.cumulative_stats
            .as_ref()
            .map(|stats| stats.wait_duration_until_accepted.avg)
    }
}

/// Per-queue settings stored in the Sync configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQueueConfig {
    #[serde(default)]
    pub callback_enabled: bool,
}

/// Result of the configuration fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    pub success: bool,
    pub task_queue_config: Option<TaskQueueConfig>,
}

impl QueueConfig {
    pub fn new(callback_enabled: bool) -> Self {
        Self {
            success: true,
            task_queue_config: Some(TaskQueueConfig { callback_enabled }),
        }
    }

    pub fn unsuccessful() -> Self {
        Self {
            success: false,
            task_queue_config: None,
        }
    }

    /// Whether the queue offers callbacks; false whenever the fetch failed
    pub fn callback_enabled(&self) -> bool {
        self.success
            && self
                .task_queue_config
                .as_ref()
                .is_some_and(|config| config.callback_enabled)
    }
}

/// Statistics and configuration fetched together for one queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueContext {
    pub stats: QueueStats,
    pub config: QueueConfig,
}

/// Inbound webhook event, parsed from the raw Twilio parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundEvent {
    pub task_queue_name: Option<String>,
    /// Pre-routed direct call, bypasses queue statistics
    pub direct_line: bool,
    /// Seconds the caller has already spent in queue
    pub queue_time: Option<f64>,
    pub caller: Option<String>,
    pub ewt_enabled: bool,
    /// Callback may be offered (inside operating hours)
    pub present_callback: bool,
    pub queue_sid: Option<String>,
    pub call_sid: Option<String>,
}

impl InboundEvent {
    /// Build an event from webhook parameters
    ///
    /// JSON-encoded flags that are absent or malformed are treated as `false`.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let text = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        let flag = |key: &str| params.get(key).map(|v| json_flag(v)).unwrap_or(false);

        Self {
            task_queue_name: text("taskQueueName"),
            direct_line: flag("directLine"),
            queue_time: params.get("QueueTime").and_then(|v| parse_queue_time(v)),
            caller: text("Caller"),
            ewt_enabled: flag("ewtEnabled"),
            present_callback: flag("presentCallback"),
            queue_sid: text("QueueSid"),
            call_sid: text("CallSid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_event_from_full_params() {
        let event = InboundEvent::from_params(&params(&[
            ("taskQueueName", "Sales"),
            ("ewtEnabled", "true"),
            ("presentCallback", "true"),
            ("QueueSid", "QU123"),
            ("CallSid", "CA456"),
            ("Caller", "+15550100"),
        ]));

        assert_eq!(event.task_queue_name.as_deref(), Some("Sales"));
        assert!(!event.direct_line);
        assert!(event.ewt_enabled);
        assert!(event.present_callback);
        assert_eq!(event.queue_sid.as_deref(), Some("QU123"));
        assert_eq!(event.call_sid.as_deref(), Some("CA456"));
        assert_eq!(event.caller.as_deref(), Some("+15550100"));
    }

    #[test]
    fn test_event_defaults_when_absent_or_malformed() {
        let event = InboundEvent::from_params(&params(&[
            ("directLine", "{not json"),
            ("ewtEnabled", "false"),
            ("taskQueueName", ""),
        ]));

        assert!(!event.direct_line);
        assert!(!event.ewt_enabled);
        assert!(!event.present_callback);
        assert!(event.task_queue_name.is_none());
        assert!(event.queue_time.is_none());
    }

    #[test]
    fn test_direct_line_object_is_truthy() {
        let event = InboundEvent::from_params(&params(&[
            ("directLine", r#"{"queue":"vip"}"#),
            ("QueueTime", "12"),
        ]));

        assert!(event.direct_line);
        assert_eq!(event.queue_time, Some(12.0));
    }

    #[test]
    fn test_callback_enabled_requires_success() {
        assert!(QueueConfig::new(true).callback_enabled());
        assert!(!QueueConfig::new(false).callback_enabled());

        let failed = QueueConfig {
            success: false,
            task_queue_config: Some(TaskQueueConfig {
                callback_enabled: true,
            }),
        };
        assert!(!failed.callback_enabled());
    }

    #[test]
    fn test_queue_stats_serde_shape() {
        let stats: QueueStats = serde_json::from_str(
            r#"{"success":true,"cumulativeStats":{"taskQueueSid":"WQ1","waitDurationUntilAccepted":{"avg":90}}}"#,
        )
        .unwrap();

        assert_eq!(stats.task_queue_sid(), Some("WQ1"));
        assert_eq!(stats.average_wait_seconds(), Some(90.0));
    }
}
