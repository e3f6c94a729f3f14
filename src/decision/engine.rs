//! Gatekeeper decision logic
//!
//! Chooses between the sample audio, the busy message, the callback offer and
//! the default hold flow for one inbound call.

use crate::cache::QueueContextCache;
use crate::config::GatekeeperSettings;
use crate::error::{GatekeeperError, Result};
use crate::types::{InboundEvent, QueueContext};
use crate::wait_time::format_wait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Response action chosen for an inbound call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Decision {
    /// Play the short sample audio (direct line, short queue time)
    PlaySample,
    /// Tell the caller agents are busy and hang up (direct line, long queue time)
    AnnounceBusy,
    /// Optionally announce the wait, then offer callback or voicemail
    AnnounceWaitThenCallbackRedirect {
        announcement: Option<String>,
        queue_sid: String,
        call_sid: String,
    },
    /// Optionally announce the wait, then continue to the default hold flow
    AnnounceWaitThenDefaultRedirect { announcement: Option<String> },
    /// Default hold flow; also the fail-safe response
    DefaultRedirectOnly { announcement: Option<String> },
}

impl Decision {
    /// Response used whenever the routed path fails
    pub fn fallback() -> Self {
        Decision::DefaultRedirectOnly { announcement: None }
    }

    /// Spoken wait message, if any
    pub fn announcement(&self) -> Option<&str> {
        match self {
            Decision::PlaySample | Decision::AnnounceBusy => None,
            Decision::AnnounceWaitThenCallbackRedirect { announcement, .. }
            | Decision::AnnounceWaitThenDefaultRedirect { announcement }
            | Decision::DefaultRedirectOnly { announcement } => announcement.as_deref(),
        }
    }

    /// Metric label for this decision
    pub fn label(&self) -> &'static str {
        match self {
            Decision::PlaySample => "play_sample",
            Decision::AnnounceBusy => "announce_busy",
            Decision::AnnounceWaitThenCallbackRedirect { .. } => "callback_redirect",
            Decision::AnnounceWaitThenDefaultRedirect { .. } => "default_redirect",
            Decision::DefaultRedirectOnly { .. } => "default_redirect_only",
        }
    }
}

/// Thresholds the engine compares against
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionConfig {
    /// Callback is offered only when the EWT in minutes is above this
    pub ewt_threshold_minutes: i64,
    /// Direct-line callers queued for less than this many seconds hear the sample
    pub direct_line_queue_time_limit_seconds: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self::from(&GatekeeperSettings::default())
    }
}

impl From<&GatekeeperSettings> for DecisionConfig {
    fn from(settings: &GatekeeperSettings) -> Self {
        Self {
            ewt_threshold_minutes: settings.ewt_threshold_minutes,
            direct_line_queue_time_limit_seconds: settings.direct_line_queue_time_limit_seconds,
        }
    }
}

/// Decide the response for a direct-line call; never consults queue statistics
pub fn decide_direct_line(event: &InboundEvent, queue_time_limit_seconds: f64) -> Decision {
    info!(
        "Direct line call from {} with queue time {:?}",
        event.caller.as_deref().unwrap_or("unknown"),
        event.queue_time
    );

    match event.queue_time {
        Some(queue_time) if queue_time < queue_time_limit_seconds => Decision::PlaySample,
        _ => Decision::AnnounceBusy,
    }
}

/// Decide the response for a queue-routed call from already resolved queue data
pub fn decide_routed(
    event: &InboundEvent,
    context: &QueueContext,
    ewt_threshold_minutes: i64,
) -> Result<Decision> {
    let avg_wait = context.stats.average_wait_seconds().ok_or_else(|| {
        GatekeeperError::WaitTimeUnavailable {
            task_queue: event
                .task_queue_name
                .clone()
                .unwrap_or_else(|| "<none>".to_string()),
        }
    })?;

    let estimate = format_wait(avg_wait);
    let ewt = estimate.ewt_minutes();
    // A failed statistics fetch never offers a callback, even with a usable average
    let callback_enabled_on_queue = context.stats.success && context.config.callback_enabled();
    let announcement = event.ewt_enabled.then(|| estimate.wait_message());

    debug!(
        "Routed call: ewt={}min callback_enabled={} present_callback={} threshold={}",
        ewt, callback_enabled_on_queue, event.present_callback, ewt_threshold_minutes
    );

    let decision = if callback_enabled_on_queue && event.present_callback {
        if ewt > ewt_threshold_minutes {
            Decision::AnnounceWaitThenCallbackRedirect {
                announcement,
                queue_sid: event.queue_sid.clone().unwrap_or_default(),
                call_sid: event.call_sid.clone().unwrap_or_default(),
            }
        } else {
            Decision::AnnounceWaitThenDefaultRedirect { announcement }
        }
    } else {
        Decision::DefaultRedirectOnly { announcement }
    };

    Ok(decision)
}

/// Resolves queue data through the cache and applies the decision rules
pub struct DecisionEngine {
    cache: Arc<QueueContextCache>,
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(cache: Arc<QueueContextCache>, config: DecisionConfig) -> Self {
        Self { cache, config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn cache(&self) -> Arc<QueueContextCache> {
        Arc::clone(&self.cache)
    }

    /// Decide the response for an inbound call
    pub async fn decide(&self, event: &InboundEvent) -> Result<Decision> {
        if event.direct_line {
            return Ok(decide_direct_line(
                event,
                self.config.direct_line_queue_time_limit_seconds,
            ));
        }

        let context = self
            .cache
            .get_queue_context(event.task_queue_name.as_deref())
            .await;

        decide_routed(event, &context, self.config.ewt_threshold_minutes)
    }
}
