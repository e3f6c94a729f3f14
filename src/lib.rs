//! Gatekeeper - IVR webhook for estimated wait times and callback offers
//!
//! This crate answers inbound call webhooks with TwiML. Direct-line callers
//! hear a sample or a busy message; queue-routed callers hear the estimated
//! wait time and are offered a callback when the wait is long enough.

pub mod cache;
pub mod config;
pub mod decision;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod service;
pub mod twiml;
pub mod types;
pub mod utils;
pub mod wait_time;

// Re-export commonly used types and traits
pub use error::{GatekeeperError, Result};
pub use types::*;

// Re-export key components
pub use cache::{Clock, QueueContextCache, SystemClock};
pub use decision::{Decision, DecisionEngine};
pub use providers::{QueueConfigProvider, QueueStatsProvider};
pub use twiml::{ResponseEmitter, VoiceResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
