//! Queue statistics caching
//!
//! Queue statistics and configuration are fetched from TaskRouter and Sync at
//! most once per TTL window for the current queue.

pub mod clock;
pub mod queue_context;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use queue_context::{CacheOutcome, CacheStatus, QueueContextCache, RefreshReason};
