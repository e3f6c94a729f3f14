//! Estimated wait time (EWT) handling
//!
//! This module converts queue statistics into the wait time announced to
//! callers and compared against the callback threshold.

pub mod formatter;

// Re-export commonly used types
pub use formatter::{format_wait, WaitEstimate};
