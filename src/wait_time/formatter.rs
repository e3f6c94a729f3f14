//! Estimated wait time formatting
//!
//! Turns the TaskRouter average wait (seconds) into the whole minutes used for
//! the callback threshold and the phrase spoken to the caller.

use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Estimated wait derived from an average wait duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEstimate {
    /// Clock-face hours; wraps every 24 hours
    pub hours: u32,
    /// Clock-face minutes within the hour
    pub minutes: u32,
    /// Clock-face seconds within the minute
    pub seconds: u32,
    /// Floored total minutes, compared against the callback threshold
    pub total_minutes: i64,
    /// Human readable wait, e.g. "1 hour 5 minutes"
    pub phrase: String,
}

impl WaitEstimate {
    /// EWT in whole minutes as used by the callback threshold
    pub fn ewt_minutes(&self) -> i64 {
        self.total_minutes
    }

    /// Sentence spoken to the caller
    pub fn wait_message(&self) -> String {
        format!("The estimated wait time is {}....", self.phrase)
    }
}

/// Format an average wait given in seconds
///
/// Non-finite input is treated as zero seconds.
pub fn format_wait(avg_seconds: f64) -> WaitEstimate {
    let whole_seconds = if avg_seconds.is_finite() {
        avg_seconds.floor() as i64
    } else {
        0
    };
    let total_minutes = whole_seconds.div_euclid(SECONDS_PER_MINUTE);

    let second_of_day = whole_seconds.rem_euclid(SECONDS_PER_DAY);
    let hours = (second_of_day / SECONDS_PER_HOUR) as u32;
    let minutes = ((second_of_day % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u32;
    let seconds = (second_of_day % SECONDS_PER_MINUTE) as u32;

    let minute_label = if minutes == 1 { "minute" } else { "minutes" };
    let phrase = if whole_seconds < SECONDS_PER_MINUTE {
        "less than a minute".to_string()
    } else if total_minutes < 60 {
        format!("{} {}", total_minutes, minute_label)
    } else {
        let hour_label = if hours < 2 { "hour" } else { "hours" };
        format!("{} {} {} {}", hours, hour_label, minutes, minute_label)
    };

    WaitEstimate {
        hours,
        minutes,
        seconds,
        total_minutes,
        phrase,
    }
}
