//! Focus timer mirrored from the desk device.

use serde::{Deserialize, Serialize};

/// Last timer state reported by (or commanded to) the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub elapsed_seconds: u64,
    /// Display form of `elapsed_seconds`; filled in when the device omits it
    #[serde(default)]
    pub formatted_time: String,
}

impl Default for TimerState {
    fn default() -> Self {
        Self { running: false, elapsed_seconds: 0, formatted_time: format_duration(0) }
    }
}

/// `MM:SS`, or `HH:MM:SS` once an hour has passed.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}
