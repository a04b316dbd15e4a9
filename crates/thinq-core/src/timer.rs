//! Focus timer state shared between the device and the companion app.

use parking_lot::Mutex;
use thinq_types::{models::format_duration, TimerState};

/// In-process copy of the device timer. Not persisted across restarts.
#[derive(Default)]
pub struct DeviceTimer {
    state: Mutex<TimerState>,
}

impl DeviceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> TimerState {
        self.state.lock().clone()
    }

    /// Replace the state with a device report.
    pub fn update(&self, mut reported: TimerState) -> TimerState {
        if reported.formatted_time.is_empty() {
            reported.formatted_time = format_duration(reported.elapsed_seconds);
        }
        tracing::debug!(
            "⏱️ Timer update: running={} elapsed={}",
            reported.running,
            reported.formatted_time
        );
        *self.state.lock() = reported.clone();
        reported
    }

    pub fn start(&self) -> TimerState {
        let mut state = self.state.lock();
        state.running = true;
        tracing::info!("⏱️ Timer started at {}", state.formatted_time);
        state.clone()
    }

    pub fn stop(&self) -> TimerState {
        let mut state = self.state.lock();
        state.running = false;
        tracing::info!("⏱️ Timer stopped at {}", state.formatted_time);
        state.clone()
    }

    pub fn reset(&self) -> TimerState {
        let mut state = self.state.lock();
        *state = TimerState::default();
        tracing::info!("⏱️ Timer reset");
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_fills_missing_display_time() {
        let timer = DeviceTimer::new();
        let state = timer.update(TimerState {
            running: true,
            elapsed_seconds: 3725,
            formatted_time: String::new(),
        });
        assert_eq!(state.formatted_time, "01:02:05");
        assert_eq!(timer.get(), state);
    }

    #[test]
    fn test_update_keeps_device_display_time() {
        let timer = DeviceTimer::new();
        timer.update(TimerState {
            running: false,
            elapsed_seconds: 10,
            formatted_time: "0:10".to_string(),
        });
        assert_eq!(timer.get().formatted_time, "0:10");
    }

    #[test]
    fn test_stop_keeps_elapsed_and_reset_clears_it() {
        let timer = DeviceTimer::new();
        timer.update(TimerState { running: false, elapsed_seconds: 90, formatted_time: String::new() });

        assert!(timer.start().running);
        let stopped = timer.stop();
        assert!(!stopped.running);
        assert_eq!(stopped.elapsed_seconds, 90);

        assert_eq!(timer.reset(), TimerState::default());
        assert_eq!(timer.get().formatted_time, "00:00");
    }
}
