//! Common utilities and helpers

use std::time::Duration;

pub mod logging;
pub mod path;

/// Utility functions for BoxTrim
pub struct Utils;

impl Utils {
    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let milliseconds = duration.subsec_millis();

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }

    /// Playback time of a frame index at `fps`
    pub fn frame_time(frame_index: u64, fps: f64) -> Duration {
        if fps > 0.0 && fps.is_finite() {
            Duration::from_secs_f64(frame_index as f64 / fps)
        } else {
            Duration::ZERO
        }
    }

    /// Calculate progress percentage
    pub fn calculate_progress(current: u64, total: u64) -> f32 {
        if total == 0 {
            0.0
        } else {
            (current as f32 / total as f32) * 100.0
        }
    }
}
