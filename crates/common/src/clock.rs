//! Wall-clock and frame-timing helpers.
//!
//! Timeline positions are `f64` seconds. The encoder works in whole frames
//! at a fixed rate, so conversions between the two live here.

/// Seconds since the Unix epoch, as written into job markers.
pub fn unix_timestamp_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Number of frames needed to cover `duration_secs` at `fps`.
///
/// Rounds up, but tolerates floating-point noise so that exactly 5.0s at 30fps
/// is 150 frames rather than 151.
pub fn frames_for_duration(duration_secs: f64, fps: u32) -> u64 {
    if duration_secs <= 0.0 || fps == 0 {
        return 0;
    }
    (duration_secs * fps as f64 - 1e-6).ceil().max(0.0) as u64
}

/// Presentation time of a frame index, in seconds.
pub fn frame_time_secs(frame_index: u64, fps: u32) -> f64 {
    if fps == 0 {
        return 0.0;
    }
    frame_index as f64 / fps as f64
}

/// Convert seconds to a sample count at `sample_rate`.
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    if secs <= 0.0 {
        return 0;
    }
    (secs * sample_rate as f64).round() as usize
}
