//! Timeline normalization: z-ordering, trim policy, and overall duration.

use shortsmith_timeline_model::track::MediaTrack;

/// Length given to stills, text, and the placeholder clip when a track
/// requests `duration = 0`.
pub const DEFAULT_STILL_DURATION_SECS: f64 = 5.0;

/// Where a layer sits on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Timeline offset in seconds.
    pub start: f64,
    /// Visible/audible length in seconds.
    pub duration: f64,
}

impl Placement {
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start: start.max(0.0),
            duration: duration.max(0.0),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Half-open activity test: `[start, end)`.
    pub fn contains(&self, time_secs: f64) -> bool {
        time_secs >= self.start && time_secs < self.end()
    }

    /// Seconds since `start`, or `None` when `time_secs` is outside the window.
    pub fn local_time(&self, time_secs: f64) -> Option<f64> {
        self.contains(time_secs).then(|| time_secs - self.start)
    }
}

/// The portion of a source that gets played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    /// In-point within the source, in seconds.
    pub offset: f64,
    /// Played length in seconds.
    pub duration: f64,
}

/// Apply the trim policy to a motion source of known natural length.
///
/// The offset is applied first (discarding the leading portion); the result is
/// then clipped to `requested_duration` when it is positive and shorter than
/// what remains. Returns `None` when nothing is left to play.
pub fn trim_window(offset: f64, requested_duration: f64, natural_secs: f64) -> Option<TrimWindow> {
    let offset = offset.max(0.0);
    let remaining = natural_secs - offset;
    if remaining <= 0.0 {
        return None;
    }

    let duration = if requested_duration > 0.0 && requested_duration < remaining {
        requested_duration
    } else {
        remaining
    };
    Some(TrimWindow { offset, duration })
}

/// Duration of a track with no natural length (stills and text).
pub fn still_duration(requested_duration: f64) -> f64 {
    if requested_duration > 0.0 {
        requested_duration
    } else {
        DEFAULT_STILL_DURATION_SECS
    }
}

/// Placement of a media track given its natural length (`None` for stills).
pub fn place_media(track: &MediaTrack, natural_secs: Option<f64>) -> Option<(Placement, TrimWindow)> {
    let window = match natural_secs {
        Some(natural) => trim_window(track.offset, track.duration, natural)?,
        None => TrimWindow {
            offset: 0.0,
            duration: still_duration(track.duration),
        },
    };
    Some((Placement::new(track.start, window.duration), window))
}

/// Stable ascending sort by z-order. Equal indices keep declaration order.
pub fn sort_by_track_index<T>(items: &mut [T], track_index: impl Fn(&T) -> i64) {
    items.sort_by_key(|item| track_index(item));
}

/// Overall timeline length: the latest end over all placements.
pub fn timeline_duration<'a>(placements: impl IntoIterator<Item = &'a Placement>) -> f64 {
    placements
        .into_iter()
        .map(Placement::end)
        .fold(0.0, f64::max)
}
