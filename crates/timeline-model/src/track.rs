//! Track types.
//!
//! Video and audio tracks share one shape ([`MediaTrack`]); text tracks carry
//! their string and style instead of a source reference.

use serde::{Deserialize, Serialize};

use crate::style::TextStyle;

/// Extensions treated as still images rather than motion clips.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// A remote media element placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTrack {
    /// Pre-signed source URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Legacy name for `url`, consulted only when `url` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Timeline offset in seconds.
    #[serde(default)]
    pub start: f64,

    /// Played length in seconds (0 = natural length).
    #[serde(default)]
    pub duration: f64,

    /// Trim-in point within the source, in seconds.
    #[serde(default)]
    pub offset: f64,

    /// Z-order for video; ascending draws bottom-to-top.
    #[serde(default, rename = "trackIndex", alias = "track_index")]
    pub track_index: i64,

    /// Linear gain applied to the track's audio.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_volume() -> f64 {
    1.0
}

impl MediaTrack {
    /// Create a track for `url` with default timing.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            src: None,
            start: 0.0,
            duration: 0.0,
            offset: 0.0,
            track_index: 0,
            volume: 1.0,
        }
    }

    /// The source reference, preferring `url` over `src`.
    pub fn source(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.src.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A styled caption placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTrack {
    /// The caption text.
    #[serde(default)]
    pub text: String,

    /// Timeline offset in seconds.
    #[serde(default)]
    pub start: f64,

    /// Display length in seconds (0 = default length).
    #[serde(default)]
    pub duration: f64,

    /// Declared z-order. Text stacks in declaration order above all video.
    #[serde(default, rename = "trackIndex", alias = "track_index")]
    pub track_index: i64,

    /// Styling and animation.
    #[serde(default)]
    pub style: TextStyle,
}

impl TextTrack {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
            track_index: 0,
            style: TextStyle::default(),
        }
    }
}

/// Discriminated union over the three track kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Track {
    Video(MediaTrack),
    Audio(MediaTrack),
    Text(TextTrack),
}

impl Track {
    pub fn kind(&self) -> TrackKind {
        match self {
            Track::Video(_) => TrackKind::Video,
            Track::Audio(_) => TrackKind::Audio,
            Track::Text(_) => TrackKind::Text,
        }
    }

    /// Timeline offset in seconds.
    pub fn start(&self) -> f64 {
        match self {
            Track::Video(t) | Track::Audio(t) => t.start,
            Track::Text(t) => t.start,
        }
    }

    /// Requested duration in seconds (0 = natural/default).
    pub fn duration(&self) -> f64 {
        match self {
            Track::Video(t) | Track::Audio(t) => t.duration,
            Track::Text(t) => t.duration,
        }
    }

    pub fn track_index(&self) -> i64 {
        match self {
            Track::Video(t) | Track::Audio(t) => t.track_index,
            Track::Text(t) => t.track_index,
        }
    }
}

/// Track kind tag, used in logs and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "text",
        }
    }
}

/// Whether a local path or URL names a still image, by extension.
pub fn is_image_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
