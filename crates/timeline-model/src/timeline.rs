//! Render submissions and the timeline built from them.

use serde::{Deserialize, Serialize};

use crate::track::{MediaTrack, TextTrack, Track, TrackKind};

/// Errors raised while validating a submission.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimelineError {
    #[error("output_key must not be empty")]
    MissingOutputKey,

    #[error("{kind} track {index}: {field} must be a finite, non-negative number (got {value})")]
    InvalidTiming {
        kind: &'static str,
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// Job input as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub video_tracks: Vec<MediaTrack>,

    #[serde(default)]
    pub audio_tracks: Vec<MediaTrack>,

    #[serde(default)]
    pub text_tracks: Vec<TextTrack>,

    /// Opaque script payload echoed into the manifest.
    #[serde(default = "empty_script")]
    pub script: serde_json::Value,

    /// Storage key of the encoded output; also the job identifier.
    pub output_key: String,
}

fn empty_script() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

/// The full set of tracks defining one render job, in declaration order.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub tracks: Vec<Track>,
    pub output_key: String,
}

impl Timeline {
    /// Build and validate a timeline from a submission.
    ///
    /// Declaration order is video tracks, then audio, then text. Sorting by
    /// z-order happens later, in the normalizer.
    pub fn from_request(request: &RenderRequest) -> Result<Self, TimelineError> {
        if request.output_key.trim().is_empty() {
            return Err(TimelineError::MissingOutputKey);
        }

        let mut tracks = Vec::with_capacity(
            request.video_tracks.len() + request.audio_tracks.len() + request.text_tracks.len(),
        );
        tracks.extend(request.video_tracks.iter().cloned().map(Track::Video));
        tracks.extend(request.audio_tracks.iter().cloned().map(Track::Audio));
        tracks.extend(request.text_tracks.iter().cloned().map(Track::Text));

        let timeline = Self {
            tracks,
            output_key: request.output_key.trim().to_string(),
        };
        timeline.validate()?;
        Ok(timeline)
    }

    fn validate(&self) -> Result<(), TimelineError> {
        let mut counters = [0usize; 3];
        for track in &self.tracks {
            let kind = track.kind();
            let slot = kind as usize;
            let index = counters[slot];
            counters[slot] += 1;

            let mut fields = vec![("start", track.start()), ("duration", track.duration())];
            if let Track::Video(media) | Track::Audio(media) = track {
                fields.push(("offset", media.offset));
                fields.push(("volume", media.volume));
            }
            for (field, value) in fields {
                if !value.is_finite() || value < 0.0 {
                    return Err(TimelineError::InvalidTiming {
                        kind: kind.as_str(),
                        index,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter_map(|t| match t {
            Track::Video(v) => Some(v),
            _ => None,
        })
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter_map(|t| match t {
            Track::Audio(a) => Some(a),
            _ => None,
        })
    }

    pub fn text_tracks(&self) -> impl Iterator<Item = &TextTrack> {
        self.tracks.iter().filter_map(|t| match t {
            Track::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn count(&self, kind: TrackKind) -> usize {
        self.tracks.iter().filter(|t| t.kind() == kind).count()
    }
}
