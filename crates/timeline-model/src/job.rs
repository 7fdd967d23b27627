//! Job markers polled by clients, and the keys they live under.
//!
//! Each status write replaces the previous one (last-write-wins). A job is
//! terminal once a `finished` or `failed` status has been written.

use serde::{Deserialize, Serialize};

use crate::track::TrackKind;

/// Lifecycle state of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Finished,
    Failed,
}

impl JobStatus {
    /// Returns true if no further writes are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }
}

/// Fixed progress points published during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Started,
    DownloadingAssets,
    VideoTracks,
    AudioTracks,
    TextTracks,
    Compositing,
    Encoding,
    Uploading,
    Complete,
}

impl Milestone {
    pub fn percent(&self) -> u8 {
        match self {
            Milestone::Started => 0,
            Milestone::DownloadingAssets => 10,
            Milestone::VideoTracks => 30,
            Milestone::AudioTracks => 40,
            Milestone::TextTracks => 50,
            Milestone::Compositing => 60,
            Milestone::Encoding => 70,
            Milestone::Uploading => 90,
            Milestone::Complete => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Milestone::Started => "Starting render",
            Milestone::DownloadingAssets => "Downloading assets",
            Milestone::VideoTracks => "Processing video tracks",
            Milestone::AudioTracks => "Processing audio tracks",
            Milestone::TextTracks => "Rendering text overlays",
            Milestone::Compositing => "Compositing layers",
            Milestone::Encoding => "Encoding video",
            Milestone::Uploading => "Uploading output",
            Milestone::Complete => "Render complete",
        }
    }
}

/// Progress record at `<output_key>_status.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMarker {
    pub status: JobStatus,
    pub message: String,
    pub percent: u8,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl StatusMarker {
    pub fn for_milestone(milestone: Milestone, timestamp: f64) -> Self {
        Self {
            status: if milestone == Milestone::Complete {
                JobStatus::Finished
            } else {
                JobStatus::Processing
            },
            message: milestone.message().to_string(),
            percent: milestone.percent(),
            timestamp,
        }
    }

    pub fn failed(message: impl Into<String>, percent: u8, timestamp: f64) -> Self {
        Self {
            status: JobStatus::Failed,
            message: message.into(),
            percent,
            timestamp,
        }
    }
}

/// Failure record at `<base>_error.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub error: String,
    /// Error chain and context, outermost first.
    pub traceback: String,
    pub status: JobStatus,
    /// Error taxonomy name (e.g. `encode`, `upload`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub timestamp: f64,
}

/// Final success record at `<output_key>_result.json`. Written once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub status: JobStatus,
    pub output_url: String,
    pub key: String,
    pub script: serde_json::Value,
    pub summary: RenderSummary,
    pub timestamp: f64,
}

/// What went into the encoded output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub duration_secs: f64,
    pub frames: u64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub video_layers: usize,
    pub audio_segments: usize,
    pub text_layers: usize,
    /// True when no video survived and a placeholder clip was composited.
    pub placeholder: bool,
    pub skipped_tracks: Vec<SkippedTrack>,
    pub output_bytes: u64,
}

/// A track dropped from the render, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTrack {
    pub kind: TrackKind,
    /// Index within its kind's list, in declaration order.
    pub index: usize,
    pub reason: String,
}

/// Storage key of the status marker.
pub fn status_key(output_key: &str) -> String {
    format!("{output_key}_status.json")
}

/// Storage key of the success manifest.
pub fn result_key(output_key: &str) -> String {
    format!("{output_key}_result.json")
}

/// Storage key of the error marker: the output key minus its extension.
pub fn error_key(output_key: &str) -> String {
    format!("{}_error.json", base_name(output_key))
}

/// `output_key` without a trailing file extension in its last segment.
pub fn base_name(output_key: &str) -> &str {
    let segment_start = output_key.rfind('/').map(|i| i + 1).unwrap_or(0);
    match output_key[segment_start..].rfind('.') {
        Some(dot) if dot > 0 => &output_key[..segment_start + dot],
        _ => output_key,
    }
}
