//! ffmpeg/ffprobe process helpers shared by decoders and the encoder.

use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{ChildStderr, Command};
use std::thread::JoinHandle;

use serde::Deserialize;
use shortsmith_common::{ShortsmithError, ShortsmithResult};

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Stream facts needed to lay out a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl MediaInfo {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Run ffprobe on `path` and summarize its streams.
pub fn probe_media(path: &Path) -> ShortsmithResult<MediaInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration:stream=codec_type,width,height,duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ShortsmithError::asset_decode(format!("Failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ShortsmithError::asset_decode(format!(
            "ffprobe rejected {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_json(&output.stdout)
}

fn parse_probe_json(raw: &[u8]) -> ShortsmithResult<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_slice(raw)
        .map_err(|e| ShortsmithError::asset_decode(format!("Unreadable ffprobe output: {e}")))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let parse_secs = |v: &Option<String>| {
        v.as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
    };
    let duration_secs = probe
        .format
        .as_ref()
        .and_then(|f| parse_secs(&f.duration))
        .or_else(|| probe.streams.iter().find_map(|s| parse_secs(&s.duration)));

    Ok(MediaInfo {
        duration_secs,
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        has_video: video.is_some(),
        has_audio,
    })
}

/// Read a child's stderr to completion on a helper thread so a full pipe
/// never stalls the process.
pub fn drain_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    })
}

pub fn join_stderr(handle: JoinHandle<String>) -> String {
    handle
        .join()
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
}

/// Last few lines of ffmpeg's log, for error messages.
pub fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.trim().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

/// Render seconds the way ffmpeg's `-ss`/`-t` expect.
pub fn secs_arg(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_audio() {
        let raw = br#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080, "duration": "12.000"},
                {"codec_type": "audio", "duration": "11.98"}
            ],
            "format": {"duration": "12.040000"}
        }"#;
        let info = parse_probe_json(raw).unwrap();
        assert_eq!(info.dimensions(), Some((1920, 1080)));
        assert_eq!(info.duration_secs, Some(12.04));
        assert!(info.has_video);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_audio_only_falls_back_to_stream_duration() {
        let raw = br#"{"streams": [{"codec_type": "audio", "duration": "3.5"}], "format": {}}"#;
        let info = parse_probe_json(raw).unwrap();
        assert!(!info.has_video);
        assert_eq!(info.dimensions(), None);
        assert_eq!(info.duration_secs, Some(3.5));
    }

    #[test]
    fn test_parse_probe_rejects_garbage() {
        let err = parse_probe_json(b"not json").unwrap_err();
        assert_eq!(err.kind(), "asset_decode");
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        assert_eq!(stderr_tail("a\nb\nc\n", 2), "b\nc");
        assert_eq!(stderr_tail("", 3), "");
    }

    #[test]
    fn test_secs_arg_formatting() {
        assert_eq!(secs_arg(1.5), "1.500");
        assert_eq!(secs_arg(-2.0), "0.000");
    }
}
