//! H.264 encoding of composited frames.
//!
//! Frames are piped to ffmpeg as raw RGBA on stdin; the premixed audio, if
//! any, is read from a raw f32le file next to the output.

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbaImage;
use shortsmith_common::{RenderConfig, ShortsmithError, ShortsmithResult};

use crate::audio::MIX_CHANNELS;
use crate::ffmpeg::{drain_stderr, join_stderr, stderr_tail};

/// Outputs smaller than this are suspicious but not rejected.
pub const MIN_EXPECTED_OUTPUT_BYTES: u64 = 1000;

/// Encoder parameters derived from [`RenderConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub threads: u32,
    pub preset: String,
    /// Target video bitrate; 0 selects constant quality.
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    pub audio_sample_rate: u32,
}

impl From<&RenderConfig> for EncodeSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps.max(1),
            threads: config.encoder_threads,
            preset: config.x264_preset.clone(),
            video_bitrate_kbps: config.video_bitrate_kbps,
            audio_bitrate_kbps: config.audio_bitrate_kbps,
            audio_sample_rate: config.audio_sample_rate,
        }
    }
}

/// Full ffmpeg argument list for one encode.
pub fn encoder_args(settings: &EncodeSettings, output: &Path, audio: Option<&Path>) -> Vec<String> {
    let mut args = Vec::new();
    let mut push = |items: &[&str]| args.extend(items.iter().map(|s| s.to_string()));

    push(&["-y", "-hide_banner", "-loglevel", "error"]);
    push(&["-f", "rawvideo", "-pix_fmt", "rgba"]);
    push(&["-s", &format!("{}x{}", settings.width, settings.height)]);
    push(&["-r", &settings.fps.to_string(), "-i", "pipe:0"]);

    if let Some(audio) = audio {
        push(&["-f", "f32le", "-ar", &settings.audio_sample_rate.to_string()]);
        push(&["-ac", &MIX_CHANNELS.to_string(), "-i", &audio.to_string_lossy()]);
        push(&["-map", "0:v:0", "-map", "1:a:0"]);
    } else {
        push(&["-map", "0:v:0"]);
    }

    push(&["-c:v", "libx264", "-preset", &settings.preset]);
    push(&["-profile:v", "baseline", "-pix_fmt", "yuv420p"]);
    push(&["-r", &settings.fps.to_string()]);

    if settings.video_bitrate_kbps > 0 {
        push(&["-b:v", &format!("{}k", settings.video_bitrate_kbps)]);
    } else {
        push(&["-crf", "23"]);
    }

    if settings.threads > 0 {
        push(&["-threads", &settings.threads.to_string()]);
    }

    if audio.is_some() {
        push(&["-c:a", "aac", "-b:a", &format!("{}k", settings.audio_bitrate_kbps.max(64))]);
    }

    push(&["-movflags", "+faststart", &output.to_string_lossy()]);
    args
}

/// A running ffmpeg encode fed frame by frame.
pub struct FrameEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frame_len: usize,
    frames_written: u64,
}

impl FrameEncoder {
    pub fn spawn(settings: &EncodeSettings, output: &Path, audio: Option<&Path>) -> ShortsmithResult<Self> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args = encoder_args(settings, output, audio);
        tracing::debug!(args = ?args, "Running ffmpeg encoder");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ShortsmithError::encode(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            width = settings.width,
            height = settings.height,
            fps = settings.fps,
            threads = settings.threads,
            with_audio = audio.is_some(),
            "Encoder started"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShortsmithError::encode("Failed to capture ffmpeg stdin"))?;
        let stderr = child.stderr.take().map(drain_stderr);

        Ok(Self {
            child,
            stdin: Some(stdin),
            stderr,
            frame_len: settings.width as usize * settings.height as usize * 4,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn write_frame(&mut self, frame: &RgbaImage) -> ShortsmithResult<()> {
        if frame.as_raw().len() != self.frame_len {
            return Err(ShortsmithError::composition(format!(
                "Frame is {}x{}, encoder expects {} bytes",
                frame.width(),
                frame.height(),
                self.frame_len
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ShortsmithError::encode("Encoder input already closed"))?;

        if let Err(err) = stdin.write_all(frame.as_raw()) {
            let log = self.collect_stderr();
            return Err(ShortsmithError::encode(format!(
                "ffmpeg stopped accepting frames after {}: {err}: {}",
                self.frames_written,
                stderr_tail(&log, 8)
            )));
        }

        self.frames_written += 1;
        Ok(())
    }

    /// Close the input, wait for ffmpeg, and check the output file.
    pub fn finish(mut self, output: &Path) -> ShortsmithResult<u64> {
        drop(self.stdin.take());

        let status = self
            .child
            .wait()
            .map_err(|e| ShortsmithError::encode(format!("Failed to wait on ffmpeg: {e}")))?;
        let log = self.collect_stderr();

        if !status.success() {
            return Err(ShortsmithError::encode(format!(
                "ffmpeg export failed (status {status}): {}",
                stderr_tail(&log, 8)
            )));
        }

        let bytes = verify_output(output)?;
        tracing::info!(
            frames = self.frames_written,
            bytes,
            output = %output.display(),
            "Encode finished"
        );
        Ok(bytes)
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr.take().map(join_stderr).unwrap_or_default()
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            // Abandoned mid-encode.
            drop(self.stdin.take());
            self.child.kill().ok();
            self.child.wait().ok();
        }
    }
}

/// Size of the encoded file; a missing file is an encode failure.
pub fn verify_output(path: &Path) -> ShortsmithResult<u64> {
    let meta = std::fs::metadata(path).map_err(|_| {
        ShortsmithError::encode(format!("Encoder produced no output at {}", path.display()))
    })?;

    if meta.len() < MIN_EXPECTED_OUTPUT_BYTES {
        tracing::warn!(bytes = meta.len(), path = %path.display(), "Encoded output is suspiciously small");
    }
    Ok(meta.len())
}
