//! Video layer composition: classify, frame, and time each video track.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use image::imageops::FilterType;
use image::RgbaImage;
use shortsmith_common::{RenderConfig, ShortsmithError, ShortsmithResult};
use shortsmith_processing_core::{
    place_media, FramingPlan, Placement, TrimWindow, DEFAULT_STILL_DURATION_SECS,
};
use shortsmith_timeline_model::{is_image_path, MediaTrack, Rgba8, SkippedTrack, TrackKind};

use crate::audio::AudioSegment;
use crate::ffmpeg::{drain_stderr, join_stderr, probe_media, secs_arg, stderr_tail};

/// Fill of the clip used when no video track survives.
pub const PLACEHOLDER_COLOR: Rgba8 = [255, 0, 0, 255];

/// Pixels a layer contributes to a frame.
pub enum LayerFrame<'a> {
    Image(&'a RgbaImage),
    Solid(Rgba8),
}

/// Where a layer's pixels come from.
pub enum LayerSource {
    /// Pre-framed still image.
    Still(RgbaImage),
    Solid(Rgba8),
    Motion(MotionClip),
}

impl LayerSource {
    pub fn label(&self) -> &'static str {
        match self {
            LayerSource::Still(_) => "still",
            LayerSource::Solid(_) => "solid",
            LayerSource::Motion(_) => "motion",
        }
    }
}

/// One video track, ready to composite.
pub struct VideoLayer {
    /// Declaration index among video tracks.
    pub index: usize,
    pub track_index: i64,
    pub placement: Placement,
    pub source: LayerSource,
}

impl VideoLayer {
    pub fn new(index: usize, track_index: i64, placement: Placement, source: LayerSource) -> Self {
        Self {
            index,
            track_index,
            placement,
            source,
        }
    }

    /// Solid red layer standing in for missing video.
    pub fn placeholder(duration_secs: f64) -> Self {
        let duration = if duration_secs > 0.0 {
            duration_secs
        } else {
            DEFAULT_STILL_DURATION_SECS
        };
        Self::new(
            0,
            0,
            Placement::new(0.0, duration),
            LayerSource::Solid(PLACEHOLDER_COLOR),
        )
    }

    /// Pixels at `local_secs` into the layer's window.
    pub fn frame(&mut self, local_secs: f64) -> ShortsmithResult<Option<LayerFrame<'_>>> {
        match &mut self.source {
            LayerSource::Still(image) => Ok(Some(LayerFrame::Image(image))),
            LayerSource::Solid(color) => Ok(Some(LayerFrame::Solid(*color))),
            LayerSource::Motion(clip) => Ok(clip.frame_at(local_secs)?.map(LayerFrame::Image)),
        }
    }

    pub fn finish(&mut self) {
        if let LayerSource::Motion(clip) = &mut self.source {
            clip.finish();
        }
    }
}

/// A decoded-on-demand motion clip.
///
/// The decoder starts on the first requested frame. Once the source runs
/// dry the last frame is held for the rest of the layer's window.
pub struct MotionClip {
    path: PathBuf,
    plan: FramingPlan,
    trim: TrimWindow,
    fps: u32,
    decoder: Option<FrameDecoder>,
    last: Option<RgbaImage>,
    frames_read: u64,
    exhausted: bool,
}

impl MotionClip {
    pub fn new(path: PathBuf, plan: FramingPlan, trim: TrimWindow, fps: u32) -> Self {
        Self {
            path,
            plan,
            trim,
            fps: fps.max(1),
            decoder: None,
            last: None,
            frames_read: 0,
            exhausted: false,
        }
    }

    pub fn plan(&self) -> &FramingPlan {
        &self.plan
    }

    fn frame_at(&mut self, local_secs: f64) -> ShortsmithResult<Option<&RgbaImage>> {
        let target = (local_secs * self.fps as f64 + 1e-6).floor().max(0.0) as u64;

        while !self.exhausted && self.frames_read <= target {
            if self.decoder.is_none() {
                self.decoder = Some(FrameDecoder::spawn(&self.path, &self.plan, &self.trim, self.fps)?);
            }
            let Some(decoder) = self.decoder.as_mut() else {
                break;
            };

            match decoder.read_frame() {
                Ok(Some(raw)) => {
                    match self.last.as_mut() {
                        Some(img) => img.copy_from_slice(&raw),
                        None => {
                            self.last = RgbaImage::from_raw(self.plan.out_width, self.plan.out_height, raw);
                        }
                    }
                    self.frames_read += 1;
                }
                Ok(None) => {
                    tracing::debug!(path = %self.path.display(), frames = self.frames_read, "Clip exhausted, holding last frame");
                    self.exhausted = true;
                    self.finish();
                }
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "Clip decode failed, holding last frame");
                    self.exhausted = true;
                    self.finish();
                }
            }
        }

        Ok(self.last.as_ref())
    }

    pub fn finish(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            decoder.finish(&self.path);
        }
    }
}

/// ffmpeg child producing framed RGBA frames on stdout.
struct FrameDecoder {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    frame_len: usize,
}

impl FrameDecoder {
    fn spawn(path: &Path, plan: &FramingPlan, trim: &TrimWindow, fps: u32) -> ShortsmithResult<Self> {
        let filter = format!("{},fps={fps},format=rgba", plan.ffmpeg_filter());
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args(["-ss", &secs_arg(trim.offset), "-t", &secs_arg(trim.duration), "-i"])
            .arg(path)
            .args(["-vf", &filter, "-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ShortsmithError::composition(format!("Failed to start ffmpeg decoder: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShortsmithError::composition("Failed to capture decoder stdout"))?;
        let stderr = child.stderr.take().map(drain_stderr);

        tracing::debug!(pid = child.id(), path = %path.display(), filter = %filter, "Decoder started");

        Ok(Self {
            child,
            stdout,
            stderr,
            frame_len: plan.out_width as usize * plan.out_height as usize * 4,
        })
    }

    /// Next frame's bytes, or `None` at end of stream.
    fn read_frame(&mut self) -> ShortsmithResult<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf)),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(ShortsmithError::asset_decode(format!("Decoder read failed: {err}"))),
        }
    }

    fn finish(mut self, path: &Path) {
        // Early stop closes the pipe; ffmpeg exits on its own or is killed.
        self.child.kill().ok();
        let status = self.child.wait();
        let stderr = self.stderr.take().map(join_stderr).unwrap_or_default();
        if !stderr.trim().is_empty() {
            tracing::debug!(path = %path.display(), status = ?status.ok(), stderr = %stderr_tail(&stderr, 5), "Decoder finished");
        }
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

/// A video track paired with its downloaded asset.
#[derive(Debug, Clone)]
pub struct VideoInput<'a> {
    pub index: usize,
    pub track: &'a MediaTrack,
    pub path: Option<PathBuf>,
}

/// Output of [`build_video_layers`].
#[derive(Default)]
pub struct VideoBuild {
    /// Layers sorted by ascending `trackIndex`.
    pub layers: Vec<VideoLayer>,
    /// Embedded audio of motion clips.
    pub audio: Vec<AudioSegment>,
    pub skipped: Vec<SkippedTrack>,
}

/// Turn video tracks into framed, timed layers. Unusable tracks are skipped
/// and reported, never fatal.
pub fn build_video_layers(inputs: &[VideoInput<'_>], config: &RenderConfig) -> VideoBuild {
    let mut build = VideoBuild::default();

    for input in inputs {
        match build_layer(input, config) {
            Ok((layer, audio)) => {
                tracing::info!(
                    track = input.index,
                    kind = layer.source.label(),
                    start = layer.placement.start,
                    duration = layer.placement.duration,
                    track_index = layer.track_index,
                    "Video layer ready"
                );
                build.layers.push(layer);
                build.audio.extend(audio);
            }
            Err(err) => {
                tracing::warn!(track = input.index, error = %err, "Skipping video track");
                build.skipped.push(SkippedTrack {
                    kind: TrackKind::Video,
                    index: input.index,
                    reason: err.to_string(),
                });
            }
        }
    }

    shortsmith_processing_core::sort_by_track_index(&mut build.layers, |l| l.track_index);
    build
}

fn build_layer(
    input: &VideoInput<'_>,
    config: &RenderConfig,
) -> ShortsmithResult<(VideoLayer, Option<AudioSegment>)> {
    let path = input
        .path
        .as_ref()
        .ok_or_else(|| ShortsmithError::asset_download("Asset unavailable"))?;
    let track = input.track;

    if is_image_path(&path.to_string_lossy()) {
        let (placement, _) = place_media(track, None)
            .ok_or_else(|| ShortsmithError::asset_decode("Still has no duration"))?;
        let image = load_still(path, config.width, config.height)?;
        let layer = VideoLayer::new(input.index, track.track_index, placement, LayerSource::Still(image));
        return Ok((layer, None));
    }

    let info = probe_media(path)?;
    if !info.has_video {
        return Err(ShortsmithError::asset_decode("No video stream"));
    }
    let (width, height) = info
        .dimensions()
        .ok_or_else(|| ShortsmithError::asset_decode("Unknown frame size"))?;
    let natural = info
        .duration_secs
        .ok_or_else(|| ShortsmithError::asset_decode("Unknown duration"))?;
    let (placement, trim) = place_media(track, Some(natural)).ok_or_else(|| {
        ShortsmithError::asset_decode(format!(
            "Offset {:.2}s is past the clip end ({natural:.2}s)",
            track.offset
        ))
    })?;

    let plan = FramingPlan::for_canvas(width, height, config.width, config.height);
    let audio = (info.has_audio && track.volume > 0.0).then(|| AudioSegment {
        kind: TrackKind::Video,
        index: input.index,
        path: path.clone(),
        placement,
        trim,
        gain: track.volume as f32,
    });

    let clip = MotionClip::new(path.clone(), plan, trim, config.fps);
    let layer = VideoLayer::new(input.index, track.track_index, placement, LayerSource::Motion(clip));
    Ok((layer, audio))
}

/// Decode a still and run it through the framing plan.
pub fn load_still(path: &Path, width: u32, height: u32) -> ShortsmithResult<RgbaImage> {
    let image = image::open(path)
        .map_err(|e| ShortsmithError::asset_decode(format!("Failed to decode {}: {e}", path.display())))?;
    Ok(frame_still(&image.to_rgba8(), width, height))
}

/// Scale-and-crop an RGBA image onto a `width`x`height` canvas.
pub fn frame_still(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let plan = FramingPlan::for_canvas(image.width(), image.height(), width, height);
    let scaled = image::imageops::resize(image, plan.scaled_width, plan.scaled_height, FilterType::Lanczos3);
    image::imageops::crop_imm(&scaled, plan.crop_x, plan.crop_y, plan.out_width, plan.out_height).to_image()
}
