//! End-to-end render of one timeline: fetch, build layers, composite, encode.
//!
//! Fetching is async; everything after it is blocking work meant to run on
//! a blocking thread.

use std::path::PathBuf;

use shortsmith_common::{
    frame_time_secs, frames_for_duration, FontConfig, RenderConfig, ShortsmithResult,
};
use shortsmith_processing_core::{timeline_duration, Placement, DEFAULT_STILL_DURATION_SECS};
use shortsmith_timeline_model::{Milestone, RenderSummary, SkippedTrack, Timeline, TrackKind};

use crate::assets::{AssetRequest, AssetResolver};
use crate::audio::{build_audio_segments, mix_segments, write_pcm, AudioInput};
use crate::compositor::Compositor;
use crate::export::{EncodeSettings, FrameEncoder};
use crate::text::{render_text_track, FontResolver};
use crate::video_layers::{build_video_layers, VideoInput, VideoLayer};

/// Progress callback for a render.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProgress {
    pub milestone: Milestone,
    pub frames_rendered: u64,
    pub total_frames: u64,
}

impl RenderProgress {
    fn at(milestone: Milestone) -> Self {
        Self {
            milestone,
            frames_rendered: 0,
            total_frames: 0,
        }
    }
}

/// Downloaded assets, indexed like the timeline's video and audio tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedAssets {
    pub video: Vec<Option<PathBuf>>,
    pub audio: Vec<Option<PathBuf>>,
}

/// Fetch every video and audio source of `timeline`.
///
/// Tracks without a source reference resolve to `None` without a request.
pub async fn fetch_assets(timeline: &Timeline, resolver: &AssetResolver) -> FetchedAssets {
    let mut requests = Vec::new();
    let mut slots = Vec::new();

    for (kind, tracks) in [
        (TrackKind::Video, timeline.video_tracks().collect::<Vec<_>>()),
        (TrackKind::Audio, timeline.audio_tracks().collect::<Vec<_>>()),
    ] {
        for (index, track) in tracks.into_iter().enumerate() {
            match track.source() {
                Some(url) => {
                    slots.push((kind, index, Some(requests.len())));
                    requests.push(AssetRequest::new(url, format!("{}_{index}", kind.as_str())));
                }
                None => {
                    tracing::warn!(kind = kind.as_str(), track = index, "Track has no source url, skipping");
                    slots.push((kind, index, None));
                }
            }
        }
    }

    tracing::info!(assets = requests.len(), "Fetching assets");
    let mut resolved = resolver.resolve_all(&requests).await;

    let mut assets = FetchedAssets::default();
    for (kind, _, slot) in slots {
        let path = slot.and_then(|i| resolved.get_mut(i).and_then(Option::take));
        match kind {
            TrackKind::Video => assets.video.push(path),
            _ => assets.audio.push(path),
        }
    }
    assets
}

/// Everything needed to render one timeline offline.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub timeline: Timeline,
    pub assets: FetchedAssets,
    /// Scratch directory for intermediate files.
    pub workspace: PathBuf,
    pub output_path: PathBuf,
    pub render: RenderConfig,
    pub fonts: FontConfig,
}

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output_path: PathBuf,
    pub summary: RenderSummary,
}

/// Build all layers, then composite and encode every frame.
pub fn render_timeline(job: &RenderJob, progress: Option<ProgressCallback>) -> ShortsmithResult<RenderReport> {
    let started = std::time::Instant::now();
    let report = |p: RenderProgress| {
        if let Some(cb) = &progress {
            cb(p);
        }
    };
    let timeline = &job.timeline;
    let config = &job.render;
    let mut skipped: Vec<SkippedTrack> = Vec::new();

    // Video
    report(RenderProgress::at(Milestone::VideoTracks));
    let video_inputs: Vec<VideoInput<'_>> = timeline
        .video_tracks()
        .enumerate()
        .map(|(index, track)| VideoInput {
            index,
            track,
            path: job.assets.video.get(index).cloned().flatten(),
        })
        .collect();
    let video = build_video_layers(&video_inputs, config);
    skipped.extend(video.skipped);
    let mut layers = video.layers;

    // Audio
    report(RenderProgress::at(Milestone::AudioTracks));
    let audio_inputs: Vec<AudioInput<'_>> = timeline
        .audio_tracks()
        .enumerate()
        .map(|(index, track)| AudioInput {
            index,
            track,
            path: job.assets.audio.get(index).cloned().flatten(),
        })
        .collect();
    let (mut segments, audio_skipped) = build_audio_segments(&audio_inputs);
    skipped.extend(audio_skipped);
    segments.extend(video.audio);

    // Text
    report(RenderProgress::at(Milestone::TextTracks));
    let fonts = FontResolver::new(&job.fonts);
    let mut overlays = Vec::new();
    for (index, track) in timeline.text_tracks().enumerate() {
        match render_text_track(index, track, &fonts) {
            Some(overlay) => overlays.push(overlay),
            None => {
                tracing::warn!(track = index, "Text track is empty, skipping");
                skipped.push(SkippedTrack {
                    kind: TrackKind::Text,
                    index,
                    reason: "Empty text".to_string(),
                });
            }
        }
    }

    // Timeline extent
    let mut placements: Vec<Placement> = layers.iter().map(|l| l.placement).collect();
    placements.extend(segments.iter().map(|s| s.placement));
    placements.extend(overlays.iter().map(|o| o.placement));
    let mut duration_secs = timeline_duration(&placements);

    let placeholder = layers.is_empty();
    if placeholder {
        tracing::warn!(
            skipped = skipped.len(),
            "No usable video tracks, using placeholder clip"
        );
        layers.push(VideoLayer::placeholder(DEFAULT_STILL_DURATION_SECS));
        duration_secs = duration_secs.max(DEFAULT_STILL_DURATION_SECS);
    }

    let fps = config.fps.max(1);
    let total_frames = frames_for_duration(duration_secs, fps);
    tracing::info!(
        duration_secs,
        total_frames,
        video_layers = layers.len(),
        audio_segments = segments.len(),
        text_layers = overlays.len(),
        "Timeline normalized"
    );

    // Audio mixdown
    report(RenderProgress::at(Milestone::Compositing));
    let mix = mix_segments(&segments, duration_secs, config.audio_sample_rate);
    skipped.extend(mix.skipped);
    let audio_path = if mix.mixed > 0 {
        let path = job.workspace.join("mix.f32");
        write_pcm(&path, &mix.buffer)?;
        Some(path)
    } else {
        None
    };

    let video_layer_count = layers.len();
    let text_layer_count = overlays.len();
    let mut compositor = Compositor::new(config.width, config.height, layers, overlays);

    // Frames
    report(RenderProgress {
        milestone: Milestone::Encoding,
        frames_rendered: 0,
        total_frames,
    });
    let settings = EncodeSettings::from(config);
    let mut encoder = FrameEncoder::spawn(&settings, &job.output_path, audio_path.as_deref())?;
    let report_every = (fps as u64).max(1);
    for frame_index in 0..total_frames {
        let frame = compositor.render_frame(frame_time_secs(frame_index, fps))?;
        encoder.write_frame(frame)?;
        if (frame_index + 1) % report_every == 0 {
            report(RenderProgress {
                milestone: Milestone::Encoding,
                frames_rendered: frame_index + 1,
                total_frames,
            });
        }
    }
    compositor.finish();
    let output_bytes = encoder.finish(&job.output_path)?;

    tracing::info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        frames = total_frames,
        output_bytes,
        "Render finished"
    );

    Ok(RenderReport {
        output_path: job.output_path.clone(),
        summary: RenderSummary {
            duration_secs,
            frames: total_frames,
            fps,
            width: config.width,
            height: config.height,
            video_layers: video_layer_count,
            audio_segments: mix.mixed,
            text_layers: text_layer_count,
            placeholder,
            skipped_tracks: skipped,
            output_bytes,
        },
    })
}
