use std::path::Path;
use std::process::Command;

use shortsmith_common::{FontConfig, RenderConfig};
use shortsmith_render_engine::{command_exists, probe_media, render_timeline, FetchedAssets, RenderJob};
use shortsmith_timeline_model::{RenderRequest, Timeline, TrackKind};

fn ffmpeg_available() -> bool {
    command_exists("ffmpeg") && command_exists("ffprobe")
}

fn timeline(json: &str) -> Timeline {
    let request: RenderRequest = serde_json::from_str(json).expect("fixture timeline should parse");
    Timeline::from_request(&request).expect("fixture timeline should validate")
}

fn test_clip(path: &Path, secs: u32) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=size=640x360:rate=30:duration={secs}"))
        .args(["-pix_fmt", "yuv420p"])
        .arg(path)
        .status()
        .expect("ffmpeg should run");
    assert!(status.success());
}

fn bitmap_fonts() -> FontConfig {
    FontConfig {
        fonts_dir: "/nonexistent/fonts".into(),
        system_fallbacks: Vec::new(),
    }
}

fn small_render() -> RenderConfig {
    RenderConfig {
        x264_preset: "ultrafast".to_string(),
        ..RenderConfig::default()
    }
}

#[test]
fn single_video_track_renders_five_seconds_vertical() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.mp4");
    test_clip(&clip, 8);

    let job = RenderJob {
        timeline: timeline(r#"{
            "video_tracks": [{"url": "https://cdn.example.com/clip.mp4", "start": 0, "duration": 5}],
            "output_key": "renders/scenario-a.mp4"
        }"#),
        assets: FetchedAssets {
            video: vec![Some(clip)],
            audio: Vec::new(),
        },
        workspace: dir.path().to_path_buf(),
        output_path: dir.path().join("out.mp4"),
        render: small_render(),
        fonts: bitmap_fonts(),
    };

    let report = render_timeline(&job, None).unwrap();
    assert_eq!(report.summary.duration_secs, 5.0);
    assert_eq!(report.summary.frames, 150);
    assert_eq!(report.summary.video_layers, 1);
    assert!(!report.summary.placeholder);
    assert_eq!(report.summary.audio_segments, 0);

    let info = probe_media(&report.output_path).unwrap();
    assert_eq!(info.dimensions(), Some((1080, 1920)));
    assert!((info.duration_secs.unwrap() - 5.0).abs() < 0.2);
}

#[test]
fn no_surviving_video_uses_placeholder() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();

    let job = RenderJob {
        timeline: timeline(r#"{
            "video_tracks": [{"url": "https://cdn.example.com/missing.mp4"}],
            "text_tracks": [{"text": "HELLO WORLD", "start": 0, "duration": 2,
                             "style": {"fontSize": 60, "animation": "pop"}}],
            "output_key": "renders/scenario-e.mp4"
        }"#),
        assets: FetchedAssets {
            video: vec![None],
            audio: Vec::new(),
        },
        workspace: dir.path().to_path_buf(),
        output_path: dir.path().join("out.mp4"),
        render: small_render(),
        fonts: bitmap_fonts(),
    };

    let report = render_timeline(&job, None).unwrap();
    assert!(report.summary.placeholder);
    assert_eq!(report.summary.duration_secs, 5.0);
    assert_eq!(report.summary.text_layers, 1);
    assert_eq!(report.summary.skipped_tracks.len(), 1);
    assert_eq!(report.summary.skipped_tracks[0].kind, TrackKind::Video);
    assert!(report.output_path.exists());
}
