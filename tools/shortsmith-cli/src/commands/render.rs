//! Run one render job.

use std::path::PathBuf;

use shortsmith_common::AppConfig;
use shortsmith_job_service::JobRunner;
use shortsmith_timeline_model::{JobStatus, RenderRequest};

pub async fn run(mut config: AppConfig, timeline: PathBuf, key: Option<String>) -> anyhow::Result<()> {
    // Timelines rendered from the command line may point at local media.
    config.fetch.allow_local_sources = true;
    println!("Rendering timeline: {}", timeline.display());

    let content = std::fs::read_to_string(&timeline)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", timeline.display()))?;
    let mut request: RenderRequest = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", timeline.display()))?;
    if let Some(key) = key {
        request.output_key = key;
    }

    println!("  Output key: {}", request.output_key);
    println!(
        "  Tracks: {} video, {} audio, {} text",
        request.video_tracks.len(),
        request.audio_tracks.len(),
        request.text_tracks.len()
    );
    println!("  Store: {}", config.storage_root.display());

    let (objects, jobs) = super::open_stores(&config);
    let runner = JobRunner::new(config, jobs, objects);
    let outcome = runner.run(request).await?;

    match outcome.status {
        JobStatus::Finished => {
            if let Some(manifest) = &outcome.manifest {
                let summary = &manifest.summary;
                println!("\nRender complete: {}", manifest.output_url);
                println!(
                    "  {:.2}s, {} frames at {} fps, {}x{}, {} bytes",
                    summary.duration_secs,
                    summary.frames,
                    summary.fps,
                    summary.width,
                    summary.height,
                    summary.output_bytes
                );
                if summary.placeholder {
                    println!("  No usable video: rendered placeholder clip");
                }
                for skipped in &summary.skipped_tracks {
                    println!(
                        "  Skipped {} track {}: {}",
                        skipped.kind.as_str(),
                        skipped.index,
                        skipped.reason
                    );
                }
            }
            Ok(())
        }
        _ => Err(anyhow::anyhow!(
            "Render failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".to_string())
        )),
    }
}
