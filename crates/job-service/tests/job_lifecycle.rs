//! Job lifecycle against the in-memory store.
//!
//! Tests that encode are skipped when ffmpeg is not installed.

use std::path::Path;
use std::sync::Arc;

use shortsmith_common::{AppConfig, ShortsmithResult};
use shortsmith_job_service::{
    JobRunner, JobSnapshot, JobStore, MemoryObjectStore, ObjectJobStore, ObjectStore,
};
use shortsmith_render_engine::command_exists;
use shortsmith_timeline_model::{ErrorMarker, JobStatus, Manifest, RenderRequest, StatusMarker};

struct Harness {
    objects: Arc<MemoryObjectStore>,
    jobs: Arc<ObjectJobStore>,
    runner: JobRunner,
    workspace_root: tempfile::TempDir,
}

fn harness(configure: impl FnOnce(&mut AppConfig)) -> Harness {
    let workspace_root = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.workspace_root = workspace_root.path().to_path_buf();
    config.render.x264_preset = "ultrafast".to_string();
    configure(&mut config);

    let objects = Arc::new(MemoryObjectStore::new());
    let jobs = Arc::new(ObjectJobStore::new(objects.clone()));
    let runner = JobRunner::new(config, jobs.clone(), objects.clone());
    Harness {
        objects,
        jobs,
        runner,
        workspace_root,
    }
}

fn request(json: serde_json::Value) -> RenderRequest {
    serde_json::from_value(json).unwrap()
}

fn leftover_workspaces(root: &Path) -> usize {
    std::fs::read_dir(root)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("shortsmith-job-"))
        .count()
}

fn ffmpeg_available() -> bool {
    if command_exists("ffmpeg") && command_exists("ffprobe") {
        true
    } else {
        eprintln!("ffmpeg not found, skipping");
        false
    }
}

#[tokio::test]
async fn test_invalid_timeline_leaves_failed_marker() {
    let h = harness(|_| {});
    let outcome = h
        .runner
        .run(request(serde_json::json!({
            "output_key": "renders/bad.mp4",
            "video_tracks": [{ "url": "https://example.com/a.mp4", "start": -1.0 }]
        })))
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Failed);
    assert!(outcome.manifest.is_none());

    let snapshot = h.jobs.poll("renders/bad.mp4").await.unwrap();
    let status = snapshot.status.unwrap();
    assert_eq!(status.status, JobStatus::Failed);
    assert!(status.message.contains("start"));
    let error = snapshot.error.unwrap();
    assert_eq!(error.kind.as_deref(), Some("invalid_timeline"));
    assert!(snapshot.manifest.is_none());
    assert!(h.objects.get("renders/bad_error.json").await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_output_key_writes_nothing() {
    let h = harness(|_| {});
    let err = h
        .runner
        .run(request(serde_json::json!({ "output_key": "  " })))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_timeline");
    assert!(h.objects.is_empty().await);
}

#[tokio::test]
async fn test_placeholder_job_finishes_with_manifest() {
    if !ffmpeg_available() {
        return;
    }
    let h = harness(|_| {});
    let outcome = h
        .runner
        .run(request(serde_json::json!({
            "output_key": "renders/empty.mp4",
            "script": [{ "scene": 1, "line": "hello" }],
            "video_tracks": [{ "url": "/nonexistent/clip.mp4", "start": 0.0 }]
        })))
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Finished, "{:?}", outcome.error);
    let manifest = outcome.manifest.unwrap();
    assert_eq!(manifest.output_url, "memory://renders/empty.mp4");
    assert_eq!(manifest.script, serde_json::json!([{ "scene": 1, "line": "hello" }]));
    assert!(manifest.summary.placeholder);
    assert_eq!(manifest.summary.skipped_tracks.len(), 1);
    assert_eq!(manifest.summary.frames, 150);

    assert_eq!(
        h.objects.content_type("renders/empty.mp4").await.as_deref(),
        Some("video/mp4")
    );
    let snapshot = h.jobs.poll("renders/empty.mp4").await.unwrap();
    let status = snapshot.status.unwrap();
    assert_eq!(status.status, JobStatus::Finished);
    assert_eq!(status.percent, 100);
    assert_eq!(snapshot.manifest, Some(manifest));
    assert!(snapshot.error.is_none());

    assert_eq!(leftover_workspaces(h.workspace_root.path()), 0);
}

#[tokio::test]
async fn test_encoder_failure_leaves_failed_marker() {
    if !ffmpeg_available() {
        return;
    }
    let h = harness(|config| config.render.x264_preset = "no-such-preset".to_string());
    let outcome = h
        .runner
        .run(request(serde_json::json!({ "output_key": "renders/broken.mp4" })))
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Failed);
    let snapshot = h.jobs.poll("renders/broken.mp4").await.unwrap();
    assert_eq!(snapshot.status.unwrap().status, JobStatus::Failed);
    assert!(snapshot.error.is_some());
    assert!(snapshot.manifest.is_none());
    assert!(h.objects.get("renders/broken.mp4").await.unwrap().is_none());
    assert_eq!(leftover_workspaces(h.workspace_root.path()), 0);
}

/// Job store whose progress writes blow up mid-job.
struct PanickingProgress {
    inner: ObjectJobStore,
}

#[async_trait::async_trait]
impl JobStore for PanickingProgress {
    async fn create(&self, key: &str, timestamp: f64) -> ShortsmithResult<StatusMarker> {
        self.inner.create(key, timestamp).await
    }

    async fn read(&self, key: &str) -> ShortsmithResult<Option<StatusMarker>> {
        self.inner.read(key).await
    }

    async fn write_progress(&self, _key: &str, _marker: &StatusMarker) -> ShortsmithResult<()> {
        panic!("progress store exploded");
    }

    async fn write_terminal(&self, key: &str, marker: &StatusMarker) -> ShortsmithResult<()> {
        self.inner.write_terminal(key, marker).await
    }

    async fn write_manifest(&self, key: &str, manifest: &Manifest) -> ShortsmithResult<()> {
        self.inner.write_manifest(key, manifest).await
    }

    async fn write_error(&self, key: &str, error: &ErrorMarker) -> ShortsmithResult<()> {
        self.inner.write_error(key, error).await
    }

    async fn poll(&self, key: &str) -> ShortsmithResult<JobSnapshot> {
        self.inner.poll(key).await
    }
}

#[tokio::test]
async fn test_panic_inside_job_leaves_failed_marker() {
    let workspace_root = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.workspace_root = workspace_root.path().to_path_buf();

    let objects = Arc::new(MemoryObjectStore::new());
    let jobs = Arc::new(PanickingProgress {
        inner: ObjectJobStore::new(objects.clone()),
    });
    let runner = JobRunner::new(config, jobs.clone(), objects.clone());

    let outcome = runner
        .run(request(serde_json::json!({ "output_key": "renders/panic.mp4" })))
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Failed);
    assert!(outcome.manifest.is_none());
    assert!(outcome.error.unwrap().contains("panicked"));

    let snapshot = jobs.poll("renders/panic.mp4").await.unwrap();
    let status = snapshot.status.unwrap();
    assert_eq!(status.status, JobStatus::Failed);
    assert!(status.message.contains("progress store exploded"));
    let error = snapshot.error.unwrap();
    assert_eq!(error.kind.as_deref(), Some("composition"));
    assert!(snapshot.manifest.is_none());
    assert_eq!(leftover_workspaces(workspace_root.path()), 0);
}
