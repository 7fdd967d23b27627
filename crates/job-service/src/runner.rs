//! One render job from submission to terminal marker.

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures_util::FutureExt;
use shortsmith_common::{unix_timestamp_secs, AppConfig, ShortsmithError, ShortsmithResult};
use shortsmith_render_engine::{
    fetch_assets, render_timeline, AssetResolver, ProgressCallback, RenderJob, RenderProgress,
};
use shortsmith_timeline_model::{JobStatus, Manifest, Milestone, RenderRequest, Timeline};

use crate::jobs::JobStore;
use crate::publisher::JobStatusPublisher;
use crate::store::{ObjectStore, CONTENT_TYPE_MP4};

/// How a job ended.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub key: String,
    pub status: JobStatus,
    pub manifest: Option<Manifest>,
    /// Display of the fatal error, for failed jobs.
    pub error: Option<String>,
}

/// Runs render jobs against a job store and an object store.
pub struct JobRunner {
    config: AppConfig,
    jobs: Arc<dyn JobStore>,
    objects: Arc<dyn ObjectStore>,
}

impl JobRunner {
    pub fn new(config: AppConfig, jobs: Arc<dyn JobStore>, objects: Arc<dyn ObjectStore>) -> Self {
        if !config.render.is_standard_output() {
            tracing::warn!(
                fps = config.render.fps,
                width = config.render.width,
                height = config.render.height,
                "Rendering with a non-standard canvas or frame rate"
            );
        }
        Self {
            config,
            jobs,
            objects,
        }
    }

    /// Run one job. Every exit after the Started marker leaves a terminal
    /// marker; `Err` means not even that could be written.
    pub async fn run(&self, request: RenderRequest) -> ShortsmithResult<JobOutcome> {
        let key = request.output_key.trim().to_string();
        if key.is_empty() {
            return Err(ShortsmithError::invalid_timeline("output_key must not be empty"));
        }

        let mut publisher = JobStatusPublisher::new(self.jobs.clone(), key.clone());
        publisher.start().await?;

        let result = AssertUnwindSafe(self.execute(&mut publisher, request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_error("Job", panic)));

        match result {
            Ok(manifest) => Ok(JobOutcome {
                key,
                status: JobStatus::Finished,
                manifest: Some(manifest),
                error: None,
            }),
            Err(err) => {
                if !publisher.state().is_terminal() {
                    publisher.fail(&err).await?;
                }
                Ok(JobOutcome {
                    key,
                    status: JobStatus::Failed,
                    manifest: None,
                    error: Some(err.to_string()),
                })
            }
        }
    }

    async fn execute(
        &self,
        publisher: &mut JobStatusPublisher,
        request: RenderRequest,
    ) -> ShortsmithResult<Manifest> {
        let timeline = Timeline::from_request(&request)
            .map_err(|e| ShortsmithError::invalid_timeline(e.to_string()))?;
        let key = timeline.output_key.clone();

        std::fs::create_dir_all(&self.config.workspace_root)?;
        let workspace = tempfile::Builder::new()
            .prefix("shortsmith-job-")
            .tempdir_in(&self.config.workspace_root)?;
        tracing::debug!(key = %key, workspace = %workspace.path().display(), "Created job workspace");

        publish(publisher, Milestone::DownloadingAssets).await;
        let resolver = AssetResolver::new(workspace.path().join("assets"), &self.config.fetch)?;
        let assets = fetch_assets(&timeline, &resolver).await;

        let job = RenderJob {
            timeline,
            assets,
            workspace: workspace.path().to_path_buf(),
            output_path: workspace.path().join("output.mp4"),
            render: self.config.render.clone(),
            fonts: self.config.fonts.clone(),
        };

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<RenderProgress>();
        let render = tokio::task::spawn_blocking(move || {
            let progress: ProgressCallback = Box::new(move |p: RenderProgress| {
                let _ = tx.send(p);
            });
            render_timeline(&job, Some(progress))
        });

        // The channel closes when the render drops its callback.
        while let Some(progress) = rx.recv().await {
            publish(publisher, progress.milestone).await;
        }
        let report = render
            .await
            .map_err(|e| match e.try_into_panic() {
                Ok(panic) => panic_error("Render", panic),
                Err(e) => ShortsmithError::composition(format!("Render task failed: {e}")),
            })??;

        publish(publisher, Milestone::Uploading).await;
        self.upload_output(&key, &report.output_path).await?;

        let manifest = Manifest {
            status: JobStatus::Finished,
            output_url: self.objects.url_for(&key),
            key: key.clone(),
            script: request.script,
            summary: report.summary,
            timestamp: unix_timestamp_secs(),
        };
        publisher.finish(&manifest).await?;
        Ok(manifest)
    }

    async fn upload_output(&self, key: &str, path: &Path) -> ShortsmithResult<()> {
        self.objects
            .put_file(key, path, CONTENT_TYPE_MP4)
            .await
            .map_err(|e| match e {
                ShortsmithError::Upload { .. } => e,
                other => ShortsmithError::upload(format!("Failed to upload {key}: {other}")),
            })?;
        tracing::info!(key, store = self.objects.name(), "Uploaded output");
        Ok(())
    }
}

/// Progress markers are advisory; a failed write is logged and the job goes on.
async fn publish(publisher: &mut JobStatusPublisher, milestone: Milestone) {
    if let Err(err) = publisher.milestone(milestone).await {
        tracing::warn!(key = %publisher.key(), milestone = ?milestone, error = %err, "Failed to publish milestone");
    }
}

fn panic_error(stage: &str, panic: Box<dyn std::any::Any + Send>) -> ShortsmithError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    ShortsmithError::composition(format!("{stage} panicked: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_error_message() {
        let err = panic_error("Render", Box::new("index out of bounds"));
        assert_eq!(err.kind(), "composition");
        assert!(err.to_string().contains("Render panicked: index out of bounds"));

        let err = panic_error("Job", Box::new(String::from("boom")));
        assert!(err.to_string().contains("boom"));

        let err = panic_error("Job", Box::new(7u32));
        assert!(err.to_string().contains("non-string"));
    }
}
