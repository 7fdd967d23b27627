//! In-process job state, and the markers it publishes.

use std::sync::Arc;

use shortsmith_common::{unix_timestamp_secs, ShortsmithError, ShortsmithResult};
use shortsmith_timeline_model::{ErrorMarker, JobStatus, Manifest, Milestone, StatusMarker};

use crate::jobs::JobStore;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Nothing published yet.
    Pending,
    Processing(Milestone),
    Finished,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed)
    }

    /// Percent of the last published milestone.
    pub fn percent(&self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::Processing(m) => m.percent(),
            JobState::Finished => Milestone::Complete.percent(),
            JobState::Failed => 0,
        }
    }
}

/// Writes status markers for one job.
///
/// Milestones only move forward; repeats are dropped. Once a terminal marker
/// is written every further publish fails with a job state error.
pub struct JobStatusPublisher {
    jobs: Arc<dyn JobStore>,
    key: String,
    state: JobState,
}

impl JobStatusPublisher {
    pub fn new(jobs: Arc<dyn JobStore>, key: impl Into<String>) -> Self {
        Self {
            jobs,
            key: key.into(),
            state: JobState::Pending,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn ensure_open(&self, action: &str) -> ShortsmithResult<()> {
        if self.state.is_terminal() {
            return Err(ShortsmithError::job_state(format!(
                "Cannot {action} job {}: already {:?}",
                self.key, self.state
            )));
        }
        Ok(())
    }

    /// Clear any previous run and publish the Started marker.
    pub async fn start(&mut self) -> ShortsmithResult<()> {
        self.ensure_open("start")?;
        if self.state != JobState::Pending {
            return Err(ShortsmithError::job_state(format!(
                "Job {} already started",
                self.key
            )));
        }
        self.jobs.create(&self.key, unix_timestamp_secs()).await?;
        self.state = JobState::Processing(Milestone::Started);
        tracing::info!(key = %self.key, "Job started");
        Ok(())
    }

    /// Publish a progress milestone. Returns whether a marker was written.
    pub async fn milestone(&mut self, milestone: Milestone) -> ShortsmithResult<bool> {
        self.ensure_open("publish progress for")?;
        if milestone == Milestone::Complete {
            return Err(ShortsmithError::job_state(
                "Completion must be published with finish()",
            ));
        }
        if let JobState::Processing(last) = self.state {
            if milestone <= last {
                return Ok(false);
            }
        }

        let marker = StatusMarker::for_milestone(milestone, unix_timestamp_secs());
        self.jobs.write_progress(&self.key, &marker).await?;
        self.state = JobState::Processing(milestone);
        tracing::info!(
            key = %self.key,
            milestone = ?milestone,
            percent = marker.percent,
            "Milestone published"
        );
        Ok(true)
    }

    /// Write the manifest, then the terminal `finished` marker.
    pub async fn finish(&mut self, manifest: &Manifest) -> ShortsmithResult<()> {
        self.ensure_open("finish")?;
        self.jobs.write_manifest(&self.key, manifest).await?;
        let marker = StatusMarker::for_milestone(Milestone::Complete, unix_timestamp_secs());
        self.jobs.write_terminal(&self.key, &marker).await?;
        self.state = JobState::Finished;
        tracing::info!(key = %self.key, url = %manifest.output_url, "Job finished");
        Ok(())
    }

    /// Write the error marker and the terminal `failed` marker.
    ///
    /// Both writes are attempted even if the first one fails; the first
    /// storage error is returned.
    pub async fn fail(&mut self, error: &ShortsmithError) -> ShortsmithResult<()> {
        self.ensure_open("fail")?;
        let timestamp = unix_timestamp_secs();
        let percent = self.state.percent();

        let marker = ErrorMarker {
            error: error.to_string(),
            traceback: error_chain(error),
            status: JobStatus::Failed,
            kind: Some(error.kind().to_string()),
            timestamp,
        };
        let error_write = self.jobs.write_error(&self.key, &marker).await;

        let status = StatusMarker::failed(error.to_string(), percent, timestamp);
        let status_write = self.jobs.write_terminal(&self.key, &status).await;

        if status_write.is_ok() {
            self.state = JobState::Failed;
        }
        tracing::error!(
            key = %self.key,
            kind = error.kind(),
            percent,
            error = %error,
            "Job failed"
        );
        error_write.and(status_write)
    }
}

/// Display of `error` and each of its sources, one per line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}
