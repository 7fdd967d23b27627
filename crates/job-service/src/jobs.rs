//! Job markers on top of an [`ObjectStore`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use shortsmith_common::{ShortsmithError, ShortsmithResult};
use shortsmith_timeline_model::{
    error_key, result_key, status_key, ErrorMarker, Manifest, Milestone, StatusMarker,
};

use crate::store::{ObjectStore, CONTENT_TYPE_JSON};

/// Everything a poller can see for one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSnapshot {
    pub status: Option<StatusMarker>,
    pub manifest: Option<Manifest>,
    pub error: Option<ErrorMarker>,
}

impl JobSnapshot {
    /// True once a `finished` or `failed` status is visible.
    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.status.is_terminal())
    }
}

/// Persistent job records, keyed by output key.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Clear markers from a previous run of `key` and write the Started marker.
    async fn create(&self, key: &str, timestamp: f64) -> ShortsmithResult<StatusMarker>;

    /// Current status marker.
    async fn read(&self, key: &str) -> ShortsmithResult<Option<StatusMarker>>;

    /// Replace the status marker with a non-terminal one.
    async fn write_progress(&self, key: &str, marker: &StatusMarker) -> ShortsmithResult<()>;

    /// Replace the status marker with a terminal one.
    async fn write_terminal(&self, key: &str, marker: &StatusMarker) -> ShortsmithResult<()>;

    async fn write_manifest(&self, key: &str, manifest: &Manifest) -> ShortsmithResult<()>;

    async fn write_error(&self, key: &str, error: &ErrorMarker) -> ShortsmithResult<()>;

    /// Status, manifest, and error marker together.
    async fn poll(&self, key: &str) -> ShortsmithResult<JobSnapshot>;
}

/// [`JobStore`] writing JSON markers next to the output key.
#[derive(Clone)]
pub struct ObjectJobStore {
    objects: Arc<dyn ObjectStore>,
}

impl ObjectJobStore {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> ShortsmithResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.objects.put(key, bytes, CONTENT_TYPE_JSON).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> ShortsmithResult<Option<T>> {
        match self.objects.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                ShortsmithError::storage(format!("Corrupt marker at {key}: {e}"))
            }),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl JobStore for ObjectJobStore {
    async fn create(&self, key: &str, timestamp: f64) -> ShortsmithResult<StatusMarker> {
        for stale in [result_key(key), error_key(key)] {
            self.objects.delete(&stale).await?;
        }
        let marker = StatusMarker::for_milestone(Milestone::Started, timestamp);
        self.put_json(&status_key(key), &marker).await?;
        Ok(marker)
    }

    async fn read(&self, key: &str) -> ShortsmithResult<Option<StatusMarker>> {
        self.get_json(&status_key(key)).await
    }

    async fn write_progress(&self, key: &str, marker: &StatusMarker) -> ShortsmithResult<()> {
        if marker.status.is_terminal() {
            return Err(ShortsmithError::job_state(format!(
                "Progress write for {key} carries terminal status {}",
                marker.status.as_str()
            )));
        }
        self.put_json(&status_key(key), marker).await
    }

    async fn write_terminal(&self, key: &str, marker: &StatusMarker) -> ShortsmithResult<()> {
        if !marker.status.is_terminal() {
            return Err(ShortsmithError::job_state(format!(
                "Terminal write for {key} carries non-terminal status {}",
                marker.status.as_str()
            )));
        }
        self.put_json(&status_key(key), marker).await
    }

    async fn write_manifest(&self, key: &str, manifest: &Manifest) -> ShortsmithResult<()> {
        self.put_json(&result_key(key), manifest).await
    }

    async fn write_error(&self, key: &str, error: &ErrorMarker) -> ShortsmithResult<()> {
        self.put_json(&error_key(key), error).await
    }

    async fn poll(&self, key: &str) -> ShortsmithResult<JobSnapshot> {
        Ok(JobSnapshot {
            status: self.read(key).await?,
            manifest: self.get_json(&result_key(key)).await?,
            error: self.get_json(&error_key(key)).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use shortsmith_timeline_model::JobStatus;

    fn store() -> (Arc<MemoryObjectStore>, ObjectJobStore) {
        let objects = Arc::new(MemoryObjectStore::new());
        let jobs = ObjectJobStore::new(objects.clone());
        (objects, jobs)
    }

    #[tokio::test]
    async fn test_create_writes_started_marker() {
        let (objects, jobs) = store();
        let marker = jobs.create("renders/a.mp4", 10.0).await.unwrap();
        assert_eq!(marker.percent, 0);
        assert_eq!(marker.message, "Starting render");
        assert_eq!(marker.status, JobStatus::Processing);

        assert_eq!(jobs.read("renders/a.mp4").await.unwrap(), Some(marker));
        assert_eq!(
            objects.content_type("renders/a.mp4_status.json").await.as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_create_clears_previous_run() {
        let (objects, jobs) = store();
        objects.put("renders/a_error.json", b"{}".to_vec(), "application/json").await.unwrap();
        objects.put("renders/a.mp4_result.json", b"{}".to_vec(), "application/json").await.unwrap();

        jobs.create("renders/a.mp4", 1.0).await.unwrap();
        let snapshot = jobs.poll("renders/a.mp4").await.unwrap();
        assert!(snapshot.error.is_none());
        assert!(snapshot.manifest.is_none());
        assert!(!snapshot.is_terminal());
    }

    #[tokio::test]
    async fn test_status_kind_is_checked() {
        let (_, jobs) = store();
        let terminal = StatusMarker::failed("boom", 40, 1.0);
        let progress = StatusMarker::for_milestone(Milestone::Encoding, 1.0);

        let err = jobs.write_progress("a.mp4", &terminal).await.unwrap_err();
        assert_eq!(err.kind(), "job_state");
        let err = jobs.write_terminal("a.mp4", &progress).await.unwrap_err();
        assert_eq!(err.kind(), "job_state");

        jobs.write_progress("a.mp4", &progress).await.unwrap();
        jobs.write_terminal("a.mp4", &terminal).await.unwrap();
        assert_eq!(jobs.read("a.mp4").await.unwrap(), Some(terminal));
    }

    #[tokio::test]
    async fn test_corrupt_marker_is_storage_error() {
        let (objects, jobs) = store();
        objects.put("a.mp4_status.json", b"not json".to_vec(), "application/json").await.unwrap();
        let err = jobs.read("a.mp4").await.unwrap_err();
        assert_eq!(err.kind(), "storage");
    }

    #[tokio::test]
    async fn test_error_marker_lands_at_base_name() {
        let (objects, jobs) = store();
        let marker = ErrorMarker {
            error: "Encode error: boom".to_string(),
            traceback: "Encode error: boom".to_string(),
            status: JobStatus::Failed,
            kind: Some("encode".to_string()),
            timestamp: 3.0,
        };
        jobs.write_error("renders/a.mp4", &marker).await.unwrap();
        assert!(objects.get("renders/a_error.json").await.unwrap().is_some());
        assert_eq!(jobs.poll("renders/a.mp4").await.unwrap().error, Some(marker));
    }
}
