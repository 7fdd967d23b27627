pub mod check;
pub mod render;
pub mod status;

use std::sync::Arc;

use shortsmith_common::AppConfig;
use shortsmith_job_service::{FsObjectStore, ObjectJobStore};

/// Filesystem object store and job store rooted at `config.storage_root`.
pub fn open_stores(config: &AppConfig) -> (Arc<FsObjectStore>, Arc<ObjectJobStore>) {
    let objects = Arc::new(
        FsObjectStore::new(&config.storage_root)
            .with_public_base_url(config.public_base_url.clone()),
    );
    let jobs = Arc::new(ObjectJobStore::new(objects.clone()));
    (objects, jobs)
}
