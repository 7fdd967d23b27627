//! Object storage seam.
//!
//! Markers, manifests, and encoded output all go through an [`ObjectStore`].
//! Source assets do not: they are fetched over plain HTTP.

mod fs;
mod memory;

use std::path::Path;

use shortsmith_common::{ShortsmithError, ShortsmithResult};

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_MP4: &str = "video/mp4";

/// Key/value blob storage.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, or `None` if the key does not exist.
    async fn get(&self, key: &str) -> ShortsmithResult<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ShortsmithResult<()>;

    /// Remove `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> ShortsmithResult<()>;

    /// Keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> ShortsmithResult<Vec<String>>;

    /// Public URL of `key`.
    fn url_for(&self, key: &str) -> String;

    /// Backend name.
    fn name(&self) -> &str;

    /// Upload a local file.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> ShortsmithResult<()> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ShortsmithError::upload(format!("Failed to read {}: {e}", path.display()))
        })?;
        self.put(key, bytes, content_type).await
    }
}

/// Reject keys that could escape the store's namespace.
pub(crate) fn validate_key(key: &str) -> ShortsmithResult<&str> {
    let key = key.trim();
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(ShortsmithError::storage(format!("Invalid object key: {key:?}")));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert_eq!(validate_key("renders/a.mp4").unwrap(), "renders/a.mp4");
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("a/../b").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("a\\b").is_err());
    }
}
