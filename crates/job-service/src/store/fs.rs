use std::path::{Path, PathBuf};

use shortsmith_common::{ShortsmithError, ShortsmithResult};

use super::{validate_key, ObjectStore};

/// Objects as files under a root directory.
///
/// Writes go to a temporary sibling and are renamed into place, so readers
/// never observe a half-written marker.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    pub fn with_public_base_url(mut self, base: Option<String>) -> Self {
        self.public_base_url = base.map(|b| b.trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> ShortsmithResult<PathBuf> {
        Ok(self.root.join(validate_key(key)?))
    }
}

fn storage_err(action: &str, path: &Path, err: std::io::Error) -> ShortsmithError {
    ShortsmithError::storage(format!("Failed to {action} {}: {err}", path.display()))
}

#[async_trait::async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> ShortsmithResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_err("read", &path, err)),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ShortsmithResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_err("create", parent, e))?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| storage_err("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_err("rename", &path, e))?;

        tracing::debug!(key, bytes = bytes.len(), content_type, "Stored object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> ShortsmithResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err("delete", &path, err)),
        }
    }

    async fn list(&self, prefix: &str) -> ShortsmithResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(storage_err("list", &dir, err)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| storage_err("list", &dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| storage_err("stat", &path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = rel.to_string_lossy().replace('\\', "/");
                if key.starts_with(prefix) && !key.ends_with(".partial") {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{key}"),
            None => format!("file://{}", self.root.join(key).display()),
        }
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("renders/a_status.json", b"{}".to_vec(), "application/json").await.unwrap();
        store.put("renders/a.mp4", vec![1, 2, 3], "video/mp4").await.unwrap();
        store.put("other/b.json", b"[]".to_vec(), "application/json").await.unwrap();

        assert_eq!(store.get("renders/a.mp4").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.get("renders/none").await.unwrap(), None);
        assert_eq!(
            store.list("renders/").await.unwrap(),
            vec!["renders/a.mp4".to_string(), "renders/a_status.json".to_string()]
        );

        store.delete("renders/a.mp4").await.unwrap();
        store.delete("renders/a.mp4").await.unwrap();
        assert_eq!(store.get("renders/a.mp4").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        store.put("k.json", b"1".to_vec(), "application/json").await.unwrap();
        store.put("k.json", b"2".to_vec(), "application/json").await.unwrap();
        assert_eq!(store.get("k.json").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.list("").await.unwrap(), vec!["k.json".to_string()]);
    }

    #[tokio::test]
    async fn test_escaping_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().join("store"));
        let err = store.put("../escape", vec![0], "text/plain").await.unwrap_err();
        assert_eq!(err.kind(), "storage");
    }

    #[test]
    fn test_url_for() {
        let store = FsObjectStore::new("/srv/store")
            .with_public_base_url(Some("https://cdn.example.com/".to_string()));
        assert_eq!(store.url_for("renders/a.mp4"), "https://cdn.example.com/renders/a.mp4");
        let local = FsObjectStore::new("/srv/store");
        assert_eq!(local.url_for("a.mp4"), "file:///srv/store/a.mp4");
    }
}
