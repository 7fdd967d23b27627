use std::collections::BTreeMap;

use shortsmith_common::ShortsmithResult;
use tokio::sync::RwLock;

use super::{validate_key, ObjectStore};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-process store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for `key`.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> ShortsmithResult<Option<Vec<u8>>> {
        let key = validate_key(key)?;
        Ok(self.objects.read().await.get(key).map(|o| o.bytes.clone()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ShortsmithResult<()> {
        let key = validate_key(key)?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> ShortsmithResult<()> {
        let key = validate_key(key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> ShortsmithResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn url_for(&self, key: &str) -> String {
        format!("memory://{key}")
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryObjectStore::new();
        store.put("a/b.mp4", vec![9], "video/mp4").await.unwrap();
        assert_eq!(store.get("a/b.mp4").await.unwrap(), Some(vec![9]));
        assert_eq!(store.content_type("a/b.mp4").await.as_deref(), Some("video/mp4"));
        assert_eq!(store.list("a/").await.unwrap(), vec!["a/b.mp4".to_string()]);
        store.delete("a/b.mp4").await.unwrap();
        assert!(store.is_empty().await);
    }
}
