//! Asset fetching into the per-job workspace.
//!
//! Track sources are pre-signed HTTP URLs. Local paths are only honored
//! when [`FetchConfig::allow_local_sources`] is set. Failures never abort
//! the job: the affected track is reported as unresolved and skipped
//! downstream.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use shortsmith_common::{FetchConfig, ShortsmithError, ShortsmithResult};
use tokio::io::AsyncWriteExt;

/// Extension used when a URL does not carry a usable one.
pub const DEFAULT_EXTENSION: &str = ".mp4";

/// One source to fetch, saved as `<prefix><ext>` inside the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub url: String,
    pub prefix: String,
}

impl AssetRequest {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: prefix.into(),
        }
    }
}

/// Downloads assets with bounded concurrency.
pub struct AssetResolver {
    client: reqwest::Client,
    dir: PathBuf,
    concurrency: usize,
    allow_local: bool,
}

impl AssetResolver {
    pub fn new(dir: impl Into<PathBuf>, config: &FetchConfig) -> ShortsmithResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ShortsmithError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            dir: dir.into(),
            concurrency: config.concurrency.max(1),
            allow_local: config.allow_local_sources,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fetch every request, at most `concurrency` at a time.
    ///
    /// Results come back in request order whatever the completion order.
    pub async fn resolve_all(&self, requests: &[AssetRequest]) -> Vec<Option<PathBuf>> {
        stream::iter(requests)
            .map(|req| self.resolve(req))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Fetch one asset, or `None` if it is unavailable.
    pub async fn resolve(&self, request: &AssetRequest) -> Option<PathBuf> {
        let url = request.url.trim();

        if let Some(local) = local_source(url) {
            if !self.allow_local {
                tracing::warn!(source = %url, "Local asset sources are disabled, skipping track");
                return None;
            }
            return match tokio::fs::metadata(&local).await {
                Ok(meta) if meta.is_file() && meta.len() > 0 => Some(local),
                _ => {
                    tracing::warn!(path = %local.display(), "Local asset missing or empty, skipping");
                    None
                }
            };
        }

        let dest = self
            .dir
            .join(format!("{}{}", request.prefix, infer_extension(url)));

        if let Ok(meta) = tokio::fs::metadata(&dest).await {
            if meta.len() > 0 {
                tracing::debug!(path = %dest.display(), "Asset already downloaded");
                return Some(dest);
            }
        }

        let started = std::time::Instant::now();
        match self.download(url, &dest).await {
            Ok(bytes) => {
                tracing::info!(
                    url = %redact_url(url),
                    path = %dest.display(),
                    bytes,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Downloaded asset"
                );
                Some(dest)
            }
            Err(err) => {
                tracing::warn!(url = %redact_url(url), error = %err, "Asset download failed, skipping track");
                tokio::fs::remove_file(&dest).await.ok();
                None
            }
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> ShortsmithResult<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ShortsmithError::asset_download(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ShortsmithError::asset_download(format!(
                "HTTP {}",
                response.status()
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| ShortsmithError::asset_download(format!("Body read failed: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(ShortsmithError::asset_download("Empty response body"));
        }
        Ok(written)
    }
}

/// File extension (with leading dot) for a source URL.
///
/// Query and fragment are ignored. The text after the last `.` of the final
/// path segment is used when it is 1 to 4 characters long; anything else
/// falls back to [`DEFAULT_EXTENSION`].
pub fn infer_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path.split_once("://").map_or(path, |(_, rest)| {
        rest.find('/').map_or("", |slash| &rest[slash..])
    });
    let segment = path.rsplit('/').next().unwrap_or_default();

    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=4).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Local path for `file://` URLs and bare filesystem paths.
pub fn local_source(url: &str) -> Option<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if url.contains("://") {
        return None;
    }
    Some(PathBuf::from(url))
}

/// URL without its query string, which carries signing credentials.
pub fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 origin: `/clip.mp4` has a body, `/empty.mp4` is an
    /// empty 200, anything else is a 404. Returns the base URL.
    async fn serve_assets(hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let hits = hits.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    hits.fetch_add(1, Ordering::SeqCst);

                    let request = String::from_utf8_lossy(&request).to_string();
                    let target = request.split_whitespace().nth(1).unwrap_or("/");
                    let path = target.split('?').next().unwrap_or(target);
                    let (status, body): (&str, &[u8]) = match path {
                        "/clip.mp4" => ("200 OK", &b"fake mp4 payload"[..]),
                        "/empty.mp4" => ("200 OK", &b""[..]),
                        _ => ("404 Not Found", &b"not found"[..]),
                    };
                    let head = format!(
                        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    socket.write_all(head.as_bytes()).await.ok();
                    socket.write_all(body).await.ok();
                    socket.shutdown().await.ok();
                });
            }
        });

        format!("http://{addr}")
    }

    #[test]
    fn test_infer_extension_from_path() {
        assert_eq!(infer_extension("https://cdn.example.com/a/clip.MOV"), ".mov");
        assert_eq!(infer_extension("https://cdn.example.com/a/pic.jpeg?X-Sig=abc.def"), ".jpeg");
        assert_eq!(infer_extension("https://cdn.example.com/a/pic.png#frag.x"), ".png");
    }

    #[test]
    fn test_infer_extension_defaults_to_mp4() {
        // No extension in the last segment.
        assert_eq!(infer_extension("https://cdn.example.com/v1.2/stream"), ".mp4");
        // Trailing fragment after the dot is 6+ characters.
        assert_eq!(infer_extension("https://cdn.example.com/file.abcdef"), ".mp4");
        assert_eq!(infer_extension("https://cdn.example.com/file.abcde"), ".mp4");
        assert_eq!(infer_extension("https://cdn.example.com"), ".mp4");
        assert_eq!(infer_extension("https://cdn.example.com/"), ".mp4");
        assert_eq!(infer_extension("https://cdn.example.com/.hidden"), ".mp4");
    }

    #[test]
    fn test_infer_extension_four_chars_kept() {
        assert_eq!(infer_extension("https://x.io/p/photo.webp"), ".webp");
    }

    #[test]
    fn test_local_source_detection() {
        assert_eq!(local_source("file:///tmp/a.mp4"), Some(PathBuf::from("/tmp/a.mp4")));
        assert_eq!(local_source("/tmp/a.mp4"), Some(PathBuf::from("/tmp/a.mp4")));
        assert_eq!(local_source("https://x.io/a.mp4"), None);
    }

    #[test]
    fn test_redact_url_drops_query() {
        assert_eq!(redact_url("https://x.io/a.mp4?sig=secret"), "https://x.io/a.mp4");
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.mp4");
        let empty = dir.path().join("empty.mp4");
        std::fs::write(&a, b"aaaa").unwrap();
        std::fs::write(&b, b"bbbb").unwrap();
        std::fs::write(&empty, b"").unwrap();

        let config = FetchConfig {
            concurrency: 3,
            allow_local_sources: true,
            ..FetchConfig::default()
        };
        let resolver = AssetResolver::new(dir.path(), &config).unwrap();
        let requests = vec![
            AssetRequest::new(b.to_string_lossy(), "video_0"),
            AssetRequest::new(dir.path().join("missing.mp4").to_string_lossy(), "video_1"),
            AssetRequest::new(format!("file://{}", a.display()), "video_2"),
            AssetRequest::new(empty.to_string_lossy(), "audio_0"),
        ];

        let resolved = resolver.resolve_all(&requests).await;
        assert_eq!(resolved, vec![Some(b), None, Some(a), None]);
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = FetchConfig {
            concurrency: 1,
            timeout_secs: 2,
            ..FetchConfig::default()
        };
        let resolver = AssetResolver::new(dir.path(), &config).unwrap();
        let got = resolver
            .resolve(&AssetRequest::new("http://127.0.0.1:9/clip.mp4", "video_0"))
            .await;
        assert_eq!(got, None);
        assert!(!dir.path().join("video_0.mp4").exists());
    }

    #[tokio::test]
    async fn test_local_sources_refused_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("secret.txt");
        std::fs::write(&secret, b"do not read").unwrap();

        let resolver = AssetResolver::new(dir.path().join("assets"), &FetchConfig::default()).unwrap();
        let bare = resolver
            .resolve(&AssetRequest::new(secret.to_string_lossy(), "video_0"))
            .await;
        let file_url = resolver
            .resolve(&AssetRequest::new(format!("file://{}", secret.display()), "video_1"))
            .await;

        assert_eq!(bare, None);
        assert_eq!(file_url, None);
        assert!(!dir.path().join("assets").exists());
    }

    #[tokio::test]
    async fn test_http_failures_and_cache_reuse() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve_assets(hits.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let config = FetchConfig {
            concurrency: 1,
            timeout_secs: 5,
            ..FetchConfig::default()
        };
        let resolver = AssetResolver::new(dir.path(), &config).unwrap();

        let missing = resolver
            .resolve(&AssetRequest::new(format!("{base}/missing.mp4"), "v0"))
            .await;
        assert_eq!(missing, None);
        assert!(!dir.path().join("v0.mp4").exists());

        let empty = resolver
            .resolve(&AssetRequest::new(format!("{base}/empty.mp4"), "v1"))
            .await;
        assert_eq!(empty, None);
        assert!(!dir.path().join("v1.mp4").exists());

        let clip = AssetRequest::new(format!("{base}/clip.mp4?X-Signature=abc"), "v2");
        let first = resolver.resolve(&clip).await;
        assert_eq!(first, Some(dir.path().join("v2.mp4")));
        assert_eq!(std::fs::read(dir.path().join("v2.mp4")).unwrap(), b"fake mp4 payload");

        let again = resolver.resolve(&clip).await;
        assert_eq!(again, first);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
