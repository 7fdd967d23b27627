//! Error types shared across Shortsmith crates.

use std::path::PathBuf;

/// Top-level error type for Shortsmith operations.
///
/// Asset and text-render variants are recoverable: the job skips the
/// offending track (or degrades the text) and keeps going. Everything else
/// aborts the job and must end in a `failed` marker.
#[derive(Debug, thiserror::Error)]
pub enum ShortsmithError {
    #[error("Asset download error: {message}")]
    AssetDownload { message: String },

    #[error("Asset decode error: {message}")]
    AssetDecode { message: String },

    #[error("Text render error: {message}")]
    TextRender { message: String },

    #[error("Composition error: {message}")]
    Composition { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Upload error: {message}")]
    Upload { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Invalid timeline: {message}")]
    InvalidTimeline { message: String },

    #[error("Job state error: {message}")]
    JobState { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ShortsmithError.
pub type ShortsmithResult<T> = Result<T, ShortsmithError>;

impl ShortsmithError {
    pub fn asset_download(msg: impl Into<String>) -> Self {
        Self::AssetDownload {
            message: msg.into(),
        }
    }

    pub fn asset_decode(msg: impl Into<String>) -> Self {
        Self::AssetDecode {
            message: msg.into(),
        }
    }

    pub fn text_render(msg: impl Into<String>) -> Self {
        Self::TextRender {
            message: msg.into(),
        }
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload {
            message: msg.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage {
            message: msg.into(),
        }
    }

    pub fn invalid_timeline(msg: impl Into<String>) -> Self {
        Self::InvalidTimeline {
            message: msg.into(),
        }
    }

    pub fn job_state(msg: impl Into<String>) -> Self {
        Self::JobState {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error must abort the job.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::AssetDownload { .. } | Self::AssetDecode { .. } | Self::TextRender { .. }
        )
    }

    /// Stable snake_case name, written into persisted error markers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetDownload { .. } => "asset_download",
            Self::AssetDecode { .. } => "asset_decode",
            Self::TextRender { .. } => "text_render",
            Self::Composition { .. } => "composition",
            Self::Encode { .. } => "encode",
            Self::Upload { .. } => "upload",
            Self::Storage { .. } => "storage",
            Self::InvalidTimeline { .. } => "invalid_timeline",
            Self::JobState { .. } => "job_state",
            Self::Config { .. } => "config",
            Self::FileNotFound { .. } => "file_not_found",
            Self::Unsupported { .. } => "unsupported",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}
