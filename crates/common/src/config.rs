//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ShortsmithError, ShortsmithResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory of the filesystem object store.
    pub storage_root: PathBuf,

    /// Parent directory for per-job temporary workspaces.
    pub workspace_root: PathBuf,

    /// Prefix used to build the manifest `output_url` (e.g. a public bucket URL).
    pub public_base_url: Option<String>,

    /// Render and encode parameters.
    pub render: RenderConfig,

    /// Font lookup locations.
    pub fonts: FontConfig,

    /// Remote asset fetching.
    pub fetch: FetchConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Output canvas and encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output frame rate.
    pub fps: u32,

    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// Encoder worker threads (passed through to libx264).
    pub encoder_threads: u32,

    /// libx264 preset.
    pub x264_preset: String,

    /// Audio sample rate used for mixing and encoding.
    pub audio_sample_rate: u32,

    /// Video bitrate in kbps (0 = constant-quality default).
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,
}

/// Where fonts are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directory holding the packaged font files (`Montserrat-Bold.ttf`, ...).
    pub fonts_dir: PathBuf,

    /// System bold sans candidates, tried in order.
    pub system_fallbacks: Vec<PathBuf>,
}

/// Remote asset fetch parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum downloads in flight.
    pub concurrency: usize,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Accept `file://` URLs and bare paths as track sources. Off for
    /// submitted timelines; the CLI turns it on for local renders.
    pub allow_local_sources: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "shortsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: data_dir().join("storage"),
            workspace_root: std::env::temp_dir(),
            public_base_url: None,
            render: RenderConfig::default(),
            fonts: FontConfig::default(),
            fetch: FetchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: Self::STANDARD_FPS,
            width: Self::STANDARD_SIZE.0,
            height: Self::STANDARD_SIZE.1,
            encoder_threads: 4,
            x264_preset: "fast".to_string(),
            audio_sample_rate: 44100,
            video_bitrate_kbps: 0,
            audio_bitrate_kbps: 192,
        }
    }
}

impl RenderConfig {
    /// Canvas and frame rate every published render is expected to use.
    pub const STANDARD_FPS: u32 = 30;
    pub const STANDARD_SIZE: (u32, u32) = (1080, 1920);

    /// Whether fps and canvas match the standard vertical output.
    pub fn is_standard_output(&self) -> bool {
        self.fps == Self::STANDARD_FPS && (self.width, self.height) == Self::STANDARD_SIZE
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            fonts_dir: PathBuf::from("/usr/share/fonts/truetype/custom"),
            system_fallbacks: vec![
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/freefont/FreeSansBold.ttf"),
            ],
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_secs: 60,
            allow_local_sources: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %config_path.display(), error = %e, "Failed to load config, using defaults");
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> ShortsmithResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShortsmithError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ShortsmithError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if !config.render.is_standard_output() {
            tracing::warn!(
                path = %path.display(),
                fps = config.render.fps,
                width = config.render.width,
                height = config.render.height,
                "Render output differs from the standard 1080x1920 at 30 fps"
            );
        }
        Ok(config)
    }
}

/// `$XDG_CONFIG_HOME/shortsmith/config.json`, or under `~/.config`.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("shortsmith").join("config.json")
}

fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("shortsmith")
}
