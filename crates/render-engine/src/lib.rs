//! Shortsmith Render Engine
//!
//! Offline rendering of a timeline into a 1080x1920 H.264 file.
//!
//! # Pipeline Architecture
//!
//! ```text
//! video tracks ──► fetch ──► probe/frame ──► video layers ─┐
//!                                  │                       │
//!                                  └─ embedded audio ──┐   │
//! audio tracks ──► fetch ──► probe/trim ───────────────┤   │
//!                                                      ▼   │
//!                                                  mixdown │
//! text tracks ──► fonts ──► layout ──► raster ──► overlays ┤
//!                                                      │   ▼
//!                                                      │ composite (30 fps)
//!                                                      ▼   │
//!                                                Encode (H.264 + AAC)
//!                                                          │
//!                                                          ▼
//!                                                      output.mp4
//! ```

pub mod assets;
pub mod audio;
pub mod compositor;
pub mod export;
pub mod ffmpeg;
pub mod pipeline;
pub mod text;
pub mod video_layers;

pub use assets::{infer_extension, AssetRequest, AssetResolver};
pub use ffmpeg::{command_exists, probe_media, MediaInfo};
pub use pipeline::{
    fetch_assets, render_timeline, FetchedAssets, ProgressCallback, RenderJob, RenderProgress,
    RenderReport,
};
