//! Shortsmith Processing Core
//!
//! The arithmetic behind a render, independent of codecs and fonts:
//! - **Normalize:** z-order, trim policy, and timeline extent
//! - **Framing:** scale-and-crop plan onto the 1080x1920 canvas
//! - **Text layout:** greedy wrap inside the safe width
//! - **Animation:** per-frame transforms for text layers
//! - **Audio mix:** positioned, gain-scaled PCM summing
//!
//! This crate is pure computation: no I/O, no subprocesses.

pub mod animation;
pub mod audio_mix;
pub mod framing;
pub mod normalize;
pub mod text_layout;

pub use animation::{layer_seed, place_bitmap, transform_at, LayerTransform, PlacedRect};
pub use audio_mix::PcmBuffer;
pub use framing::{FramingPlan, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use normalize::{
    place_media, sort_by_track_index, still_duration, timeline_duration, trim_window, Placement,
    TrimWindow, DEFAULT_STILL_DURATION_SECS,
};
pub use text_layout::{layout_text, text_width, wrap_text, GlyphMetrics, LineLayout, TextLayout};
