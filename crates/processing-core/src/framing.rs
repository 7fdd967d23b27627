//! 9:16 portrait framing.
//!
//! Every video layer goes through the same fixed pipeline: scale to the
//! canvas height, widen if that leaves the frame too narrow, then crop the
//! horizontal center at full height.

use serde::{Deserialize, Serialize};

/// Output canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 1080;
/// Output canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 1920;

/// Resize-then-crop recipe that maps a source frame onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramingPlan {
    pub source_width: u32,
    pub source_height: u32,
    /// Size after scaling, before cropping.
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Top-left of the crop window inside the scaled frame.
    pub crop_x: u32,
    pub crop_y: u32,
    pub out_width: u32,
    pub out_height: u32,
}

impl FramingPlan {
    /// Plan for the default 1080x1920 canvas.
    pub fn vertical(source_width: u32, source_height: u32) -> Self {
        Self::for_canvas(source_width, source_height, CANVAS_WIDTH, CANVAS_HEIGHT)
    }

    pub fn for_canvas(source_width: u32, source_height: u32, out_width: u32, out_height: u32) -> Self {
        let sw = source_width.max(1) as f64;
        let sh = source_height.max(1) as f64;

        // (1) fit height
        let mut scaled_height = out_height;
        let mut scaled_width = (sw * out_height as f64 / sh).round().max(1.0) as u32;

        // (2) too narrow: fit width instead
        if scaled_width < out_width {
            scaled_width = out_width;
            scaled_height = (sh * out_width as f64 / sw).round().max(out_height as f64) as u32;
        }

        // (3) center crop horizontally, anchored at the top
        let crop_x = (scaled_width - out_width) / 2;

        Self {
            source_width,
            source_height,
            scaled_width,
            scaled_height,
            crop_x,
            crop_y: 0,
            out_width,
            out_height,
        }
    }

    /// Equivalent ffmpeg filter chain (`scale` followed by `crop`).
    pub fn ffmpeg_filter(&self) -> String {
        format!(
            "scale={}:{}:flags=lanczos,crop={}:{}:{}:{}",
            self.scaled_width,
            self.scaled_height,
            self.out_width,
            self.out_height,
            self.crop_x,
            self.crop_y
        )
    }

    pub fn is_identity(&self) -> bool {
        self.source_width == self.out_width
            && self.source_height == self.out_height
            && self.crop_x == 0
    }
}
