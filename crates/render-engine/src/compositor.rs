//! Frame compositor: stacks video layers and text overlays on the canvas.
//!
//! Stacking order is fixed: opaque black, then video layers by ascending
//! `trackIndex` (ties keep declaration order), then text overlays in
//! declaration order.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use shortsmith_common::ShortsmithResult;
use shortsmith_processing_core::{place_bitmap, sort_by_track_index, transform_at};
use shortsmith_timeline_model::Rgba8;

use crate::text::TextOverlay;
use crate::video_layers::{LayerFrame, VideoLayer};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Source-over blend of `src` onto `dst` with extra `coverage` in `[0, 1]`.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba8, coverage: f32) {
    let sa = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        *dst = Rgba([src[0], src[1], src[2], 255]);
        return;
    }

    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let mixed = (src[c] as f32 * sa + dst.0[c] as f32 * da * (1.0 - sa)) / out_a;
        dst.0[c] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Draw `image` with its top-left at `(x, y)`, clipped to the canvas.
pub fn draw_image(canvas: &mut RgbaImage, image: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

    // Full-canvas opaque frames (decoded video) are copied wholesale.
    if x == 0
        && y == 0
        && opacity >= 1.0
        && image.dimensions() == canvas.dimensions()
        && image.pixels().all(|p| p.0[3] == 255)
    {
        canvas.copy_from_slice(image.as_raw());
        return;
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + image.width() as i64).min(cw);
    let y1 = (y + image.height() as i64).min(ch);
    for cy in y0..y1 {
        for cx in x0..x1 {
            let src = image.get_pixel((cx - x) as u32, (cy - y) as u32).0;
            if src[3] == 0 {
                continue;
            }
            blend_over(canvas.get_pixel_mut(cx as u32, cy as u32), src, opacity);
        }
    }
}

/// Draw one text overlay at local time `t`.
pub fn draw_text_overlay(canvas: &mut RgbaImage, overlay: &TextOverlay, t: f64) {
    let transform = transform_at(overlay.animation, t, overlay.seed);
    if !transform.is_visible() {
        return;
    }

    let rect = place_bitmap(
        overlay.position.x,
        overlay.position.y,
        canvas.dimensions(),
        overlay.image.dimensions(),
        &transform,
    );

    let scaled_w = rect.width.round() as u32;
    let scaled_h = rect.height.round() as u32;
    if scaled_w == 0 || scaled_h == 0 {
        return;
    }

    let scaled;
    let mut bitmap = &overlay.image;
    if (scaled_w, scaled_h) != overlay.image.dimensions() {
        scaled = image::imageops::resize(&overlay.image, scaled_w, scaled_h, FilterType::Triangle);
        bitmap = &scaled;
    }

    let (mut x, mut y) = (rect.x, rect.y);
    let rotated;
    if transform.rotation_deg.abs() > f64::EPSILON {
        let padded = pad_to_diagonal(bitmap);
        x -= (padded.width() as f64 - bitmap.width() as f64) / 2.0;
        y -= (padded.height() as f64 - bitmap.height() as f64) / 2.0;
        rotated = rotate_about_center(
            &padded,
            transform.rotation_deg.to_radians() as f32,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        );
        bitmap = &rotated;
    }

    draw_image(
        canvas,
        bitmap,
        x.round() as i64,
        y.round() as i64,
        transform.opacity as f32,
    );
}

/// Center `image` in a transparent square big enough to rotate freely.
fn pad_to_diagonal(image: &RgbaImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    let side = ((w as f64).hypot(h as f64)).ceil() as u32;
    let mut padded = RgbaImage::new(side, side);
    image::imageops::overlay(
        &mut padded,
        image,
        ((side - w) / 2) as i64,
        ((side - h) / 2) as i64,
    );
    padded
}

/// Owns the layer stack and the reusable canvas.
pub struct Compositor {
    canvas: RgbaImage,
    video: Vec<VideoLayer>,
    text: Vec<TextOverlay>,
}

impl Compositor {
    pub fn new(width: u32, height: u32, mut video: Vec<VideoLayer>, text: Vec<TextOverlay>) -> Self {
        sort_by_track_index(&mut video, |layer| layer.track_index);
        Self {
            canvas: RgbaImage::from_pixel(width, height, BLACK),
            video,
            text,
        }
    }

    pub fn video_layers(&self) -> &[VideoLayer] {
        &self.video
    }

    pub fn text_overlays(&self) -> &[TextOverlay] {
        &self.text
    }

    /// Composite the frame at `time_secs` and return it.
    pub fn render_frame(&mut self, time_secs: f64) -> ShortsmithResult<&RgbaImage> {
        for px in self.canvas.pixels_mut() {
            *px = BLACK;
        }

        for layer in &mut self.video {
            let Some(local) = layer.placement.local_time(time_secs) else {
                continue;
            };
            match layer.frame(local)? {
                Some(LayerFrame::Image(frame)) => draw_image(&mut self.canvas, frame, 0, 0, 1.0),
                Some(LayerFrame::Solid(color)) => {
                    for px in self.canvas.pixels_mut() {
                        blend_over(px, color, 1.0);
                    }
                }
                None => {}
            }
        }

        for overlay in &self.text {
            if let Some(local) = overlay.placement.local_time(time_secs) {
                draw_text_overlay(&mut self.canvas, overlay, local);
            }
        }

        Ok(&self.canvas)
    }

    /// Stop any running decoders.
    pub fn finish(&mut self) {
        for layer in &mut self.video {
            layer.finish();
        }
    }
}
