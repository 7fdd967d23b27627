//! Rasterizing a laid-out text block into a tight RGBA bitmap.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rusttype::point;
use shortsmith_common::{ShortsmithError, ShortsmithResult};
use shortsmith_processing_core::text_layout::{PADDING, SAFE_WIDTH};
use shortsmith_processing_core::{layout_text, GlyphMetrics, TextLayout};
use shortsmith_timeline_model::Rgba8;

use super::bitmap_font::BitmapFont;
use super::fonts::{metrics_for, LoadedFont, TrueTypeMetrics};
use crate::compositor::blend_over;

/// Largest overlay edge accepted from the rasterizer.
pub const MAX_OVERLAY_EDGE: u32 = 8192;

/// Colors of one text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPaint {
    pub fill: Rgba8,
    /// Stroke color and width in pixels.
    pub stroke: Option<(Rgba8, u32)>,
    pub background: Option<Rgba8>,
}

impl TextPaint {
    pub fn stroke_width(&self) -> u32 {
        self.stroke.map_or(0, |(_, w)| w)
    }
}

/// Lay out `text` with `font` and produce its glyph coverage mask.
pub fn rasterize_coverage(
    font: &LoadedFont,
    text: &str,
    font_size: f64,
    stroke_width: u32,
) -> ShortsmithResult<(TextLayout, GrayImage)> {
    if !(font_size.is_finite() && font_size > 0.0) {
        return Err(ShortsmithError::text_render(format!("Invalid font size {font_size}")));
    }

    let metrics = metrics_for(font, font_size);
    let layout = layout_text(metrics.as_ref(), text, stroke_width);
    if layout.is_empty() {
        return Err(ShortsmithError::text_render("Nothing to draw"));
    }
    if layout.width > MAX_OVERLAY_EDGE || layout.height > MAX_OVERLAY_EDGE {
        return Err(ShortsmithError::text_render(format!(
            "Text block {}x{} exceeds {MAX_OVERLAY_EDGE}px",
            layout.width, layout.height
        )));
    }
    if layout.overflows(stroke_width) {
        return Err(ShortsmithError::text_render(format!(
            "A glyph at {font_size}px is wider than the {SAFE_WIDTH}px line"
        )));
    }

    let mut mask = GrayImage::new(layout.width, layout.height);
    let (w, h) = (layout.width as i64, layout.height as i64);
    let mut plot = |x: i64, y: i64, v: u8| {
        if x >= 0 && y >= 0 && x < w && y < h {
            let px = mask.get_pixel_mut(x as u32, y as u32);
            px.0[0] = px.0[0].max(v);
        }
    };

    match font {
        LoadedFont::TrueType(face) => {
            let tt = TrueTypeMetrics::new(face, font_size as f32);
            let ascent = tt.ascent();
            for line in &layout.lines {
                let origin = point(line.x, line.y + ascent);
                for glyph in face.layout(&line.text, tt.scale, origin) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, v| {
                        let coverage = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                        plot(bb.min.x as i64 + gx as i64, bb.min.y as i64 + gy as i64, coverage);
                    });
                }
            }
        }
        LoadedFont::Bitmap => {
            let bitmap = BitmapFont::for_size(font_size);
            let advance = bitmap.advance(' ') as i64;
            for line in &layout.lines {
                let mut x = line.x.round() as i64;
                let y = line.y.round() as i64;
                for ch in line.text.chars() {
                    bitmap.draw_glyph(ch, x, y, |px, py| plot(px, py, 255));
                    x += advance;
                }
            }
        }
    }

    Ok((layout, mask))
}

/// Grow coverage by `radius` pixels with a round brush.
///
/// Runs on a Euclidean distance transform of the half-covered pixels, so
/// the cost does not depend on `radius`. The outer pixel ring is
/// antialiased.
pub fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }

    let solid = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([if mask.get_pixel(x, y).0[0] >= 128 { 255 } else { 0 }])
    });
    let distances = euclidean_squared_distance_transform(&solid);

    let reach = radius as f64 + 1.0;
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let distance = distances.get_pixel(x, y).0[0].sqrt();
        let grown = ((reach - distance).clamp(0.0, 1.0) * 255.0).round() as u8;
        Luma([grown.max(mask.get_pixel(x, y).0[0])])
    })
}

/// Paint background, stroke, and fill (bottom to top) from a coverage mask.
pub fn paint(mask: &GrayImage, paint: &TextPaint) -> RgbaImage {
    let (w, h) = mask.dimensions();
    let mut image = RgbaImage::new(w, h);

    if let Some(bg) = paint.background {
        draw_filled_rect_mut(&mut image, Rect::at(0, 0).of_size(w.max(1), h.max(1)), Rgba(bg));
    }

    if let Some((color, width)) = paint.stroke {
        if width > 0 {
            let grown = dilate(mask, width);
            apply_coverage(&mut image, &grown, color);
        }
    }

    apply_coverage(&mut image, mask, paint.fill);
    image
}

fn apply_coverage(image: &mut RgbaImage, coverage: &GrayImage, color: Rgba8) {
    for (dst, cov) in image.pixels_mut().zip(coverage.pixels()) {
        let c = cov.0[0];
        if c == 0 {
            continue;
        }
        blend_over(dst, color, c as f32 / 255.0);
    }
}

/// Solid block standing in for text that could not be drawn at all.
pub fn placeholder_block(text: &str, font_size: f64, color: Rgba8) -> RgbaImage {
    let size = if font_size.is_finite() && font_size > 0.0 {
        font_size.min(400.0)
    } else {
        60.0
    };
    let chars = text.chars().count().max(1) as f64;
    let pad = 2.0 * PADDING as f64;
    let width = (chars * size * 0.6).min(SAFE_WIDTH as f64) + pad;
    let height = size * 1.2 + pad;
    RgbaImage::from_pixel(width.ceil() as u32, height.ceil() as u32, Rgba(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_coverage_matches_layout() {
        let (layout, mask) = rasterize_coverage(&LoadedFont::Bitmap, "HI", 16.0, 0).unwrap();
        assert_eq!(mask.dimensions(), (layout.width, layout.height));
        assert!(mask.pixels().any(|p| p.0[0] == 255));
        // Padding stays clear.
        for x in 0..layout.width {
            assert_eq!(mask.get_pixel(x, 0).0[0], 0);
        }
    }

    #[test]
    fn test_blank_text_is_an_error() {
        let err = rasterize_coverage(&LoadedFont::Bitmap, "  ", 40.0, 0).unwrap_err();
        assert_eq!(err.kind(), "text_render");
    }

    #[test]
    fn test_oversized_block_is_an_error() {
        let text = "W ".repeat(400);
        assert!(rasterize_coverage(&LoadedFont::Bitmap, &text, 200.0, 0).is_err());
    }

    #[test]
    fn test_glyph_wider_than_line_is_an_error() {
        // Bitmap cells are 6 units wide, so one glyph at this size is 1050px.
        let err = rasterize_coverage(&LoadedFont::Bitmap, "M", 1400.0, 0).unwrap_err();
        assert_eq!(err.kind(), "text_render");
        assert!(rasterize_coverage(&LoadedFont::Bitmap, "M", 400.0, 0).is_ok());
    }

    #[test]
    fn test_wide_stroke_dilation_is_fast() {
        let (_, mask) = rasterize_coverage(&LoadedFont::Bitmap, "HELLO WORLD", 60.0, 160).unwrap();
        let started = std::time::Instant::now();
        let grown = dilate(&mask, 160);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        let solid = |img: &GrayImage| img.pixels().filter(|p| p.0[0] == 255).count();
        assert!(solid(&grown) > solid(&mask));
        assert_eq!(grown.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_dilate_grows_a_single_pixel() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, Luma([255]));
        let grown = dilate(&mask, 2);
        assert_eq!(grown.get_pixel(4, 2).0[0], 255);
        assert_eq!(grown.get_pixel(6, 4).0[0], 255);
        assert_eq!(grown.get_pixel(0, 0).0[0], 0);
        assert_eq!(dilate(&mask, 0), mask);
    }

    #[test]
    fn test_paint_layers_stroke_under_fill() {
        let mut mask = GrayImage::new(7, 7);
        mask.put_pixel(3, 3, Luma([255]));
        let img = paint(
            &mask,
            &TextPaint {
                fill: [255, 255, 255, 255],
                stroke: Some(([0, 0, 0, 255], 1)),
                background: None,
            },
        );
        assert_eq!(img.get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(3, 2).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_background_fills_whole_bitmap() {
        let mask = GrayImage::new(4, 3);
        let img = paint(
            &mask,
            &TextPaint {
                fill: [255, 255, 255, 255],
                stroke: None,
                background: Some([255, 0, 0, 255]),
            },
        );
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_placeholder_block_is_single_color() {
        let img = placeholder_block("HELLO", 60.0, [200, 10, 10, 255]);
        assert!(img.width() > 0 && img.height() > 0);
        assert!(img.pixels().all(|p| p.0 == [200, 10, 10, 255]));
    }
}
