//! One text track to one positioned, animated overlay bitmap.

use image::RgbaImage;
use shortsmith_common::ShortsmithResult;
use shortsmith_processing_core::{layer_seed, still_duration, Placement};
use shortsmith_timeline_model::{parse_color, parse_color_or, Animation, Position, TextTrack};

use super::fonts::{FontRequest, FontResolver, FontSource, ResolvedFont};
use super::raster::{paint, placeholder_block, rasterize_coverage, TextPaint};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// How an overlay ended up being drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTier {
    Font(FontSource),
    Placeholder,
}

/// A ready-to-composite text layer.
#[derive(Debug, Clone)]
pub struct TextOverlay {
    /// Declaration index among text tracks.
    pub index: usize,
    pub image: RgbaImage,
    pub position: Position,
    pub placement: Placement,
    pub animation: Animation,
    pub seed: u64,
    pub tier: RenderTier,
}

/// Resolve colors for a track's style.
pub fn text_paint(track: &TextTrack) -> TextPaint {
    let style = &track.style;
    let stroke_width = style.effective_stroke_width().round() as u32;
    let stroke = style
        .stroke
        .as_deref()
        .filter(|_| stroke_width > 0)
        .map(|c| (parse_color(c).unwrap_or(BLACK), stroke_width));

    TextPaint {
        fill: parse_color_or(Some(&style.color), WHITE),
        stroke,
        background: style.background_color.as_deref().and_then(parse_color),
    }
}

/// Render a text track. Returns `None` for tracks with nothing to show.
///
/// Tries every font in the resolver's chain, then falls back to a flat
/// placeholder block, so a visible layer is always produced.
pub fn render_text_track(
    index: usize,
    track: &TextTrack,
    fonts: &FontResolver,
) -> Option<TextOverlay> {
    let text = track.style.text_transform.apply(&track.text);
    if text.trim().is_empty() {
        return None;
    }

    let style = &track.style;
    let text_paint = text_paint(track);
    let request = FontRequest {
        family: style.font_family.clone(),
        weight: style.font_weight,
    };

    let mut rendered = None;
    for font in fonts.resolve_chain(&request) {
        match draw_with(&font, &text, style.font_size, &text_paint) {
            Ok(image) => {
                rendered = Some((image, RenderTier::Font(font.source)));
                break;
            }
            Err(err) => tracing::warn!(
                track = index,
                source = font.source.label(),
                error = %err,
                "Text tier failed, degrading"
            ),
        }
    }

    let (image, tier) = rendered.unwrap_or_else(|| {
        tracing::warn!(track = index, "All font tiers failed, drawing placeholder block");
        (
            placeholder_block(&text, style.font_size, text_paint.fill),
            RenderTier::Placeholder,
        )
    });

    tracing::debug!(
        track = index,
        width = image.width(),
        height = image.height(),
        tier = ?tier,
        "Text overlay rendered"
    );

    Some(TextOverlay {
        index,
        image,
        position: style.position,
        placement: Placement::new(track.start, still_duration(track.duration)),
        animation: style.animation,
        seed: layer_seed(&text, index),
        tier,
    })
}

fn draw_with(
    font: &ResolvedFont,
    text: &str,
    font_size: f64,
    text_paint: &TextPaint,
) -> ShortsmithResult<RgbaImage> {
    let (_, mask) = rasterize_coverage(&font.font, text, font_size, text_paint.stroke_width())?;
    Ok(paint(&mask, text_paint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortsmith_common::FontConfig;
    use shortsmith_processing_core::text_layout::{PADDING, SAFE_WIDTH};
    use shortsmith_timeline_model::{TextTransform, MAX_STROKE_WIDTH};
    use std::path::PathBuf;

    fn bitmap_only() -> FontResolver {
        FontResolver::new(&FontConfig {
            fonts_dir: PathBuf::from("/nonexistent/fonts"),
            system_fallbacks: Vec::new(),
        })
    }

    #[test]
    fn test_hello_world_pop_overlay() {
        let mut track = TextTrack::new("HELLO WORLD", 0.0, 2.0);
        track.style.font_size = 60.0;
        track.style.animation = Animation::Pop;

        let overlay = render_text_track(0, &track, &bitmap_only()).unwrap();
        assert_eq!(overlay.animation, Animation::Pop);
        assert_eq!(overlay.position, Position { x: 0.5, y: 0.8 });
        assert_eq!(overlay.placement, Placement::new(0.0, 2.0));
        assert_eq!(overlay.tier, RenderTier::Font(FontSource::Bitmap));
        // Tight bitmap, not the full canvas.
        assert!(overlay.image.width() <= SAFE_WIDTH as u32 + 2 * PADDING);
        assert!(overlay.image.height() < 1920);
    }

    #[test]
    fn test_uppercase_transform_changes_seed_input() {
        let mut track = TextTrack::new("hello", 1.0, 0.0);
        track.style.text_transform = TextTransform::Uppercase;
        let overlay = render_text_track(3, &track, &bitmap_only()).unwrap();
        assert_eq!(overlay.seed, layer_seed("HELLO", 3));
        assert_eq!(overlay.placement, Placement::new(1.0, 5.0));
    }

    #[test]
    fn test_blank_text_produces_no_overlay() {
        let track = TextTrack::new("   ", 0.0, 1.0);
        assert!(render_text_track(0, &track, &bitmap_only()).is_none());
    }

    #[test]
    fn test_unrenderable_text_degrades_to_placeholder() {
        let mut track = TextTrack::new("SO BIG", 0.0, 1.0);
        track.style.font_size = 20000.0;
        let overlay = render_text_track(0, &track, &bitmap_only()).unwrap();
        assert_eq!(overlay.tier, RenderTier::Placeholder);
        let first = overlay.image.get_pixel(0, 0).0;
        assert!(overlay.image.pixels().all(|p| p.0 == first));
    }

    #[test]
    fn test_paint_resolves_style_colors() {
        let mut track = TextTrack::new("x", 0.0, 1.0);
        track.style.color = "yellow".into();
        track.style.stroke = Some("#000".into());
        track.style.stroke_width = 4.0;
        track.style.background_color = Some("rgba(0,0,0,0.5)".into());
        let p = text_paint(&track);
        assert_eq!(p.fill, [255, 255, 0, 255]);
        assert_eq!(p.stroke, Some(([0, 0, 0, 255], 4)));
        assert_eq!(p.background.map(|c| c[3]), Some(128));
    }

    #[test]
    fn test_huge_stroke_is_clamped_and_renders() {
        let mut track = TextTrack::new("HELLO WORLD", 0.0, 1.0);
        track.style.font_size = 60.0;
        track.style.stroke = Some("#000".into());
        track.style.stroke_width = 160.0;
        assert_eq!(text_paint(&track).stroke_width(), MAX_STROKE_WIDTH as u32);

        let overlay = render_text_track(0, &track, &bitmap_only()).unwrap();
        assert_eq!(overlay.tier, RenderTier::Font(FontSource::Bitmap));
        assert!(overlay.image.width() <= SAFE_WIDTH as u32 + 2 * PADDING);
    }

    #[test]
    fn test_single_overwide_glyph_degrades_to_placeholder() {
        let mut track = TextTrack::new("M", 0.0, 1.0);
        track.style.font_size = 1400.0;
        let overlay = render_text_track(0, &track, &bitmap_only()).unwrap();
        assert_eq!(overlay.tier, RenderTier::Placeholder);
        assert!(overlay.image.width() <= SAFE_WIDTH as u32 + 2 * PADDING);
    }
}
