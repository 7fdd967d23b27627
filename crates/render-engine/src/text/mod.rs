//! Text overlay rendering: font resolution, rasterization, and the
//! degrade chain that keeps a caption visible whatever goes wrong.

pub mod bitmap_font;
pub mod fonts;
pub mod overlay;
pub mod raster;

pub use fonts::{packaged_families, packaged_file, FontRequest, FontResolver, FontSource, LoadedFont, ResolvedFont};
pub use overlay::{render_text_track, RenderTier, TextOverlay};
pub use raster::TextPaint;
