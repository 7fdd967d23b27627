//! Font resolution.
//!
//! Resolution walks a fixed list of rules top to bottom: the packaged file
//! for the requested family, then the configured system bold sans fonts,
//! then the built-in bitmap font, which always loads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusttype::{Font, Scale};
use shortsmith_common::{FontConfig, ShortsmithError, ShortsmithResult};
use shortsmith_processing_core::GlyphMetrics;

use super::bitmap_font::BitmapFont;

/// Weight at which Montserrat switches to its Black cut.
pub const BLACK_WEIGHT_THRESHOLD: u16 = 800;

/// Family (lowercase) to packaged file name.
const PACKAGED_FONTS: &[(&str, &str)] = &[
    ("anton", "Anton-Regular.ttf"),
    ("bebas neue", "BebasNeue-Regular.ttf"),
    ("montserrat", "Montserrat-Bold.ttf"),
    ("poppins", "Poppins-Bold.ttf"),
    ("lato", "Lato-Bold.ttf"),
    ("oswald", "Oswald-Bold.ttf"),
    ("raleway", "Raleway-Bold.ttf"),
];

const MONTSERRAT_BLACK: &str = "Montserrat-Black.ttf";

/// Lowercase names of the packaged families.
pub fn packaged_families() -> impl Iterator<Item = &'static str> {
    PACKAGED_FONTS.iter().map(|(name, _)| *name)
}

/// Packaged file for `family` at `weight`, if the family is packaged.
pub fn packaged_file(family: &str, weight: u16) -> Option<&'static str> {
    let key = family.trim().to_ascii_lowercase();
    if key == "montserrat" && weight >= BLACK_WEIGHT_THRESHOLD {
        return Some(MONTSERRAT_BLACK);
    }
    PACKAGED_FONTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, file)| *file)
}

/// What a text track asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRequest {
    pub family: String,
    pub weight: u16,
}

/// Which rule produced a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Packaged(PathBuf),
    System(PathBuf),
    Bitmap,
}

impl FontSource {
    pub fn label(&self) -> &'static str {
        match self {
            FontSource::Packaged(_) => "packaged",
            FontSource::System(_) => "system",
            FontSource::Bitmap => "bitmap",
        }
    }
}

/// A usable font face.
#[derive(Clone)]
pub enum LoadedFont {
    TrueType(Font<'static>),
    Bitmap,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadedFont::TrueType(_) => f.write_str("TrueType"),
            LoadedFont::Bitmap => f.write_str("Bitmap"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub source: FontSource,
    pub font: LoadedFont,
}

/// rusttype face measured at a pixel size.
pub struct TrueTypeMetrics<'a> {
    pub font: &'a Font<'static>,
    pub scale: Scale,
}

impl<'a> TrueTypeMetrics<'a> {
    pub fn new(font: &'a Font<'static>, px: f32) -> Self {
        Self {
            font,
            scale: Scale::uniform(px),
        }
    }

    pub fn ascent(&self) -> f32 {
        self.font.v_metrics(self.scale).ascent
    }
}

impl GlyphMetrics for TrueTypeMetrics<'_> {
    fn advance(&self, ch: char) -> f32 {
        self.font.glyph(ch).scaled(self.scale).h_metrics().advance_width
    }

    fn line_height(&self) -> f32 {
        let v = self.font.v_metrics(self.scale);
        v.ascent - v.descent
    }

    fn kerning(&self, left: char, right: char) -> f32 {
        self.font.pair_kerning(self.scale, left, right)
    }
}

type Applies = fn(&FontResolver, &FontRequest) -> bool;
type Loader = fn(&FontResolver, &FontRequest) -> ShortsmithResult<ResolvedFont>;

struct FontRule {
    name: &'static str,
    applies: Applies,
    load: Loader,
}

const FONT_RULES: &[FontRule] = &[
    FontRule {
        name: "packaged",
        applies: is_packaged,
        load: load_packaged,
    },
    FontRule {
        name: "system",
        applies: has_system_fallbacks,
        load: load_system,
    },
    FontRule {
        name: "bitmap",
        applies: always,
        load: load_bitmap,
    },
];

fn is_packaged(_: &FontResolver, req: &FontRequest) -> bool {
    packaged_file(&req.family, req.weight).is_some()
}

fn has_system_fallbacks(resolver: &FontResolver, _: &FontRequest) -> bool {
    !resolver.system_fallbacks.is_empty()
}

fn always(_: &FontResolver, _: &FontRequest) -> bool {
    true
}

fn load_packaged(resolver: &FontResolver, req: &FontRequest) -> ShortsmithResult<ResolvedFont> {
    let path = resolver
        .packaged_path(req)
        .ok_or_else(|| ShortsmithError::text_render(format!("No packaged font for {}", req.family)))?;
    let font = resolver.load_file(&path)?;
    Ok(ResolvedFont {
        source: FontSource::Packaged(path),
        font: LoadedFont::TrueType(font),
    })
}

fn load_system(resolver: &FontResolver, _: &FontRequest) -> ShortsmithResult<ResolvedFont> {
    let mut last_err = None;
    for path in &resolver.system_fallbacks {
        match resolver.load_file(path) {
            Ok(font) => {
                return Ok(ResolvedFont {
                    source: FontSource::System(path.clone()),
                    font: LoadedFont::TrueType(font),
                })
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| ShortsmithError::text_render("No system fonts configured")))
}

fn load_bitmap(_: &FontResolver, _: &FontRequest) -> ShortsmithResult<ResolvedFont> {
    Ok(ResolvedFont {
        source: FontSource::Bitmap,
        font: LoadedFont::Bitmap,
    })
}

/// Loads and caches fonts for one render.
pub struct FontResolver {
    fonts_dir: PathBuf,
    system_fallbacks: Vec<PathBuf>,
    cache: Mutex<HashMap<PathBuf, Option<Font<'static>>>>,
}

impl FontResolver {
    pub fn new(config: &FontConfig) -> Self {
        Self {
            fonts_dir: config.fonts_dir.clone(),
            system_fallbacks: config.system_fallbacks.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Where the packaged file for `req` would live.
    pub fn packaged_path(&self, req: &FontRequest) -> Option<PathBuf> {
        packaged_file(&req.family, req.weight).map(|file| self.fonts_dir.join(file))
    }

    /// Every font that loads for `req`, in priority order.
    ///
    /// The list is never empty: the bitmap font closes it.
    pub fn resolve_chain(&self, req: &FontRequest) -> Vec<ResolvedFont> {
        let mut chain = Vec::new();
        for rule in FONT_RULES {
            if !(rule.applies)(self, req) {
                continue;
            }
            match (rule.load)(self, req) {
                Ok(font) => chain.push(font),
                Err(err) => tracing::warn!(
                    rule = rule.name,
                    family = %req.family,
                    weight = req.weight,
                    error = %err,
                    "Font rule failed, trying next"
                ),
            }
        }
        chain
    }

    /// The highest-priority font for `req`.
    pub fn resolve(&self, req: &FontRequest) -> ResolvedFont {
        self.resolve_chain(req)
            .into_iter()
            .next()
            .unwrap_or(ResolvedFont {
                source: FontSource::Bitmap,
                font: LoadedFont::Bitmap,
            })
    }

    fn load_file(&self, path: &Path) -> ShortsmithResult<Font<'static>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ShortsmithError::text_render("Font cache poisoned"))?;

        let entry = cache.entry(path.to_path_buf()).or_insert_with(|| {
            let bytes = std::fs::read(path).ok()?;
            Font::try_from_vec(bytes)
        });

        entry.clone().ok_or_else(|| {
            ShortsmithError::text_render(format!("Font unavailable: {}", path.display()))
        })
    }
}

/// Metrics for a loaded font at `font_size` pixels.
pub fn metrics_for(font: &LoadedFont, font_size: f64) -> Box<dyn GlyphMetrics + '_> {
    match font {
        LoadedFont::TrueType(face) => Box::new(TrueTypeMetrics::new(face, font_size as f32)),
        LoadedFont::Bitmap => Box::new(BitmapFont::for_size(font_size)),
    }
}
