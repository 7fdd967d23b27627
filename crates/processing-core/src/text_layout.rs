//! Greedy word wrap and line placement for text overlays.
//!
//! Layout works against any [`GlyphMetrics`] so the same code drives
//! TrueType fonts and the built-in bitmap font.

/// Horizontal budget a wrapped line (plus stroke on both sides) must fit in.
pub const SAFE_WIDTH: f32 = 980.0;
/// Margin around the text block on every side.
pub const PADDING: u32 = 20;
/// Gap between consecutive lines.
pub const LINE_SPACING: u32 = 10;

/// Font measurements needed for layout.
pub trait GlyphMetrics {
    /// Horizontal advance of a single character.
    fn advance(&self, ch: char) -> f32;

    /// Height of one line box (ascent + descent).
    fn line_height(&self) -> f32;

    /// Pair kerning adjustment, added between `left` and `right`.
    fn kerning(&self, _left: char, _right: char) -> f32 {
        0.0
    }
}

/// Advance width of `text` on a single line.
pub fn text_width(metrics: &dyn GlyphMetrics, text: &str) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        if let Some(p) = prev {
            width += metrics.kerning(p, ch);
        }
        width += metrics.advance(ch);
        prev = Some(ch);
    }
    width
}

/// Greedy word wrap. Explicit newlines always break; a word wider than
/// `max_width` on its own is split between characters.
pub fn wrap_text(metrics: &dyn GlyphMetrics, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                place_word(metrics, word, max_width, &mut current, &mut lines);
                continue;
            }

            let candidate = format!("{current} {word}");
            if text_width(metrics, &candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                place_word(metrics, word, max_width, &mut current, &mut lines);
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Start a new line with `word`, spilling full-width chunks into `lines`
/// when the word alone does not fit.
///
/// A single character wider than `max_width` still gets a line of its own;
/// callers check [`TextLayout::overflows`] for that case.
fn place_word(
    metrics: &dyn GlyphMetrics,
    word: &str,
    max_width: f32,
    current: &mut String,
    lines: &mut Vec<String>,
) {
    if text_width(metrics, word) <= max_width {
        current.push_str(word);
        return;
    }

    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && text_width(metrics, current) > max_width {
            current.pop();
            lines.push(std::mem::take(current));
            current.push(ch);
        }
    }
}

/// One positioned line inside the overlay bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub text: String,
    pub width: f32,
    /// Left edge of the glyph run, bitmap coordinates.
    pub x: f32,
    /// Top of the line box, bitmap coordinates.
    pub y: f32,
}

/// Complete text block: lines plus the tight bitmap size around them.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LineLayout>,
    pub line_height: f32,
    pub width: u32,
    pub height: u32,
}

impl TextLayout {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when some line is wider than the budget for `stroke_width`,
    /// which only happens for a single glyph too wide to wrap.
    pub fn overflows(&self, stroke_width: u32) -> bool {
        let budget = line_budget(stroke_width);
        self.lines.iter().any(|line| line.width > budget + 0.5)
    }
}

/// Widest glyph run a line may hold once the stroke is drawn on both sides.
pub fn line_budget(stroke_width: u32) -> f32 {
    (SAFE_WIDTH - 2.0 * stroke_width as f32).max(1.0)
}

/// Wrap and position `text`. Lines are centered horizontally; the bitmap
/// is the text's bounding box grown by padding and stroke on every side.
pub fn layout_text(metrics: &dyn GlyphMetrics, text: &str, stroke_width: u32) -> TextLayout {
    let max_width = line_budget(stroke_width);
    let wrapped = wrap_text(metrics, text, max_width);
    let line_height = metrics.line_height().max(1.0);
    let margin = (PADDING + stroke_width) as f32;

    let widths: Vec<f32> = wrapped.iter().map(|l| text_width(metrics, l)).collect();
    let block_width = widths.iter().copied().fold(0.0, f32::max);
    let count = wrapped.len() as f32;
    let block_height = if wrapped.is_empty() {
        0.0
    } else {
        count * line_height + (count - 1.0) * LINE_SPACING as f32
    };

    let width = (block_width + 2.0 * margin).ceil() as u32;
    let height = (block_height + 2.0 * margin).ceil() as u32;

    let lines = wrapped
        .into_iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (text, line_width))| LineLayout {
            x: ((width as f32 - line_width) / 2.0).max(0.0),
            y: margin + i as f32 * (line_height + LINE_SPACING as f32),
            width: line_width,
            text,
        })
        .collect();

    TextLayout {
        lines,
        line_height,
        width,
        height,
    }
}
